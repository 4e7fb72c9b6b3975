use mockito::{Matcher, Mock, ServerGuard};

pub const BIN: &str = "treeherder-push-counts";

/// A local dashboard serving `/api/repository/` with `try` and `mozilla-central`,
/// each hosted under the same server.
#[allow(dead_code)]
pub struct Dashboard {
  pub server: ServerGuard,
  pub mocks: Vec<Mock>,
}

#[allow(dead_code)]
impl Dashboard {
  pub fn start() -> Self {
    let mut server = mockito::Server::new();
    let listing = serde_json::json!([
      {"id": 4, "name": "try", "url": format!("{}/try", server.url())},
      {"id": 1, "name": "mozilla-central", "url": format!("{}/mozilla-central", server.url())}
    ]);
    let m = server
      .mock("GET", "/api/repository/")
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(listing.to_string())
      .create();

    Self {
      server,
      mocks: vec![m],
    }
  }

  pub fn url(&self) -> String {
    self.server.url()
  }

  pub fn pushes(&mut self, repo: &str, start: &str, end: &str, status: usize, body: &str) {
    let m = self
      .server
      .mock("GET", format!("/{}/json-pushes", repo).as_str())
      .match_query(Matcher::AllOf(vec![
        Matcher::UrlEncoded("startdate".into(), start.into()),
        Matcher::UrlEncoded("enddate".into(), end.into()),
      ]))
      .with_status(status)
      .with_body(body)
      .create();
    self.mocks.push(m);
  }

  pub fn resultsets(&mut self, repo: &str, revision: &str, body: &str) {
    let m = self
      .server
      .mock("GET", format!("/api/project/{}/push/", repo).as_str())
      .match_query(Matcher::AllOf(vec![
        Matcher::UrlEncoded("full".into(), "true".into()),
        Matcher::UrlEncoded("count".into(), "10".into()),
        Matcher::UrlEncoded("revision".into(), revision.into()),
      ]))
      .with_status(200)
      .with_body(body)
      .create();
    self.mocks.push(m);
  }

  pub fn jobs(&mut self, repo: &str, resultset_id: i64, job_types: &[&str]) {
    let rows: Vec<serde_json::Value> = job_types
      .iter()
      .enumerate()
      .map(|(i, name)| serde_json::json!([i, name, "success"]))
      .collect();
    let body = serde_json::json!({
      "job_property_names": ["id", "job_type_name", "result"],
      "results": rows
    });

    let m = self
      .server
      .mock("GET", format!("/api/project/{}/jobs/", repo).as_str())
      .match_query(Matcher::AllOf(vec![
        Matcher::UrlEncoded("return_type".into(), "list".into()),
        Matcher::UrlEncoded("count".into(), "2000".into()),
        Matcher::UrlEncoded("result_set_id".into(), resultset_id.to_string()),
      ]))
      .with_status(200)
      .with_body(body.to_string())
      .create();
    self.mocks.push(m);
  }
}
