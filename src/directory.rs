// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Load the dashboard's repository listing once and answer name → base URL lookups
// role: directory/repositories
// inputs: Fetcher; dashboard base URL
// outputs: RepositoryDirectory with sorted names and their URLs
// side_effects: One fetch of {base}/api/repository/ at construction
// invariants:
// - base_url never ends with '/'
// - at least one repository is known after a successful load
// errors: DirectoryError for empty base URL, nothing parsable, or malformed listing; never retried beyond the fetcher
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{DirectoryError, FetchError};
use crate::fetch::Fetcher;
use crate::model::Repository;

#[derive(Debug, Clone)]
pub struct RepositoryDirectory {
  base_url: String,
  repository_urls: BTreeMap<String, String>,
}

impl RepositoryDirectory {
  pub fn load(fetcher: &Fetcher, base_url: &str) -> Result<Self, DirectoryError> {
    if base_url.is_empty() {
      return Err(DirectoryError::EmptyBaseUrl);
    }

    let base_url = base_url.trim_end_matches('/').to_string();
    let listing_url = repository_api_url(&base_url);

    let value = fetcher.fetch_json(&listing_url)?;
    let value = match value {
      Some(v) if is_truthy(&v) => v,
      _ => return Err(DirectoryError::NoRepositories { url: listing_url }),
    };

    let repositories: Vec<Repository> = serde_json::from_value(value).map_err(|source| FetchError::Decode {
      url: listing_url.clone(),
      source,
    })?;
    debug!(url = %listing_url, count = repositories.len(), "loaded repositories");

    Ok(Self::from_repositories(base_url, repositories))
  }

  pub fn from_repositories(base_url: String, repositories: Vec<Repository>) -> Self {
    let repository_urls = repositories.into_iter().map(|r| (r.name, r.url)).collect();

    Self {
      base_url,
      repository_urls,
    }
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  pub fn url_for(&self, name: &str) -> Option<&str> {
    self.repository_urls.get(name).map(String::as_str)
  }

  /// `(name, url)` pairs sorted by name.
  pub fn list(&self) -> impl Iterator<Item = (&str, &str)> {
    self
      .repository_urls
      .iter()
      .map(|(name, url)| (name.as_str(), url.as_str()))
  }
}

pub fn repository_api_url(base_url: &str) -> String {
  format!("{}/api/repository/", base_url)
}

// An empty array or object carries no repositories.
fn is_truthy(v: &serde_json::Value) -> bool {
  match v {
    serde_json::Value::Null => false,
    serde_json::Value::Array(a) => !a.is_empty(),
    serde_json::Value::Object(o) => !o.is_empty(),
    _ => true,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::fetch::testing::{FakeTransport, SharedSleeper, fetcher};
  use crate::retry::BackoffPolicy;

  const LISTING: &str = "https://th.example/api/repository/";

  fn load(t: &FakeTransport, base: &str) -> Result<RepositoryDirectory, DirectoryError> {
    let f = fetcher(t, &SharedSleeper::default(), BackoffPolicy::default());
    RepositoryDirectory::load(&f, base)
  }

  #[test]
  fn loads_and_sorts_by_name() {
    let t = FakeTransport::default();
    t.ok(
      LISTING,
      r#"[{"name": "try", "url": "url1", "id": 4}, {"name": "mozilla-central", "url": "url2"}]"#,
    );

    let dir = load(&t, "https://th.example/").unwrap();
    assert_eq!(dir.base_url(), "https://th.example");
    assert_eq!(dir.list().collect::<Vec<_>>(), vec![("mozilla-central", "url2"), ("try", "url1")]);
    assert_eq!(dir.url_for("try"), Some("url1"));
    assert_eq!(dir.url_for("unknown"), None);
  }

  #[test]
  fn empty_base_url_fails_fast() {
    let t = FakeTransport::default();
    assert!(matches!(load(&t, ""), Err(DirectoryError::EmptyBaseUrl)));
    assert!(t.calls().is_empty());
  }

  #[test]
  fn unreachable_listing_is_a_configuration_error() {
    let t = FakeTransport::default();
    t.status(LISTING, 500);
    let err = load(&t, "https://th.example").unwrap_err();
    assert!(matches!(err, DirectoryError::NoRepositories { ref url } if url == LISTING));
  }

  #[test]
  fn empty_listing_is_a_configuration_error() {
    let t = FakeTransport::default();
    t.ok(LISTING, "[]");
    assert!(matches!(
      load(&t, "https://th.example"),
      Err(DirectoryError::NoRepositories { .. })
    ));
  }

  #[test]
  fn listing_with_wrong_shape_is_a_decode_error() {
    let t = FakeTransport::default();
    t.ok(LISTING, r#"[{"title": "try"}]"#);
    assert!(matches!(
      load(&t, "https://th.example"),
      Err(DirectoryError::Fetch(FetchError::Decode { .. }))
    ));
  }
}
