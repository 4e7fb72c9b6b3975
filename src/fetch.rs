// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Fetch text/JSON from a URL or local path, retrying transient failures with randomized backoff
// role: fetch/http
// inputs: URL or local path; Transport (HTTP seam); Sleeper; BackoffPolicy
// outputs: Some(body) on success; None on permanent failure; decode errors as FetchError
// side_effects: Network GETs with user-agent "autophone"; local file reads; sleeps between retries
// invariants:
// - URLs without a scheme, or with a file scheme, are read from disk once with no retry
// - HTTP 503 and connection failures retry until the policy allows no further attempt
// - Any other non-2xx status or unexpected failure yields None without retry
// - Empty bodies yield None; malformed JSON on a non-empty body is an error
// errors: FetchError::Decode only; transport failures are logged and swallowed
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::retry::{BackoffPolicy, Sleeper, ThreadSleeper};

pub const USER_AGENT: &str = "autophone";

const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

/// Longest payload prefix written to the debug log.
const DEBUG_PAYLOAD_CHARS: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
  pub status: u16,
  pub reason: String,
  pub body: String,
}

impl HttpResponse {
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
  /// The server could not be reached; worth retrying.
  Connection(String),
  Other(String),
}

// --- Trait seam for HTTP ---
pub trait Transport {
  fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;
}

pub struct UreqTransport {
  agent: ureq::Agent,
}

impl UreqTransport {
  pub fn new() -> Self {
    let agent: ureq::Agent = ureq::Agent::config_builder()
      .http_status_as_error(false)
      .build()
      .into();

    Self { agent }
  }
}

impl Default for UreqTransport {
  fn default() -> Self {
    Self::new()
  }
}

impl Transport for UreqTransport {
  fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
    let resp = self.agent.get(url).header("User-Agent", USER_AGENT).call();

    match resp {
      Ok(mut r) => {
        let status = r.status();
        let reason = status.canonical_reason().unwrap_or("").to_string();

        let body = if status.is_success() {
          r.body_mut()
            .with_config()
            .limit(MAX_BODY_BYTES)
            .read_to_string()
            .map_err(|e| TransportError::Other(e.to_string()))?
        } else {
          String::new()
        };

        Ok(HttpResponse {
          status: status.as_u16(),
          reason,
          body,
        })
      }
      Err(e) if is_connection_error(&e) => Err(TransportError::Connection(e.to_string())),
      Err(e) => Err(TransportError::Other(e.to_string())),
    }
  }
}

fn is_connection_error(e: &ureq::Error) -> bool {
  matches!(
    e,
    ureq::Error::ConnectionFailed | ureq::Error::HostNotFound | ureq::Error::Io(_) | ureq::Error::Timeout(_)
  )
}

/// Where a URL's content comes from.
#[derive(Debug, PartialEq, Eq)]
enum Source {
  Local(PathBuf),
  Remote,
}

fn classify(url: &str) -> Source {
  match url::Url::parse(url) {
    Ok(parsed) if parsed.scheme().starts_with("file") => {
      let path = parsed
        .to_file_path()
        .unwrap_or_else(|_| PathBuf::from(parsed.path()));
      Source::Local(path)
    }
    Ok(_) => Source::Remote,
    Err(url::ParseError::RelativeUrlWithoutBase) => {
      let path = url.split(|c: char| c == '?' || c == '#').next().unwrap_or(url);
      Source::Local(PathBuf::from(path))
    }
    // Let the transport report anything else as a permanent failure.
    Err(_) => Source::Remote,
  }
}

pub struct Fetcher {
  transport: Box<dyn Transport>,
  sleeper: Box<dyn Sleeper>,
  policy: BackoffPolicy,
}

impl Fetcher {
  pub fn new(transport: Box<dyn Transport>, sleeper: Box<dyn Sleeper>, policy: BackoffPolicy) -> Self {
    Self {
      transport,
      sleeper,
      policy,
    }
  }

  /// HTTP over ureq, real sleeps.
  pub fn http(policy: BackoffPolicy) -> Self {
    Self::new(Box::new(UreqTransport::new()), Box::new(ThreadSleeper), policy)
  }

  pub fn fetch_text(&self, url: &str) -> Option<String> {
    if let Source::Local(path) = classify(url) {
      return match std::fs::read_to_string(&path) {
        Ok(s) => Some(s),
        Err(e) => {
          warn!(url = %url, path = %path.display(), error = %e, "Unable to open local file");
          None
        }
      };
    }

    let mut attempts: u32 = 0;

    loop {
      attempts += 1;

      match self.transport.get(url) {
        Ok(resp) if resp.is_success() => return Some(resp.body),
        Ok(resp) if resp.status == 503 => {
          warn!(url = %url, attempt = attempts, "HTTP 503 Server Too Busy");
        }
        Ok(resp) => {
          warn!(url = %url, status = resp.status, reason = %resp.reason, "Unable to open url");
          return None;
        }
        Err(TransportError::Connection(msg)) => {
          warn!(url = %url, attempt = attempts, error = %msg, "Connection error, will retry");
        }
        Err(TransportError::Other(msg)) => {
          warn!(url = %url, error = %msg, "Unable to open url");
          return None;
        }
      }

      if !self.policy.should_retry(attempts) {
        warn!(url = %url, attempts, "Giving up after repeated transient failures");
        return None;
      }

      let delay = self.policy.delay(&mut rand::thread_rng());
      self.sleeper.sleep(delay);
    }
  }

  /// Fetch and decode into `T`. An absent or empty body is `Ok(None)`.
  pub fn fetch_as<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>, FetchError> {
    let Some(text) = self.fetch_text(url) else {
      return Ok(None);
    };
    if text.is_empty() {
      return Ok(None);
    }

    let value = serde_json::from_str::<T>(&text).map_err(|source| FetchError::Decode {
      url: url.to_string(),
      source,
    })?;
    debug!(url = %url, bytes = text.len(), payload = %payload_preview(&text), "fetched json");

    Ok(Some(value))
  }

  pub fn fetch_json(&self, url: &str) -> Result<Option<serde_json::Value>, FetchError> {
    self.fetch_as::<serde_json::Value>(url)
  }
}

/// Payload truncated to `DEBUG_PAYLOAD_CHARS` characters for logging.
fn payload_preview(text: &str) -> std::borrow::Cow<'_, str> {
  match text.char_indices().nth(DEBUG_PAYLOAD_CHARS) {
    Some((cut, _)) => format!("{}... ({} bytes total)", &text[..cut], text.len()).into(),
    None => text.into(),
  }
}

/// Canned responses keyed by URL, for tests.
#[cfg(test)]
pub mod testing {
  use super::*;
  use std::cell::RefCell;
  use std::collections::{HashMap, VecDeque};
  use std::rc::Rc;

  #[derive(Clone, Default)]
  pub struct FakeTransport {
    inner: Rc<FakeInner>,
  }

  #[derive(Default)]
  struct FakeInner {
    responses: RefCell<HashMap<String, VecDeque<Result<HttpResponse, TransportError>>>>,
    calls: RefCell<Vec<String>>,
  }

  impl FakeTransport {
    /// Queue a response; the last queued response for a URL repeats.
    pub fn push(&self, url: &str, resp: Result<HttpResponse, TransportError>) -> &Self {
      self
        .inner
        .responses
        .borrow_mut()
        .entry(url.to_string())
        .or_default()
        .push_back(resp);
      self
    }

    pub fn ok(&self, url: &str, body: &str) -> &Self {
      self.push(url, Ok(status(200, body)))
    }

    pub fn status(&self, url: &str, code: u16) -> &Self {
      self.push(url, Ok(status(code, "")))
    }

    pub fn calls(&self) -> Vec<String> {
      self.inner.calls.borrow().clone()
    }

    pub fn calls_to(&self, url: &str) -> usize {
      self.inner.calls.borrow().iter().filter(|u| u.as_str() == url).count()
    }
  }

  pub fn status(code: u16, body: &str) -> HttpResponse {
    HttpResponse {
      status: code,
      reason: format!("status {}", code),
      body: body.to_string(),
    }
  }

  impl Transport for FakeTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
      self.inner.calls.borrow_mut().push(url.to_string());
      let mut responses = self.inner.responses.borrow_mut();

      match responses.get_mut(url) {
        Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
        Some(queue) => queue.front().cloned().unwrap(),
        None => Ok(status(404, "")),
      }
    }
  }

  /// Shares a `RecordingSleeper` with the test that owns the fetcher.
  #[derive(Clone, Default)]
  pub struct SharedSleeper(pub Rc<crate::retry::RecordingSleeper>);

  impl Sleeper for SharedSleeper {
    fn sleep(&self, delay: std::time::Duration) {
      self.0.sleep(delay);
    }
  }

  pub fn fetcher(transport: &FakeTransport, sleeper: &SharedSleeper, policy: BackoffPolicy) -> Fetcher {
    Fetcher::new(Box::new(transport.clone()), Box::new(sleeper.clone()), policy)
  }
}
