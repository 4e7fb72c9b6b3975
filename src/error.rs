//! Error types for fetching and decoding dashboard responses.

use thiserror::Error;

/// Fatal failures while turning a fetched body into a value.
///
/// Transient and permanent transport failures never surface here; the
/// fetcher reports those as an absent value.
#[derive(Debug, Error)]
pub enum FetchError {
  /// Body was not valid JSON, or did not have the expected shape (including
  /// push ids that are not integers).
  #[error("could not decode response from {url}: {source}")]
  Decode {
    url: String,
    #[source]
    source: serde_json::Error,
  },

  /// A job row could not be turned into a typed record.
  #[error("could not decode jobs from {url}: {source}")]
  Job {
    url: String,
    #[source]
    source: JobDecodeError,
  },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JobDecodeError {
  #[error("job row {row} has no job_type_name")]
  MissingTypeName { row: usize },

  #[error("job row {row} has a non-string job_type_name")]
  TypeNameNotString { row: usize },
}

#[derive(Debug, Error)]
pub enum DirectoryError {
  #[error("treeherder url is required")]
  EmptyBaseUrl,

  #[error("no repositories found at {url}")]
  NoRepositories { url: String },

  #[error(transparent)]
  Fetch(#[from] FetchError),
}
