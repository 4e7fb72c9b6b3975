// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Typed shapes for the dashboard responses (repositories, pushes, resultsets, jobs)
// role: model/types
// outputs: Deserializable structs; Job records decoded from the compact name/value job listing
// invariants: Unknown fields are ignored; a Job always carries a job_type_name
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::JobDecodeError;

/// Entry of `{base}/api/repository/`.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Repository {
  pub name: String,
  pub url: String,
}

/// Value of one entry in a `json-pushes` object, which is keyed by push id.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Push {
  #[serde(default)]
  pub changesets: Vec<String>,
}

impl Push {
  /// The tip changeset of the push.
  pub fn last_changeset(&self) -> Option<&str> {
    self.changesets.last().map(String::as_str)
  }
}

/// Push listing with numeric ids, ascending.
pub type PushListing = BTreeMap<u64, Push>;

/// `{dashboard}/api/project/{repo}/push/` response.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ResultsetListing {
  #[serde(default)]
  pub results: Vec<ResultsetRef>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ResultsetRef {
  pub id: i64,
}

/// `{dashboard}/api/project/{repo}/jobs/?return_type=list` response: a list of
/// property names plus rows of values in the same order.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct JobListing {
  #[serde(default)]
  pub job_property_names: Vec<String>,
  #[serde(default)]
  pub results: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
  pub job_type_name: String,
}

const JOB_TYPE_NAME: &str = "job_type_name";

impl JobListing {
  /// Rebuild each row as a field map and keep the fields the counter reads.
  ///
  /// Names and values pair up positionally; a short row simply lacks the
  /// trailing fields.
  pub fn jobs(&self) -> Result<Vec<Job>, JobDecodeError> {
    let mut out = Vec::with_capacity(self.results.len());

    for (row, values) in self.results.iter().enumerate() {
      let fields: BTreeMap<&str, &serde_json::Value> = self
        .job_property_names
        .iter()
        .map(String::as_str)
        .zip(values.iter())
        .collect();

      let type_name = match fields.get(JOB_TYPE_NAME) {
        Some(v) => v.as_str().ok_or(JobDecodeError::TypeNameNotString { row })?,
        None => return Err(JobDecodeError::MissingTypeName { row }),
      };

      out.push(Job {
        job_type_name: type_name.to_string(),
      });
    }

    Ok(out)
  }
}
