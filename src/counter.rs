// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Count pushes, or test jobs matching label patterns, per repository and day; emit delimited rows
// role: processing/counter
// inputs: Fetcher; RepositoryDirectory; repo name; CountOptions (patterns, consolidate, delimiter); [start, end) dates
// outputs: Rows written to any io::Write, in day order then sorted label order
// side_effects: GETs for pushes, resultsets, and jobs; writes rows
// invariants:
// - push count for a day is max(id) - min(id) + 1, not the number of ids
// - each matching pattern increments once per job (several patterns may match one job)
// - label rows for one day are emitted only after the whole day is tallied
// errors: Decode errors propagate; missing day/push/resultset data yields no contribution
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::BTreeMap;
use std::io::Write;

use anyhow::Result;
use chrono::NaiveDate;
use regex::Regex;
use tracing::{debug, warn};

use crate::directory::RepositoryDirectory;
use crate::error::FetchError;
use crate::fetch::Fetcher;
use crate::model::{Job, JobListing, PushListing, ResultsetListing};
use crate::render;
use crate::window::{datestr, day_windows};

/// Cap the dashboard applies per jobs request; overflow is not paginated.
pub const JOBS_PAGE_SIZE: u32 = 2000;
pub const RESULTSET_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone)]
pub struct CountOptions {
  pub test_labels: Vec<Regex>,
  pub consolidate: bool,
  pub delimiter: String,
}

impl CountOptions {
  pub fn has_test_labels(&self) -> bool {
    !self.test_labels.is_empty()
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayCount {
  Pushes(u128),
  Labels(BTreeMap<String, u64>),
}

pub struct PushCounter<'a> {
  fetcher: &'a Fetcher,
  directory: &'a RepositoryDirectory,
}

impl<'a> PushCounter<'a> {
  pub fn new(fetcher: &'a Fetcher, directory: &'a RepositoryDirectory) -> Self {
    Self { fetcher, directory }
  }

  pub fn get_pushes(&self, repo: &str, start: NaiveDate, end: NaiveDate) -> Result<Option<PushListing>, FetchError> {
    let Some(repo_url) = self.directory.url_for(repo) else {
      warn!(repo, "Unknown repository");
      return Ok(None);
    };
    let url = format!(
      "{}/json-pushes?startdate={}&enddate={}",
      repo_url,
      datestr(start),
      datestr(end)
    );

    self.fetcher.fetch_as::<PushListing>(&url)
  }

  pub fn get_changeset_resultset(&self, repo: &str, revision: &str) -> Result<Option<ResultsetListing>, FetchError> {
    let url = format!(
      "{}/api/project/{}/push/?full=true&count={}&revision={}",
      self.directory.base_url(),
      repo,
      RESULTSET_PAGE_SIZE,
      revision
    );

    self.fetcher.fetch_as::<ResultsetListing>(&url)
  }

  pub fn get_jobs(&self, repo: &str, resultset_id: i64) -> Result<Option<Vec<Job>>, FetchError> {
    let url = format!(
      "{}/api/project/{}/jobs/?return_type=list&count={}&result_set_id={}",
      self.directory.base_url(),
      repo,
      JOBS_PAGE_SIZE,
      resultset_id
    );

    let Some(listing) = self.fetcher.fetch_as::<JobListing>(&url)? else {
      return Ok(None);
    };
    let jobs = listing.jobs().map_err(|source| FetchError::Job { url, source })?;

    Ok(Some(jobs))
  }

  /// Tally one `[day, next)` window. `None` when the day's pushes could not be fetched
  /// or there were none.
  pub fn count_day(&self, repo: &str, day: NaiveDate, next: NaiveDate, opts: &CountOptions) -> Result<Option<DayCount>, FetchError> {
    let Some(pushes) = self.get_pushes(repo, day, next)? else {
      return Ok(None);
    };

    if !opts.has_test_labels() {
      return Ok(push_span(pushes.keys().copied()).map(DayCount::Pushes));
    }
    if pushes.is_empty() {
      return Ok(None);
    }

    let mut label_counts: BTreeMap<String, u64> = BTreeMap::new();

    for (push_id, push) in pushes.iter() {
      let Some(changeset) = push.last_changeset() else {
        warn!(repo, push_id, "Push has no changesets");
        continue;
      };
      let Some(resultsets) = self.get_changeset_resultset(repo, changeset)? else {
        continue;
      };

      for resultset in resultsets.results.iter() {
        let Some(jobs) = self.get_jobs(repo, resultset.id)? else {
          continue;
        };
        debug!(repo, push_id, resultset = resultset.id, jobs = jobs.len(), "tallying jobs");
        tally_jobs(&jobs, &opts.test_labels, opts.consolidate, &mut label_counts);
      }
    }

    Ok(Some(DayCount::Labels(label_counts)))
  }

  pub fn output_headers<W: Write>(&self, out: &mut W, opts: &CountOptions) -> Result<()> {
    writeln!(out, "{}", render::header_row(opts.has_test_labels(), &opts.delimiter))?;
    Ok(())
  }

  pub fn output_counts<W: Write>(
    &self,
    out: &mut W,
    repo: &str,
    opts: &CountOptions,
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<()> {
    if self.directory.url_for(repo).is_none() {
      warn!(repo, "Unknown repository; skipping");
      return Ok(());
    }

    for (day, next) in day_windows(start, end) {
      match self.count_day(repo, day, next, opts)? {
        Some(DayCount::Pushes(count)) => {
          writeln!(out, "{}", render::push_count_row(day, repo, count, &opts.delimiter))?;
        }
        Some(DayCount::Labels(counts)) => {
          for row in render::label_count_rows(day, repo, &counts, &opts.delimiter) {
            writeln!(out, "{}", row)?;
          }
        }
        None => debug!(repo, day = %datestr(day), "no pushes"),
      }
    }

    Ok(())
  }
}

/// `max(id) - min(id) + 1`; ids are allocated contiguously per repository.
/// Widened to `u128` so a listing spanning the whole `u64` id range still counts.
pub fn push_span<I: IntoIterator<Item = u64>>(ids: I) -> Option<u128> {
  let mut bounds: Option<(u64, u64)> = None;

  for id in ids {
    bounds = Some(match bounds {
      Some((lo, hi)) => (lo.min(id), hi.max(id)),
      None => (id, id),
    });
  }

  bounds.map(|(lo, hi)| u128::from(hi - lo) + 1)
}

pub fn tally_jobs(jobs: &[Job], test_labels: &[Regex], consolidate: bool, counts: &mut BTreeMap<String, u64>) {
  for job in jobs {
    for re_label in test_labels {
      if !re_label.is_match(&job.job_type_name) {
        continue;
      }
      let key = if consolidate {
        re_label.as_str()
      } else {
        job.job_type_name.as_str()
      };

      *counts.entry(key.to_string()).or_insert(0) += 1;
    }
  }
}
