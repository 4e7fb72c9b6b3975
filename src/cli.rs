use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::Parser;
use regex::Regex;

use crate::counter::CountOptions;
use crate::retry::{BackoffPolicy, DEFAULT_MAX_DELAY_SECS, DEFAULT_MIN_DELAY_SECS};
use crate::window;

pub const DEFAULT_TREEHERDER: &str = "https://treeherder.mozilla.org";

#[derive(Parser, Debug)]
#[command(
    name = "treeherder-push-counts",
    version,
    about = "Retrieve push counts from Treeherder by repository, date and test labels",
    long_about = None
)]
pub struct Cli {
  /// Treeherder url
  #[arg(long, default_value = DEFAULT_TREEHERDER)]
  pub treeherder: String,

  /// Start date CCYY-MM-DD (default: today's date)
  #[arg(long)]
  pub start_date: Option<String>,

  /// End date CCYY-MM-DD, exclusive (default: start date + 1 day)
  #[arg(long)]
  pub end_date: Option<String>,

  /// Repository to query, e.g. mozilla-central. Repeat for several.
  #[arg(long = "repo")]
  pub repos: Vec<String>,

  /// List available repositories and exit
  #[arg(long)]
  pub list_repos: bool,

  /// Count test jobs whose label matches this regular expression. Repeat for several.
  /// Without any, count total pushes.
  #[arg(long = "test-label")]
  pub test_labels: Vec<String>,

  /// Group counts by the --test-label patterns rather than the full test label
  #[arg(long)]
  pub consolidate: bool,

  /// Field delimiter
  #[arg(long, default_value = ",")]
  pub delimiter: String,

  /// Give up on a request after this many attempts (default: retry transient failures forever)
  #[arg(long)]
  pub max_attempts: Option<u32>,

  /// Lower bound of the randomized retry delay, in seconds
  #[arg(long, default_value_t = DEFAULT_MIN_DELAY_SECS)]
  pub backoff_min_secs: u64,

  /// Upper bound (exclusive) of the randomized retry delay, in seconds
  #[arg(long, default_value_t = DEFAULT_MAX_DELAY_SECS)]
  pub backoff_max_secs: u64,

  /// Emit a troff man page to stdout (internal; for packaging)
  #[arg(long, hide = true)]
  pub gen_man: bool,

  /// Override "today" for date defaults (hidden; tests only)
  #[arg(long = "today-override", hide = true)]
  pub today_override: Option<String>,
}

#[derive(Debug)]
pub struct EffectiveConfig {
  pub treeherder: String,
  pub start: NaiveDate,
  pub end: NaiveDate,
  pub repos: Vec<String>,
  pub list_repos: bool,
  pub count: CountOptions,
  pub backoff: BackoffPolicy,
}

pub fn normalize(cli: Cli) -> Result<EffectiveConfig> {
  if cli.max_attempts == Some(0) {
    bail!("--max-attempts must be at least 1");
  }

  let today = window::effective_today(window::parse_today_override(cli.today_override.as_deref()));

  // Listing ignores date and label flags entirely.
  let (test_labels, (start, end)) = if cli.list_repos {
    (Vec::new(), window::get_date_range(None, None, today)?)
  } else {
    let test_labels = cli
      .test_labels
      .iter()
      .map(|p| Regex::new(p).with_context(|| format!("invalid --test-label {:?}", p)))
      .collect::<Result<Vec<_>>>()?;
    let range = window::get_date_range(cli.start_date.as_deref(), cli.end_date.as_deref(), today)?;

    (test_labels, range)
  };

  let backoff = BackoffPolicy::new(
    Duration::from_secs(cli.backoff_min_secs),
    Duration::from_secs(cli.backoff_max_secs),
  )
  .with_max_attempts(cli.max_attempts);

  Ok(EffectiveConfig {
    treeherder: cli.treeherder,
    start,
    end,
    repos: cli.repos,
    list_repos: cli.list_repos,
    count: CountOptions {
      test_labels,
      consolidate: cli.consolidate,
      delimiter: cli.delimiter,
    },
    backoff,
  })
}
