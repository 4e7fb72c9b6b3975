use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::window::datestr;

pub fn header_row(has_test_labels: bool, delimiter: &str) -> String {
  if has_test_labels {
    ["date", "repo", "test_label", "count"].join(delimiter)
  } else {
    ["date", "repo", "count"].join(delimiter)
  }
}

pub fn push_count_row(date: NaiveDate, repo: &str, count: u128, delimiter: &str) -> String {
  [datestr(date).as_str(), repo, count.to_string().as_str()].join(delimiter)
}

/// One row per label, ascending by label.
pub fn label_count_rows(date: NaiveDate, repo: &str, counts: &BTreeMap<String, u64>, delimiter: &str) -> Vec<String> {
  let day = datestr(date);

  counts
    .iter()
    .map(|(label, count)| [day.as_str(), repo, label.as_str(), count.to_string().as_str()].join(delimiter))
    .collect()
}

pub fn repo_listing_line(name: &str, url: &str) -> String {
  format!("{:<30} {}", name, url)
}
