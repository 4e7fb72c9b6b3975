use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};

// Day-granular date handling; no timezone math beyond the local "today".

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn datestr(date: NaiveDate) -> String {
  date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(raw: &str, flag: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
    .with_context(|| format!("invalid {flag} {raw:?}, expected CCYY-MM-DD"))
}

/// Parse a `--today-override` value. Unparseable input yields `None`, which
/// falls back to the local calendar date.
pub fn parse_today_override(s: Option<&str>) -> Option<NaiveDate> {
  s.and_then(|raw| NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok())
}

pub fn effective_today(override_today: Option<NaiveDate>) -> NaiveDate {
  override_today.unwrap_or_else(|| Local::now().date_naive())
}

/// Resolve `(start, end)` from optional CLI dates.
///
/// A missing start is `today`; a missing end is the day after start.
pub fn get_date_range(start: Option<&str>, end: Option<&str>, today: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
  let start_date = match start {
    Some(s) => parse_date(s, "--start-date")?,
    None => today,
  };

  let end_date = match end {
    Some(e) => parse_date(e, "--end-date")?,
    None => next_day(start_date)?,
  };

  Ok((start_date, end_date))
}

fn next_day(date: NaiveDate) -> Result<NaiveDate> {
  date.succ_opt().with_context(|| format!("no day after {}", datestr(date)))
}

/// Half-open `[day, day + 1)` windows covering `[start, end)`.
pub fn day_windows(start: NaiveDate, end: NaiveDate) -> DayWindows {
  DayWindows { current: start, end }
}

pub struct DayWindows {
  current: NaiveDate,
  end: NaiveDate,
}

impl Iterator for DayWindows {
  type Item = (NaiveDate, NaiveDate);

  fn next(&mut self) -> Option<Self::Item> {
    if self.current >= self.end {
      return None;
    }
    let next = self.current.succ_opt()?;
    let window = (self.current, next);
    self.current = next;

    Some(window)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
  }

  #[test]
  fn defaults_to_today_and_tomorrow() {
    let today = d("2025-08-15");
    let (s, e) = get_date_range(None, None, today).unwrap();
    assert_eq!(s, today);
    assert_eq!(e, d("2025-08-16"));
  }

  #[test]
  fn missing_end_is_start_plus_one() {
    let (s, e) = get_date_range(Some("2020-01-01"), None, d("2025-08-15")).unwrap();
    assert_eq!(s, d("2020-01-01"));
    assert_eq!(e, d("2020-01-02"));
  }

  #[test]
  fn end_rolls_over_month_and_year() {
    let (_, e) = get_date_range(Some("2019-12-31"), None, d("2025-08-15")).unwrap();
    assert_eq!(e, d("2020-01-01"));
    let (_, e) = get_date_range(Some("2020-02-28"), None, d("2025-08-15")).unwrap();
    assert_eq!(e, d("2020-02-29"));
  }

  #[test]
  fn invalid_date_names_the_flag() {
    let err = get_date_range(Some("2020-13-01"), None, d("2025-08-15")).unwrap_err();
    assert!(format!("{:#}", err).contains("--start-date"));
    let err = get_date_range(None, Some("tomorrow"), d("2025-08-15")).unwrap_err();
    assert!(format!("{:#}", err).contains("--end-date"));
  }

  #[test]
  fn windows_cover_range_one_day_at_a_time() {
    let days: Vec<_> = day_windows(d("2020-02-27"), d("2020-03-01")).collect();
    assert_eq!(
      days,
      vec![
        (d("2020-02-27"), d("2020-02-28")),
        (d("2020-02-28"), d("2020-02-29")),
        (d("2020-02-29"), d("2020-03-01")),
      ]
    );
  }

  #[test]
  fn empty_or_inverted_range_has_no_windows() {
    assert_eq!(day_windows(d("2020-01-02"), d("2020-01-02")).count(), 0);
    assert_eq!(day_windows(d("2020-01-05"), d("2020-01-02")).count(), 0);
  }

  #[test]
  fn today_override_parses_or_falls_back() {
    assert_eq!(parse_today_override(Some("2024-09-12")), Some(d("2024-09-12")));
    assert_eq!(parse_today_override(Some("nope")), None);
    assert_eq!(effective_today(Some(d("2024-09-12"))), d("2024-09-12"));
  }

  #[test]
  fn datestr_is_zero_padded() {
    assert_eq!(datestr(d("2020-01-05")), "2020-01-05");
  }
}
