// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Randomized backoff policy for transient fetch failures plus an injectable sleep seam
// role: fetch/retry
// inputs: min/max delay window, optional attempt cap, a random source
// outputs: Delays drawn from [min, max); retry/stop decisions per attempt
// invariants:
// - max_attempts = None never stops retrying
// - delay is exactly min when max <= min
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

#[cfg(test)]
use std::cell::RefCell;
use std::time::Duration;

use rand::Rng;

pub const DEFAULT_MIN_DELAY_SECS: u64 = 60;
pub const DEFAULT_MAX_DELAY_SECS: u64 = 90;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffPolicy {
  pub min_delay: Duration,
  pub max_delay: Duration,
  /// Total attempts allowed for one request, counting the first. `None` retries forever.
  pub max_attempts: Option<u32>,
}

impl BackoffPolicy {
  pub fn new(min_delay: Duration, max_delay: Duration) -> Self {
    Self {
      min_delay,
      max_delay,
      max_attempts: None,
    }
  }

  pub fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
    self.max_attempts = max_attempts;
    self
  }

  /// Whether another attempt may follow `attempts` failed ones.
  pub fn should_retry(&self, attempts: u32) -> bool {
    match self.max_attempts {
      Some(max) => attempts < max,
      None => true,
    }
  }

  /// Draw a delay from `[min_delay, max_delay)` at millisecond granularity.
  pub fn delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
    let min = self.min_delay.as_millis() as u64;
    let max = self.max_delay.as_millis() as u64;

    if max <= min {
      return self.min_delay;
    }

    Duration::from_millis(rng.gen_range(min..max))
  }
}

impl Default for BackoffPolicy {
  fn default() -> Self {
    Self::new(
      Duration::from_secs(DEFAULT_MIN_DELAY_SECS),
      Duration::from_secs(DEFAULT_MAX_DELAY_SECS),
    )
  }
}

// --- Trait seam for sleeping between attempts ---
pub trait Sleeper {
  fn sleep(&self, delay: Duration);
}

pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
  fn sleep(&self, delay: Duration) {
    std::thread::sleep(delay);
  }
}

/// Records requested delays without blocking.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingSleeper {
  delays: RefCell<Vec<Duration>>,
}

#[cfg(test)]
impl RecordingSleeper {
  pub fn delays(&self) -> Vec<Duration> {
    self.delays.borrow().clone()
  }
}

#[cfg(test)]
impl Sleeper for RecordingSleeper {
  fn sleep(&self, delay: Duration) {
    self.delays.borrow_mut().push(delay);
  }
}
