//! Submission throttle.
//!
//! An author may submit at most one observation per species every
//! [`WINDOW_MINUTES`]. The check is derived from the most recent persisted
//! observation for the (author, species) pair, so there is no in-memory
//! counter to share or evict. Two simultaneous submissions may both pass;
//! this is a soft limit.

use chrono::{DateTime, Duration, Utc};

use crate::{Error, Result};

pub const WINDOW_MINUTES: i64 = 5;

pub fn window() -> Duration { Duration::minutes(WINDOW_MINUTES) }

/// Decide whether a new submission at `now` is admitted, given the creation
/// time of the pair's latest observation.
///
/// On rejection the error carries the remaining wait in whole minutes,
/// rounded up (`ceil(5 - elapsed_minutes)`).
pub fn check(last_created_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Result<()> {
  let Some(last) = last_created_at else {
    return Ok(());
  };

  let elapsed = now - last;
  if elapsed >= window() {
    return Ok(());
  }

  let elapsed_minutes = elapsed.num_milliseconds() as f64 / 60_000.0;
  let minutes = (WINDOW_MINUTES as f64 - elapsed_minutes).ceil() as i64;
  Err(Error::Throttled { minutes })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
  }

  fn minutes_left(result: Result<()>) -> i64 {
    match result {
      Err(Error::Throttled { minutes }) => minutes,
      other => panic!("expected throttle, got {other:?}"),
    }
  }

  #[test]
  fn first_submission_is_admitted() {
    assert!(check(None, at(0)).is_ok());
  }

  #[test]
  fn immediate_resubmission_waits_full_window() {
    assert_eq!(minutes_left(check(Some(at(0)), at(0))), 5);
  }

  #[test]
  fn remaining_wait_rounds_up() {
    // 90 s elapsed: 3.5 minutes remain.
    assert_eq!(minutes_left(check(Some(at(0)), at(90))), 4);
    // 4 min 59 s elapsed.
    assert_eq!(minutes_left(check(Some(at(0)), at(299))), 1);
    // exactly 2 minutes elapsed.
    assert_eq!(minutes_left(check(Some(at(0)), at(120))), 3);
  }

  #[test]
  fn window_boundary_is_admitted() {
    assert!(check(Some(at(0)), at(300)).is_ok());
    assert!(check(Some(at(0)), at(3600)).is_ok());
  }
}
