//! Shared time-of-day helpers.
//!
//! All schedule math works in minutes since midnight. The awake window may
//! cross midnight (wake 22:00, sleep 06:00), so helpers that compare times
//! within the window measure offsets from wake with wraparound.

use crate::{Error, Result};
use chrono::{NaiveTime, Timelike};

/// Minutes in a day, the modulus for all wraparound arithmetic.
pub const MINUTES_PER_DAY: u32 = 1440;

/// Parse a `HH:MM` 24-hour time string.
///
/// Rejects malformed input with a validation error so nothing downstream
/// ever sees an unparsed time.
pub fn parse_hhmm(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|_| Error::Validation(format!("invalid time '{}', expected HH:MM", s)))
}

/// Minutes since midnight for a time-of-day. Seconds are ignored.
pub fn minutes_since_midnight(t: NaiveTime) -> u32 {
    t.hour() * 60 + t.minute()
}

/// Time-of-day for a minute count, wrapping past midnight.
pub fn time_from_minutes(minutes: u32) -> NaiveTime {
    let m = minutes % MINUTES_PER_DAY;
    NaiveTime::from_hms_opt(m / 60, m % 60, 0).expect("minute arithmetic stays in range")
}

/// Length of the awake window in minutes.
///
/// If sleep is numerically at or before wake, the window crosses midnight
/// and sleep is pushed forward a day before subtracting.
pub fn awake_window_minutes(wake: NaiveTime, sleep: NaiveTime) -> u32 {
    let wake_m = minutes_since_midnight(wake);
    let mut sleep_m = minutes_since_midnight(sleep);
    if sleep_m <= wake_m {
        sleep_m += MINUTES_PER_DAY;
    }
    sleep_m - wake_m
}

/// Offset of `t` into the awake window that starts at `wake`, with
/// wraparound. A slot at 00:30 after a 22:00 wake has offset 150.
pub fn minutes_into_window(wake: NaiveTime, t: NaiveTime) -> u32 {
    let wake_m = minutes_since_midnight(wake) as i64;
    let t_m = minutes_since_midnight(t) as i64;
    (t_m - wake_m).rem_euclid(MINUTES_PER_DAY as i64) as u32
}
