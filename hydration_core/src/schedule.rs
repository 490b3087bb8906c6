//! Reminder schedule generation.
//!
//! The schedule is a pure function of wake time, sleep time, interval and
//! daily goal: the same four inputs always yield the same slot list, which is
//! what lets the day tracker throw the plan away and regenerate it freely.
//! The list is never patched in place.

use crate::timeutil::{awake_window_minutes, minutes_since_midnight, time_from_minutes};
use crate::types::{ReminderInterval, ReminderSlot};
use crate::goal::snap_to_ten;
use chrono::NaiveTime;

/// Generate the day's reminder slots.
///
/// Slots start at wake and repeat every interval until the awake window is
/// exhausted; each carries an equal share of the goal snapped to 10 ml.
/// A window shorter than one interval yields an empty schedule.
pub fn generate_schedule(
    wake: NaiveTime,
    sleep: NaiveTime,
    interval: ReminderInterval,
    goal_ml: u32,
) -> Vec<ReminderSlot> {
    let window = awake_window_minutes(wake, sleep);
    let step = interval.minutes();
    let count = window / step;
    if count == 0 {
        tracing::debug!(
            "awake window of {} minutes is shorter than one {}-minute interval",
            window,
            step
        );
        return Vec::new();
    }

    // One share for the whole day, computed once.
    let per_slot = snap_to_ten(f64::from(goal_ml) / f64::from(count));

    let wake_m = minutes_since_midnight(wake);
    (0..count)
        .map(|i| ReminderSlot {
            time: time_from_minutes(wake_m + i * step),
            amount_ml: per_slot,
            ordinal: i,
        })
        .collect()
}
