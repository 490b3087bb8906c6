//! Core domain types for the Sip hydration system.
//!
//! This module defines the fundamental types used throughout the system:
//! - The user profile (weight, climate, activity, routine)
//! - The per-day consumption ledger
//! - Reminder slots and intake events

use crate::{goal, Error, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use uuid::Uuid;

/// Accepted body weight range in kilograms.
///
/// Enforced by [`Profile::validate`] before any weight reaches the goal
/// calculator.
pub const WEIGHT_RANGE_KG: RangeInclusive<f64> = 1.0..=500.0;

// ============================================================================
// Profile Types
// ============================================================================

/// Physical activity level
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    None,
    Light,
    Moderate,
    Heavy,
}

/// Climate the user lives in
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Climate {
    Cold,
    Mild,
    Hot,
    VeryHot,
}

/// How often a reminder fires during the awake window.
///
/// A closed enum rather than a bare minute count: the configuration surface
/// only admits 60 or 90 minutes, so anything else is unrepresentable.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReminderInterval {
    Hourly,
    NinetyMinutes,
}

impl ReminderInterval {
    /// Interval length in minutes.
    pub fn minutes(self) -> u32 {
        match self {
            ReminderInterval::Hourly => 60,
            ReminderInterval::NinetyMinutes => 90,
        }
    }

    /// Parse a minute count from the configuration surface.
    pub fn from_minutes(minutes: u32) -> Result<Self> {
        match minutes {
            60 => Ok(ReminderInterval::Hourly),
            90 => Ok(ReminderInterval::NinetyMinutes),
            other => Err(Error::Validation(format!(
                "reminder interval must be 60 or 90 minutes, got {}",
                other
            ))),
        }
    }
}

/// The user's long-lived profile.
///
/// `daily_goal_ml` is a cached copy of the goal calculator's output over the
/// current weight/climate/activity. No code path sets it independently;
/// [`Profile::recompute_goal`] is the only writer.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub weight_kg: f64,
    pub activity: ActivityLevel,
    pub climate: Climate,
    pub wake: NaiveTime,
    pub sleep: NaiveTime,
    pub interval: ReminderInterval,
    pub daily_goal_ml: u32,
}

impl Profile {
    /// Build a profile from validated inputs, deriving the goal.
    pub fn new(
        weight_kg: f64,
        activity: ActivityLevel,
        climate: Climate,
        wake: NaiveTime,
        sleep: NaiveTime,
        interval: ReminderInterval,
    ) -> Result<Self> {
        let mut profile = Profile {
            weight_kg,
            activity,
            climate,
            wake,
            sleep,
            interval,
            daily_goal_ml: 0,
        };
        profile.validate()?;
        profile.recompute_goal();
        Ok(profile)
    }

    /// Reject caller contract violations before they reach the calculators.
    pub fn validate(&self) -> Result<()> {
        if !self.weight_kg.is_finite() || !WEIGHT_RANGE_KG.contains(&self.weight_kg) {
            return Err(Error::Validation(format!(
                "weight must be between {} and {} kg, got {}",
                WEIGHT_RANGE_KG.start(),
                WEIGHT_RANGE_KG.end(),
                self.weight_kg
            )));
        }
        Ok(())
    }

    /// Refresh the cached goal from the current body fields.
    pub fn recompute_goal(&mut self) {
        self.daily_goal_ml = goal::daily_goal_ml(self.weight_kg, self.climate, self.activity);
    }
}

// ============================================================================
// Daily State Types
// ============================================================================

/// One calendar day's consumption ledger.
///
/// Created on first access for the date, superseded at rollover.
/// `remaining_ml` is derived (`max(0, goal - consumed)`) and kept in sync on
/// every mutation; it is never independent truth.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DailyState {
    pub date: NaiveDate,
    pub consumed_ml: u32,
    pub remaining_ml: u32,
    pub completed: u32,
    pub skipped: u32,
    /// Slot count of the plan this day started with.
    pub planned_total: u32,
    /// Current per-slot suggested amount; updated by redistribution.
    pub slot_amount_ml: u32,
    /// Transport ids of the currently scheduled reminders, for cancellation.
    pub scheduled_ids: Vec<Uuid>,
}

impl DailyState {
    /// Fresh ledger for a new day: nothing consumed, counters at zero.
    pub fn fresh(date: NaiveDate, goal_ml: u32, planned_total: u32, slot_amount_ml: u32) -> Self {
        DailyState {
            date,
            consumed_ml: 0,
            remaining_ml: goal_ml,
            completed: 0,
            skipped: 0,
            planned_total,
            slot_amount_ml,
            scheduled_ids: Vec::new(),
        }
    }

    /// Reminders not yet completed or skipped out of the day's plan.
    pub fn reminders_left(&self) -> u32 {
        self.planned_total
            .saturating_sub(self.completed + self.skipped)
    }

    /// Add a consumption and resync the cached remaining volume.
    pub fn apply_consumption(&mut self, amount_ml: u32, goal_ml: u32) {
        self.consumed_ml += amount_ml;
        self.recompute_remaining(goal_ml);
    }

    /// Resync `remaining_ml` after a consumption or goal change.
    pub fn recompute_remaining(&mut self, goal_ml: u32) {
        self.remaining_ml = goal_ml.saturating_sub(self.consumed_ml);
    }
}

// ============================================================================
// Reminder and Intake Types
// ============================================================================

/// A single planned reminder: time plus suggested amount.
///
/// Ephemeral: always regenerated from the profile and the day's goal, never
/// persisted as independent truth and never partially patched.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReminderSlot {
    pub time: NaiveTime,
    pub amount_ml: u32,
    pub ordinal: u32,
}

/// Where an intake record came from.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IntakeSource {
    /// Logged directly by the user.
    Manual,
    /// Credited by completing a reminder.
    Reminder,
}

/// A logged drink, appended to the intake journal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IntakeEvent {
    pub id: Uuid,
    pub logged_at: DateTime<Utc>,
    pub date: NaiveDate,
    pub amount_ml: u32,
    pub source: IntakeSource,
}

impl IntakeEvent {
    pub fn new(logged_at: DateTime<Utc>, date: NaiveDate, amount_ml: u32, source: IntakeSource) -> Self {
        IntakeEvent {
            id: Uuid::new_v4(),
            logged_at,
            date,
            amount_ml,
            source,
        }
    }
}
