//! Daily goal calculation from the user's body profile.
//!
//! The goal is a total function of weight, climate and activity level.
//! Callers validate weight against [`crate::types::WEIGHT_RANGE_KG`] before
//! invoking; out-of-range input is a caller contract violation, not a
//! failure this module detects.

use crate::types::{ActivityLevel, Climate};

// === Constants ===

/// Base intake per kilogram of body weight (ml).
pub const ML_PER_KG: f64 = 32.0;

/// Rounding step for every volume the system hands to the user (ml).
pub const ROUNDING_STEP_ML: f64 = 10.0;

/// Climate adjustment to the daily goal (ml).
pub fn climate_adjustment_ml(climate: Climate) -> i32 {
    match climate {
        Climate::Cold => -200,
        Climate::Mild => 0,
        Climate::Hot => 300,
        Climate::VeryHot => 500,
    }
}

/// Activity adjustment to the daily goal (ml).
pub fn activity_adjustment_ml(activity: ActivityLevel) -> i32 {
    match activity {
        ActivityLevel::None => 0,
        ActivityLevel::Light => 200,
        ActivityLevel::Moderate => 500,
        ActivityLevel::Heavy => 800,
    }
}

/// Snap a volume to the nearest 10 ml, clamped at zero.
pub fn snap_to_ten(ml: f64) -> u32 {
    let snapped = (ml / ROUNDING_STEP_ML).round() * ROUNDING_STEP_ML;
    snapped.max(0.0) as u32
}

/// Compute the daily fluid goal in millilitres.
///
/// ```
/// use hydration_core::goal::daily_goal_ml;
/// use hydration_core::types::{ActivityLevel, Climate};
///
/// // 70 kg, mild climate, light activity: 2240 + 0 + 200 = 2440
/// assert_eq!(daily_goal_ml(70.0, Climate::Mild, ActivityLevel::Light), 2440);
/// ```
pub fn daily_goal_ml(weight_kg: f64, climate: Climate, activity: ActivityLevel) -> u32 {
    let base = weight_kg * ML_PER_KG;
    let total =
        base + f64::from(climate_adjustment_ml(climate)) + f64::from(activity_adjustment_ml(activity));
    snap_to_ten(total)
}
