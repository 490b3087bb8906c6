//! Display-unit conversion at the presentation boundary.
//!
//! Everything internal is metric: volumes in millilitres, weight in
//! kilograms. This module is the single place imperial numbers exist; no
//! other code does unit math.

use serde::{Deserialize, Serialize};

/// Millilitres per US fluid ounce.
pub const ML_PER_FL_OZ: f64 = 29.5735;

/// Kilograms per pound.
pub const KG_PER_LB: f64 = 0.453_592;

/// Unit system used for display only.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DisplayUnits {
    #[default]
    Metric,
    Imperial,
}

pub fn ml_to_fl_oz(ml: u32) -> f64 {
    f64::from(ml) / ML_PER_FL_OZ
}

pub fn fl_oz_to_ml(fl_oz: f64) -> u32 {
    (fl_oz * ML_PER_FL_OZ).round().max(0.0) as u32
}

pub fn kg_to_lb(kg: f64) -> f64 {
    kg / KG_PER_LB
}

pub fn lb_to_kg(lb: f64) -> f64 {
    lb * KG_PER_LB
}

/// Render a volume for the user in their preferred units.
pub fn format_volume(ml: u32, units: DisplayUnits) -> String {
    match units {
        DisplayUnits::Metric => format!("{} ml", ml),
        DisplayUnits::Imperial => format!("{:.1} fl oz", ml_to_fl_oz(ml)),
    }
}

/// Render a weight for the user in their preferred units.
pub fn format_weight(kg: f64, units: DisplayUnits) -> String {
    match units {
        DisplayUnits::Metric => format!("{:.1} kg", kg),
        DisplayUnits::Imperial => format!("{:.1} lb", kg_to_lb(kg)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_roundtrip() {
        let ml = 500;
        let back = fl_oz_to_ml(ml_to_fl_oz(ml));
        assert!((i64::from(back) - i64::from(ml)).abs() <= 1);
    }

    #[test]
    fn test_weight_roundtrip() {
        let kg = 70.0;
        assert!((lb_to_kg(kg_to_lb(kg)) - kg).abs() < 1e-9);
    }

    #[test]
    fn test_format_metric() {
        assert_eq!(format_volume(2440, DisplayUnits::Metric), "2440 ml");
        assert_eq!(format_weight(70.0, DisplayUnits::Metric), "70.0 kg");
    }

    #[test]
    fn test_format_imperial() {
        assert_eq!(format_volume(2440, DisplayUnits::Imperial), "82.5 fl oz");
        assert_eq!(format_weight(70.0, DisplayUnits::Imperial), "154.3 lb");
    }

    #[test]
    fn test_fl_oz_to_ml_never_negative() {
        assert_eq!(fl_oz_to_ml(-3.0), 0);
    }
}
