//! Display formatting for telemetry readouts.

use crate::snapshot::MAX_ANGLE;

/// Shown in place of any value that could not be read.
pub const PLACEHOLDER: &str = "--";

/// Gauge label: one decimal and a degree sign, or the placeholder.
pub fn angle_label(angle: Option<f64>) -> String {
    match angle {
        Some(a) => format!("{a:.1}\u{00B0}"),
        None => PLACEHOLDER.to_string(),
    }
}

/// Gauge fill as a percentage of the full 180 degree sweep.
pub fn angle_fill_percent(angle: Option<f64>) -> f64 {
    angle.map_or(0.0, |a| a / MAX_ANGLE * 100.0)
}

/// Voltage readout: two decimals and a volt suffix, or the placeholder.
pub fn voltage_label(voltage: Option<f64>) -> String {
    match voltage {
        Some(v) => format!("{v:.2} V"),
        None => PLACEHOLDER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::TelemetrySnapshot;
    use serde_json::json;

    #[test]
    fn test_angle_label() {
        assert_eq!(angle_label(Some(90.0)), "90.0°");
        assert_eq!(angle_label(Some(12.345)), "12.3°");
        assert_eq!(angle_label(None), "--");
    }

    #[test]
    fn test_clamped_angles_render_at_bounds() {
        let s = TelemetrySnapshot::try_from(json!({
            "servo1": 185,
            "servo2": -5,
            "servo3": "loose",
        }))
        .unwrap();
        assert_eq!(angle_label(s.servo_angle(1)), "180.0°");
        assert_eq!(angle_label(s.servo_angle(2)), "0.0°");
        assert_eq!(angle_label(s.servo_angle(3)), PLACEHOLDER);
        assert_eq!(angle_fill_percent(s.servo_angle(1)), 100.0);
        assert_eq!(angle_fill_percent(s.servo_angle(3)), 0.0);
    }

    #[test]
    fn test_fill_percent() {
        assert_eq!(angle_fill_percent(Some(90.0)), 50.0);
        assert_eq!(angle_fill_percent(Some(0.0)), 0.0);
    }

    #[test]
    fn test_voltage_label() {
        assert_eq!(voltage_label(Some(3.7)), "3.70 V");
        assert_eq!(voltage_label(Some(12.0)), "12.00 V");
        assert_eq!(voltage_label(None), "--");
    }
}
