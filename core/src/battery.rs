//! Battery voltage conversion and charge estimation.
//!
//! The firmware measures VSYS through a ×3 divider on the shared
//! GPIO29 sense line; everything past the raw ADC counts is pure math
//! and lives here.

use crate::model::BatteryStatus;

/// ADC reference voltage.
pub const ADC_REFERENCE_VOLTS: f32 = 3.3;
/// 12-bit conversion range.
pub const ADC_COUNTS: f32 = 4096.0;
/// VSYS is measured through a 3:1 divider.
pub const VSYS_DIVIDER: f32 = 3.0;

/// Voltage at which the battery is considered empty.
pub const BATTERY_EMPTY_VOLTS: f32 = 2.7;
/// Voltage at which the battery is considered full.
pub const BATTERY_FULL_VOLTS: f32 = 3.3;
/// Above this VSYS can only be USB/charger power, not the cell.
pub const EXTERNAL_POWER_VOLTS: f32 = 4.5;

/// Convert a raw 12-bit ADC count into the VSYS voltage.
pub fn volts_from_raw(raw: u16) -> f32 {
    f32::from(raw) * ADC_REFERENCE_VOLTS / ADC_COUNTS * VSYS_DIVIDER
}

/// Derive the battery status from a VSYS voltage.
///
/// Percentage is a linear map of 2.7..3.3 V onto 0..100, clamped at
/// both ends. Anything above 4.5 V flags external power; the
/// percentage is pinned to 100 there but carries no meaning.
pub fn status_from_volts(voltage: f32) -> BatteryStatus {
    if voltage > EXTERNAL_POWER_VOLTS {
        return BatteryStatus {
            voltage,
            percentage: 100.0,
            external_power: true,
        };
    }
    let span = BATTERY_FULL_VOLTS - BATTERY_EMPTY_VOLTS;
    let percentage = ((voltage - BATTERY_EMPTY_VOLTS) / span * 100.0).clamp(0.0, 100.0);
    BatteryStatus {
        voltage,
        percentage,
        external_power: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_full_endpoints() {
        assert_eq!(status_from_volts(2.7).percentage, 0.0);
        let full = status_from_volts(3.3);
        assert!((full.percentage - 100.0).abs() < 1e-3);
        assert!(!full.external_power);
    }

    #[test]
    fn clamped_outside_range() {
        assert_eq!(status_from_volts(2.0).percentage, 0.0);
        assert_eq!(status_from_volts(4.4).percentage, 100.0);
    }

    #[test]
    fn monotonic_over_battery_range() {
        let mut last = -1.0;
        for step in 0..=60 {
            let volts = 2.7 + step as f32 * 0.01;
            let pct = status_from_volts(volts).percentage;
            assert!(pct >= last, "percentage dropped at {volts} V");
            last = pct;
        }
    }

    #[test]
    fn external_power_above_threshold() {
        for volts in [4.51, 5.0, 9.9] {
            let status = status_from_volts(volts);
            assert!(status.external_power, "{volts} V should read as external");
        }
        assert!(!status_from_volts(4.5).external_power);
    }

    #[test]
    fn raw_conversion_uses_divider() {
        // Full-scale counts map to 3.3 V at the pin, 9.9 V at VSYS.
        let v = volts_from_raw(4095);
        assert!((v - 9.897).abs() < 0.01);
        assert_eq!(volts_from_raw(0), 0.0);
    }
}
