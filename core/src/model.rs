//! Data model shared between the parsing/math layers and the firmware.

use heapless::{String, Vec};

/// Maximum number of forecast entries kept from a remote refresh.
pub const MAX_FORECAST_ENTRIES: usize = 3;

/// Forecast entries held by the scheduler between refreshes.
pub type Forecast = Vec<ForecastEntry, MAX_FORECAST_ENTRIES>;

/// One local temperature/humidity measurement.
///
/// `valid = false` means the caller should fall back to its previous
/// good values (or zeros before the first good read).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorReading {
    pub temperature: f32,
    pub humidity: f32,
    pub valid: bool,
}

impl SensorReading {
    /// The degraded result: both channels zero, not to be displayed as
    /// a real measurement.
    pub const INVALID: Self = Self {
        temperature: 0.0,
        humidity: 0.0,
        valid: false,
    };

    /// A DHT22 never legitimately reports 0.0 on both channels at once;
    /// such a reading is treated as a misread and retried.
    pub fn is_plausible(temperature: f32, humidity: f32) -> bool {
        temperature != 0.0 && humidity != 0.0
    }
}

/// One hour of remote forecast data.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ForecastEntry {
    /// Hour of day embedded in the source timestamp, 0..=23.
    pub hour_of_day: u8,
    pub temperature: f32,
    pub humidity: f32,
    /// Precipitation expected over the following hour, millimetres.
    pub precipitation_mm: f32,
    /// Timestamp string as returned by the remote source.
    pub source_timestamp: String<32>,
}

/// Radio lifecycle, owned by the connectivity manager. The scheduler
/// only ever observes the boolean outcome of an activation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectivityState {
    Inactive,
    Connecting,
    Connected,
    Failed,
}

/// Battery state derived from one VSYS measurement. Computed fresh on
/// every render, never cached.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BatteryStatus {
    pub voltage: f32,
    /// Linear 2.7 V..3.3 V mapping, clamped to 0..=100. Not meaningful
    /// when `external_power` is set.
    pub percentage: f32,
    /// True when VSYS shows the device is powered/charging externally.
    pub external_power: bool,
}

/// Calendar tuple in device-local time. `weekday` counts from Monday = 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalendarTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub weekday: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl CalendarTime {
    /// Sentinel returned when the remote time fetch fails. Weekday stays
    /// 0 by convention; this is a placeholder, not calendar truth.
    pub const EPOCH: Self = Self {
        year: 1970,
        month: 1,
        day: 1,
        weekday: 0,
        hour: 0,
        minute: 0,
        second: 0,
    };
}
