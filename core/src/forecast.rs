//! Forecast payload parsing.
//!
//! The remote endpoint returns a met.no-shaped document with a long
//! `properties.timeseries` array; only the leading entries are kept.
//! Any shape problem degrades to an empty forecast — the caller keeps
//! whatever data it already holds.

use serde::de::{Deserializer, IgnoredAny, SeqAccess, Visitor};
use serde::Deserialize;

use crate::model::{Forecast, ForecastEntry, MAX_FORECAST_ENTRIES};

#[derive(Deserialize)]
struct ForecastDocument<'a> {
    #[serde(borrow)]
    properties: Properties<'a>,
}

#[derive(Deserialize)]
struct Properties<'a> {
    #[serde(borrow, deserialize_with = "take_leading_entries")]
    timeseries: heapless::Vec<RawEntry<'a>, MAX_FORECAST_ENTRIES>,
}

#[derive(Deserialize)]
struct RawEntry<'a> {
    time: &'a str,
    data: RawData,
}

#[derive(Deserialize)]
struct RawData {
    instant: RawInstant,
    #[serde(default)]
    next_1_hours: Option<RawNextHours>,
}

#[derive(Deserialize)]
struct RawInstant {
    details: RawInstantDetails,
}

#[derive(Deserialize)]
struct RawInstantDetails {
    air_temperature: f32,
    relative_humidity: f32,
}

#[derive(Deserialize)]
struct RawNextHours {
    details: RawNextHoursDetails,
}

#[derive(Deserialize)]
struct RawNextHoursDetails {
    precipitation_amount: f32,
}

/// Deserialize the first [`MAX_FORECAST_ENTRIES`] entries of the
/// timeseries and drain the rest. Real responses carry several days of
/// hourly data; buffering all of it has no use here.
fn take_leading_entries<'de, D>(
    deserializer: D,
) -> Result<heapless::Vec<RawEntry<'de>, MAX_FORECAST_ENTRIES>, D::Error>
where
    D: Deserializer<'de>,
{
    struct LeadingEntries;

    impl<'de> Visitor<'de> for LeadingEntries {
        type Value = heapless::Vec<RawEntry<'de>, MAX_FORECAST_ENTRIES>;

        fn expecting(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
            f.write_str("a timeseries array")
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut entries = heapless::Vec::new();
            while !entries.is_full() {
                match seq.next_element::<RawEntry>()? {
                    Some(entry) => {
                        let _ = entries.push(entry);
                    }
                    None => return Ok(entries),
                }
            }
            // Consume the remainder so the deserializer ends cleanly.
            while seq.next_element::<IgnoredAny>()?.is_some() {}
            Ok(entries)
        }
    }

    deserializer.deserialize_seq(LeadingEntries)
}

/// Parse a forecast response body into up to three entries.
///
/// Entries with an unparseable timestamp are dropped; a missing
/// `next_1_hours` block reads as 0.0 mm. A malformed document yields an
/// empty forecast.
pub fn parse_forecast(body: &[u8]) -> Forecast {
    let Ok((document, _)) = serde_json_core::from_slice::<ForecastDocument>(body) else {
        return Forecast::new();
    };
    let mut forecast = Forecast::new();
    for raw in &document.properties.timeseries {
        if let Some(entry) = entry_from_raw(raw) {
            let _ = forecast.push(entry);
        }
    }
    forecast
}

fn entry_from_raw(raw: &RawEntry) -> Option<ForecastEntry> {
    let hour_of_day = iso_hour(raw.time)?;
    let mut source_timestamp = heapless::String::new();
    source_timestamp.push_str(raw.time).ok()?;
    Some(ForecastEntry {
        hour_of_day,
        temperature: raw.data.instant.details.air_temperature,
        humidity: raw.data.instant.details.relative_humidity,
        precipitation_mm: raw
            .data
            .next_1_hours
            .as_ref()
            .map(|n| n.details.precipitation_amount)
            .unwrap_or(0.0),
        source_timestamp,
    })
}

/// Extract the hour field from an ISO-8601 timestamp such as
/// `2024-01-01T15:00:00Z` by splitting on the structural separators
/// rather than assuming fixed byte offsets.
pub fn iso_hour(timestamp: &str) -> Option<u8> {
    let (date, clock) = timestamp.split_once('T')?;
    if date.len() != 10 {
        return None;
    }
    let hour: u8 = clock.split(':').next()?.parse().ok()?;
    (hour < 24).then_some(hour)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Trimmed met.no compact response: four hourly entries, assorted
    // metadata the parser must skip, and no next_1_hours on the last.
    const SAMPLE: &[u8] = br#"{
        "type": "Feature",
        "geometry": {"type": "Point", "coordinates": [24.75, 59.43, 9]},
        "properties": {
            "meta": {"updated_at": "2024-01-01T14:38:00Z", "units": {"air_temperature": "celsius"}},
            "timeseries": [
                {"time": "2024-01-01T15:00:00Z", "data": {
                    "instant": {"details": {"air_temperature": -3.2, "relative_humidity": 87.0, "wind_speed": 4.1}},
                    "next_1_hours": {"summary": {"symbol_code": "snow"}, "details": {"precipitation_amount": 0.4}}}},
                {"time": "2024-01-01T16:00:00Z", "data": {
                    "instant": {"details": {"air_temperature": -3.5, "relative_humidity": 88.5}},
                    "next_1_hours": {"summary": {"symbol_code": "cloudy"}, "details": {"precipitation_amount": 0.0}}}},
                {"time": "2024-01-01T17:00:00Z", "data": {
                    "instant": {"details": {"air_temperature": -4.0, "relative_humidity": 90.0}},
                    "next_1_hours": {"summary": {"symbol_code": "cloudy"}, "details": {"precipitation_amount": 0.1}}}},
                {"time": "2024-01-01T18:00:00Z", "data": {
                    "instant": {"details": {"air_temperature": -4.4, "relative_humidity": 91.0}}}}
            ]
        }
    }"#;

    #[test]
    fn parses_leading_three_entries() {
        let forecast = parse_forecast(SAMPLE);
        assert_eq!(forecast.len(), 3);
        assert_eq!(forecast[0].hour_of_day, 15);
        assert_eq!(forecast[0].temperature, -3.2);
        assert_eq!(forecast[0].humidity, 87.0);
        assert_eq!(forecast[0].precipitation_mm, 0.4);
        assert_eq!(forecast[2].hour_of_day, 17);
        assert_eq!(forecast[0].source_timestamp, "2024-01-01T15:00:00Z");
    }

    #[test]
    fn shorter_series_keeps_what_exists() {
        let body = br#"{"properties": {"timeseries": [
            {"time": "2024-06-01T08:00:00Z", "data": {
                "instant": {"details": {"air_temperature": 14.5, "relative_humidity": 60.0}}}}
        ]}}"#;
        let forecast = parse_forecast(body);
        assert_eq!(forecast.len(), 1);
        assert_eq!(forecast[0].precipitation_mm, 0.0);
    }

    #[test]
    fn malformed_body_is_empty_sentinel() {
        assert!(parse_forecast(b"").is_empty());
        assert!(parse_forecast(b"<html>502</html>").is_empty());
        assert!(parse_forecast(br#"{"properties": {}}"#).is_empty());
    }

    #[test]
    fn hour_extraction_is_structural() {
        assert_eq!(iso_hour("2024-01-01T15:00:00Z"), Some(15));
        assert_eq!(iso_hour("2024-01-01T05:30:00+02:00"), Some(5));
        assert_eq!(iso_hour("2024-01-01"), None);
        assert_eq!(iso_hour("garbageT15:00:00Z"), None);
        assert_eq!(iso_hour("2024-01-01T99:00:00Z"), None);
    }
}
