//! Remote time payload parsing, calendar conversion and the refresh
//! cadence bookkeeping.

use serde::Deserialize;
use time::OffsetDateTime;

use crate::model::CalendarTime;

/// Minutes in a day, for wrap-aware elapsed computation.
const MINUTES_PER_DAY: u16 = 24 * 60;

/// Shape of the remote time endpoint body. Unknown fields are ignored.
#[derive(Deserialize)]
struct TimePayload {
    unixtime: i64,
    raw_offset: i32,
    dst_offset: i32,
}

/// Parse a time endpoint response into a local calendar tuple.
///
/// The standard and daylight offsets are added to the Unix timestamp
/// and the sum converted to a calendar; no further correction is
/// applied. Any transport- or shape-level problem degrades to
/// [`CalendarTime::EPOCH`].
pub fn parse_time(body: &[u8]) -> CalendarTime {
    match serde_json_core::from_slice::<TimePayload>(body) {
        Ok((payload, _)) => {
            local_calendar(payload.unixtime, payload.raw_offset, payload.dst_offset)
        }
        Err(_) => CalendarTime::EPOCH,
    }
}

/// Convert a Unix timestamp plus zone offsets into a calendar tuple.
pub fn local_calendar(unixtime: i64, raw_offset: i32, dst_offset: i32) -> CalendarTime {
    let local = unixtime + i64::from(raw_offset) + i64::from(dst_offset);
    let Ok(dt) = OffsetDateTime::from_unix_timestamp(local) else {
        return CalendarTime::EPOCH;
    };
    let Ok(year) = u16::try_from(dt.year()) else {
        return CalendarTime::EPOCH;
    };
    CalendarTime {
        year,
        month: dt.month() as u8,
        day: dt.day(),
        weekday: dt.weekday().number_days_from_monday(),
        hour: dt.hour(),
        minute: dt.minute(),
        second: dt.second(),
    }
}

/// Minutes since midnight for a calendar tuple.
pub fn minutes_since_midnight(t: &CalendarTime) -> u16 {
    u16::from(t.hour) * 60 + u16::from(t.minute)
}

/// Tracks when the forecast was last successfully refreshed, as a
/// minutes-since-midnight stamp. Only a successful refresh moves the
/// stamp; failures leave it alone so the next cycle retries.
#[derive(Debug, Clone, Copy, Default)]
pub struct RefreshClock {
    last_refresh: Option<u16>,
}

impl RefreshClock {
    pub const fn new() -> Self {
        Self { last_refresh: None }
    }

    /// Record a successful refresh at `now` (minutes since midnight).
    pub fn mark(&mut self, now: u16) {
        self.last_refresh = Some(now % MINUTES_PER_DAY);
    }

    /// Whether a refresh is due. Always true before the first success.
    pub fn is_due(&self, now: u16, interval_minutes: u16) -> bool {
        match self.last_refresh {
            None => true,
            Some(last) => elapsed_minutes(last, now % MINUTES_PER_DAY) >= interval_minutes,
        }
    }
}

/// Elapsed minutes from `last` to `now` on a 24 h wrapping clock.
fn elapsed_minutes(last: u16, now: u16) -> u16 {
    (now + MINUTES_PER_DAY - last) % MINUTES_PER_DAY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calendar_from_offset_timestamp() {
        // 1700000000 + 7200 + 3600 = 1700010800 = 2023-11-15 01:13:20,
        // a Wednesday.
        let t = local_calendar(1_700_000_000, 7200, 3600);
        assert_eq!(
            t,
            CalendarTime {
                year: 2023,
                month: 11,
                day: 15,
                weekday: 2,
                hour: 1,
                minute: 13,
                second: 20,
            }
        );
    }

    #[test]
    fn parse_time_happy_path() {
        let body = br#"{"unixtime":1700000000,"raw_offset":7200,"dst_offset":3600}"#;
        let t = parse_time(body);
        assert_eq!(t.year, 2023);
        assert_eq!(t.hour, 1);
    }

    #[test]
    fn parse_time_degrades_to_epoch() {
        assert_eq!(parse_time(b"not json"), CalendarTime::EPOCH);
        assert_eq!(parse_time(br#"{"raw_offset":0}"#), CalendarTime::EPOCH);
        assert_eq!(parse_time(b""), CalendarTime::EPOCH);
    }

    #[test]
    fn epoch_sentinel_keeps_weekday_zero() {
        assert_eq!(CalendarTime::EPOCH.weekday, 0);
        assert_eq!(local_calendar(0, 0, 0).weekday, 3); // the real Thursday
    }

    #[test]
    fn refresh_due_on_fresh_boot() {
        let clock = RefreshClock::new();
        assert!(clock.is_due(0, 30));
        assert!(clock.is_due(1439, 30));
    }

    #[test]
    fn refresh_interval_elapses() {
        let mut clock = RefreshClock::new();
        clock.mark(100);
        assert!(!clock.is_due(100, 30));
        assert!(!clock.is_due(129, 30));
        assert!(clock.is_due(130, 30));
    }

    #[test]
    fn refresh_elapsed_wraps_midnight() {
        let mut clock = RefreshClock::new();
        clock.mark(1430); // 23:50
        assert!(!clock.is_due(10, 30)); // 00:10, 20 minutes later
        assert!(clock.is_due(20, 30)); // 00:20, exactly 30
    }

    #[test]
    fn minutes_since_midnight_math() {
        let mut t = CalendarTime::EPOCH;
        t.hour = 13;
        t.minute = 37;
        assert_eq!(minutes_since_midnight(&t), 817);
    }
}
