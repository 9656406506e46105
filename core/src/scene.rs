//! Scene rotation and the layout math behind the renderer.
//!
//! The firmware's draw functions stay thin; the numbers they place on
//! screen (centering, bar heights, adjusted hours, formatted strings)
//! are computed here where they can be tested.

use core::fmt::Write;

use heapless::String;

use crate::model::CalendarTime;

/// Number of rotating scenes: current conditions and forecast.
pub const SCENE_COUNT: u8 = 2;

/// Display width in pixels.
pub const DISPLAY_WIDTH: i32 = 128;
/// Character cell width of the 6x10 font used throughout.
pub const CHAR_WIDTH: i32 = 6;
/// Height of the battery fill well in pixels.
pub const BATTERY_BAR_PIXELS: u32 = 36;

/// Counter selecting the scene drawn this iteration. Starts at 0 and
/// advances exactly once per loop pass, wrapping at [`SCENE_COUNT`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SceneIndex(u8);

impl SceneIndex {
    pub const fn new() -> Self {
        Self(0)
    }

    pub fn current(&self) -> u8 {
        self.0
    }

    pub fn advance(&mut self) {
        self.0 = (self.0 + 1) % SCENE_COUNT;
    }
}

/// Hours to add to a forecast entry's embedded hour so it reads in
/// device-local time, derived from the first entry: the device shows
/// hour 17 while the entry says 15, so every entry shifts by 2.
pub fn hour_offset(device_hour: u8, first_entry_hour: u8) -> u8 {
    (24 + device_hour - first_entry_hour) % 24
}

/// Apply [`hour_offset`] to an entry hour, wrapped into 0..24.
pub fn display_hour(entry_hour: u8, offset: u8) -> u8 {
    (entry_hour + offset) % 24
}

/// X coordinate that centers `len` characters on the display.
pub fn centered_x(len: usize) -> i32 {
    ((DISPLAY_WIDTH - len as i32 * CHAR_WIDTH) / 2).max(0)
}

/// Lit height of the battery fill bar for a charge percentage.
pub fn battery_fill_pixels(percentage: f32) -> u32 {
    (percentage.clamp(0.0, 100.0) / 100.0 * BATTERY_BAR_PIXELS as f32) as u32
}

/// `dd.mm.yy hh:mm` header line.
pub fn format_date_line(t: &CalendarTime) -> String<20> {
    let mut line = String::new();
    let _ = write!(
        line,
        "{:02}.{:02}.{:02} {:02}:{:02}",
        t.day,
        t.month,
        t.year % 100,
        t.hour,
        t.minute
    );
    line
}

/// One decimal place with a unit suffix, e.g. `21.5 C`.
pub fn format_value(value: f32, unit: char) -> String<16> {
    let mut text = String::new();
    let _ = write!(text, "{value:.1} {unit}");
    text
}

/// `hh:00` column header for a forecast hour.
pub fn format_hour(hour: u8) -> String<8> {
    let mut text = String::new();
    let _ = write!(text, "{hour:02}:00");
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_index_cycles_without_skips() {
        let mut index = SceneIndex::new();
        let mut seen = [0u8; 6];
        for slot in seen.iter_mut() {
            *slot = index.current();
            index.advance();
        }
        assert_eq!(seen, [0, 1, 0, 1, 0, 1]);
    }

    #[test]
    fn hour_offset_matches_device_clock() {
        // Device shows 17, first entry embeds 15: offset 2, entry 15
        // displays as 17.
        let offset = hour_offset(17, 15);
        assert_eq!(offset, 2);
        assert_eq!(display_hour(15, offset), 17);
        assert_eq!(display_hour(23, offset), 1);
    }

    #[test]
    fn hour_offset_wraps_midnight() {
        let offset = hour_offset(1, 23);
        assert_eq!(offset, 2);
        assert_eq!(display_hour(23, offset), 1);
    }

    #[test]
    fn battery_fill_scales_and_clamps() {
        assert_eq!(battery_fill_pixels(0.0), 0);
        assert_eq!(battery_fill_pixels(50.0), 18);
        assert_eq!(battery_fill_pixels(100.0), 36);
        assert_eq!(battery_fill_pixels(-20.0), 0);
        assert_eq!(battery_fill_pixels(250.0), 36);
    }

    #[test]
    fn header_is_centered() {
        // 14 characters at 6 px: (128 - 84) / 2 = 22.
        assert_eq!(centered_x(14), 22);
        assert_eq!(centered_x(40), 0);
    }

    #[test]
    fn date_line_format() {
        let t = CalendarTime {
            year: 2023,
            month: 11,
            day: 15,
            weekday: 2,
            hour: 1,
            minute: 13,
            second: 20,
        };
        assert_eq!(format_date_line(&t), "15.11.23 01:13");
    }

    #[test]
    fn value_and_hour_formats() {
        assert_eq!(format_value(21.52, 'C'), "21.5 C");
        assert_eq!(format_value(-4.0, 'C'), "-4.0 C");
        assert_eq!(format_hour(5), "05:00");
    }
}
