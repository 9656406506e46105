//! Screen rendering.
//!
//! Each function lays out one full screen into a draw target; the
//! scheduler clears the buffer, picks a scene and flushes. All layout
//! arithmetic lives in the core crate where it is tested; this module
//! only places pixels.

use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle, Rectangle};
use embedded_graphics::text::Text;
use pico_weather_core::model::{BatteryStatus, CalendarTime, ForecastEntry, SensorReading};
use pico_weather_core::scene::{
    battery_fill_pixels, centered_x, display_hour, format_date_line, format_hour, format_value,
    hour_offset,
};

/// Everything one iteration puts on screen.
pub struct Frame<'a> {
    pub time: CalendarTime,
    pub home: SensorReading,
    pub forecast: &'a [ForecastEntry],
    pub battery: BatteryStatus,
}

/// Thermometer pictogram separating the indoor and outdoor rows,
/// as (x, y) pixels.
const GLYPH_PIXELS: [(i32, i32); 12] = [
    (1, 42),
    (1, 41),
    (2, 41),
    (2, 40),
    (3, 41),
    (3, 40),
    (4, 42),
    (4, 41),
    (5, 42),
    (5, 41),
    (6, 41),
    (6, 40),
];

fn text_style() -> MonoTextStyle<'static, BinaryColor> {
    MonoTextStyle::new(&FONT_6X10, BinaryColor::On)
}

fn hline<D>(target: &mut D, y: i32) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    Line::new(Point::new(0, y), Point::new(127, y))
        .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
        .draw(target)
}

fn draw_glyph<D>(target: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    target.draw_iter(
        GLYPH_PIXELS
            .iter()
            .map(|&(x, y)| Pixel(Point::new(x, y), BinaryColor::On)),
    )
}

/// Current conditions: date header, indoor reading, pictogram, the
/// freshest outdoor entry and the battery indicator on the right.
pub fn draw_current<D>(target: &mut D, frame: &Frame) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let style = text_style();

    let header = format_date_line(&frame.time);
    Text::new(&header, Point::new(centered_x(header.len()), 8), style).draw(target)?;
    hline(target, 11)?;

    Text::new("Home", Point::new(2, 26), style).draw(target)?;
    let (home_temp, home_hum) = if frame.home.valid {
        (
            format_value(frame.home.temperature, 'C'),
            format_value(frame.home.humidity, '%'),
        )
    } else {
        (format_value(0.0, 'C'), format_value(0.0, '%'))
    };
    Text::new(&home_temp, Point::new(36, 26), style).draw(target)?;
    Text::new(&home_hum, Point::new(36, 38), style).draw(target)?;

    draw_glyph(target)?;

    Text::new("Out", Point::new(8, 50), style).draw(target)?;
    let (out_temp, out_hum) = match frame.forecast.first() {
        Some(entry) => (
            format_value(entry.temperature, 'C'),
            format_value(entry.humidity, '%'),
        ),
        None => (format_value(0.0, 'C'), format_value(0.0, '%')),
    };
    Text::new(&out_temp, Point::new(36, 50), style).draw(target)?;
    Text::new(&out_hum, Point::new(36, 62), style).draw(target)?;

    draw_battery_indicator(target, &frame.battery)
}

/// Battery pictogram on the right edge: double-stroked well, nub on
/// top, and either a charge fill or the letters of "WIRE" when running
/// on external power.
fn draw_battery_indicator<D>(target: &mut D, battery: &BatteryStatus) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let stroke = PrimitiveStyle::with_stroke(BinaryColor::On, 1);
    let fill = PrimitiveStyle::with_fill(BinaryColor::On);

    Rectangle::new(Point::new(105, 20), Size::new(18, 40))
        .into_styled(stroke)
        .draw(target)?;
    Rectangle::new(Point::new(104, 19), Size::new(20, 42))
        .into_styled(stroke)
        .draw(target)?;
    Rectangle::new(Point::new(108, 16), Size::new(12, 4))
        .into_styled(fill)
        .draw(target)?;

    if battery.external_power {
        let style = text_style();
        for (i, letter) in ["W", "I", "R", "E"].iter().enumerate() {
            Text::new(letter, Point::new(111, 28 + i as i32 * 8), style).draw(target)?;
        }
    } else {
        let lit = battery_fill_pixels(battery.percentage);
        if lit > 0 {
            Rectangle::new(Point::new(107, 22 + (36 - lit) as i32), Size::new(14, lit))
                .into_styled(fill)
                .draw(target)?;
        }
    }
    Ok(())
}

/// Forecast table: three columns of hour, temperature, humidity and
/// precipitation, hours shifted into device-local time by the first
/// entry.
pub fn draw_forecast<D>(target: &mut D, frame: &Frame) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let style = text_style();
    let stroke = PrimitiveStyle::with_stroke(BinaryColor::On, 1);

    let title = "Forecast";
    Text::new(title, Point::new(centered_x(title.len()), 8), style).draw(target)?;
    hline(target, 11)?;

    for x in [42, 85] {
        Line::new(Point::new(x, 14), Point::new(x, 63))
            .into_styled(stroke)
            .draw(target)?;
    }

    // An empty forecast leaves the grid blank; missing trailing entries
    // leave their columns blank.
    let Some(first) = frame.forecast.first() else {
        return Ok(());
    };
    let offset = hour_offset(frame.time.hour, first.hour_of_day);

    for (col, entry) in frame.forecast.iter().enumerate().take(3) {
        let x = 2 + col as i32 * 43;
        let hour = format_hour(display_hour(entry.hour_of_day, offset));
        Text::new(&hour, Point::new(x, 24), style).draw(target)?;
        let temp = format_value(entry.temperature, 'C');
        Text::new(&temp, Point::new(x, 37), style).draw(target)?;
        let hum = format_value(entry.humidity, '%');
        Text::new(&hum, Point::new(x, 50), style).draw(target)?;
        let precip = format_value(entry.precipitation_mm, 'm');
        Text::new(&precip, Point::new(x, 63), style).draw(target)?;
    }
    Ok(())
}

/// Startup progress: which stages already ran and how they went.
#[derive(Default)]
pub struct StartupProgress {
    pub connectivity: Option<bool>,
    pub clock: Option<bool>,
    pub sensor: Option<bool>,
}

pub fn draw_startup<D>(
    target: &mut D,
    version: &str,
    progress: &StartupProgress,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let style = text_style();

    let title = "pico-weather";
    Text::new(title, Point::new(centered_x(title.len()), 10), style).draw(target)?;
    Text::new(version, Point::new(centered_x(version.len()), 22), style).draw(target)?;

    let rows = [
        ("wifi", progress.connectivity),
        ("clock", progress.clock),
        ("sensor", progress.sensor),
    ];
    for (i, (label, outcome)) in rows.iter().enumerate() {
        let y = 36 + i as i32 * 12;
        Text::new(label, Point::new(8, y), style).draw(target)?;
        let mark = match outcome {
            None => "...",
            Some(true) => "ok",
            Some(false) => "fail",
        };
        Text::new(mark, Point::new(60, y), style).draw(target)?;
    }
    Ok(())
}

/// Shown when an iteration failed to render or flush; the loop keeps
/// going and the next pass overwrites this.
pub fn draw_error<D>(target: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let style = text_style();
    let line = "display error";
    Text::new(line, Point::new(centered_x(line.len()), 32), style).draw(target)
}

/// Final screen after an operator stop.
pub fn draw_stopped<D>(target: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let style = text_style();
    let line = "stopped";
    Text::new(line, Point::new(centered_x(line.len()), 32), style).draw(target)
}
