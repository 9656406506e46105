//! The foreground loop.
//!
//! One task owns every component and drives the whole device: startup
//! (radio up, time fetch, RTC warm-start, first forecast, first sensor
//! read), then measure / maybe-refresh / render / sleep forever. There
//! is no shared mutable state and nothing else competes for the
//! peripherals.

use defmt::{info, warn};
use display_interface::DisplayError;
use embassy_futures::select::{Either, select};
use embassy_rp::gpio::Input;
use embassy_rp::peripherals::RTC;
use embassy_rp::rtc::{DateTime, DayOfWeek, Rtc};
use embassy_time::{Duration, Timer};
use pico_weather_core::clock::{RefreshClock, minutes_since_midnight};
use pico_weather_core::model::{CalendarTime, Forecast, SensorReading};
use pico_weather_core::scene::SceneIndex;

use crate::FIRMWARE_VERSION;
use crate::battery::BatteryMonitor;
use crate::config::{REFRESH_INTERVAL_MINUTES, SCENE_DURATION_SECS};
use crate::connectivity::Connectivity;
use crate::display::Screen;
use crate::fetch::Fetcher;
use crate::scenes::{self, Frame, StartupProgress};
use crate::sensor::Dht22Reader;

pub struct Scheduler {
    connectivity: Connectivity,
    fetcher: Fetcher,
    sensor: Dht22Reader,
    battery: BatteryMonitor,
    screen: Screen,
    rtc: Rtc<'static, RTC>,
    stop_key: Input<'static>,
    forecast: Forecast,
    home: SensorReading,
    refresh: RefreshClock,
    scene: SceneIndex,
}

impl Scheduler {
    pub fn new(
        connectivity: Connectivity,
        fetcher: Fetcher,
        sensor: Dht22Reader,
        battery: BatteryMonitor,
        screen: Screen,
        rtc: Rtc<'static, RTC>,
        stop_key: Input<'static>,
    ) -> Self {
        Self {
            connectivity,
            fetcher,
            sensor,
            battery,
            screen,
            rtc,
            stop_key,
            forecast: Forecast::new(),
            home: SensorReading::INVALID,
            refresh: RefreshClock::new(),
            scene: SceneIndex::new(),
        }
    }

    pub async fn run(mut self) -> ! {
        self.startup().await;
        loop {
            if self.iterate().await.is_err() {
                warn!("render failed, showing error screen");
                self.screen.clear_buffer();
                let _ = scenes::draw_error(&mut self.screen);
                let _ = self.screen.flush();
            }

            let pause = Timer::after(Duration::from_secs(SCENE_DURATION_SECS));
            let outcome = select(pause, self.stop_key.wait_for_falling_edge()).await;
            if let Either::Second(()) = outcome {
                self.shutdown().await;
            }
        }
    }

    /// Staged startup with progress on screen between stages. Every
    /// stage may fail; the loop starts regardless and retries what it
    /// can on its own cadence.
    async fn startup(&mut self) {
        let mut progress = StartupProgress::default();
        self.show_startup(&progress);

        let connected = self.connectivity.activate().await;
        progress.connectivity = Some(connected);
        self.show_startup(&progress);

        let time = self.fetcher.fetch_time(&mut self.connectivity).await;
        let time_ok = time != CalendarTime::EPOCH;
        if time_ok {
            if self.rtc.set_datetime(rtc_datetime(&time)).is_err() {
                warn!("RTC rejected the fetched time");
            } else {
                info!(
                    "RTC set to {}-{:02}-{:02} {:02}:{:02}",
                    time.year, time.month, time.day, time.hour, time.minute
                );
            }
        } else {
            warn!("time fetch failed, RTC starts from the epoch");
            let _ = self.rtc.set_datetime(rtc_datetime(&CalendarTime::EPOCH));
        }
        progress.clock = Some(time_ok);
        self.show_startup(&progress);

        self.forecast = self.fetcher.fetch_forecast(&mut self.connectivity).await;
        if !self.forecast.is_empty() {
            self.refresh.mark(self.now_minutes());
        }

        self.home = self.sensor.read().await;
        progress.sensor = Some(self.home.valid);
        self.show_startup(&progress);
    }

    fn show_startup(&mut self, progress: &StartupProgress) {
        self.screen.clear_buffer();
        let _ = scenes::draw_startup(&mut self.screen, FIRMWARE_VERSION, progress);
        let _ = self.screen.flush();
    }

    /// One loop pass: measure, refresh if due, render the current scene
    /// and advance the rotation.
    async fn iterate(&mut self) -> Result<(), DisplayError> {
        let reading = self.sensor.read().await;
        if reading.valid {
            self.home = reading;
        } else {
            warn!("sensor read invalid, keeping previous values");
        }

        let now = self.now_minutes();
        if self.refresh.is_due(now, REFRESH_INTERVAL_MINUTES) {
            let fresh = self.fetcher.fetch_forecast(&mut self.connectivity).await;
            if fresh.is_empty() {
                warn!("refresh produced no entries, keeping stale forecast");
            } else {
                self.forecast = fresh;
                self.refresh.mark(now);
            }
        }

        let frame = Frame {
            time: self.device_time(),
            home: self.home,
            forecast: &self.forecast,
            battery: self.battery.read_status().await,
        };

        self.screen.clear_buffer();
        match self.scene.current() {
            0 => scenes::draw_current(&mut self.screen, &frame)?,
            _ => scenes::draw_forecast(&mut self.screen, &frame)?,
        }
        self.scene.advance();
        self.screen.flush()
    }

    /// Operator stop: radio down, final screen, halt.
    async fn shutdown(&mut self) -> ! {
        info!("stop key pressed, shutting down");
        self.connectivity.deactivate().await;
        self.screen.clear_buffer();
        let _ = scenes::draw_stopped(&mut self.screen);
        let _ = self.screen.flush();
        loop {
            cortex_m::asm::wfi();
        }
    }

    /// Current device-local time from the RTC, epoch sentinel if the
    /// RTC is not running.
    fn device_time(&self) -> CalendarTime {
        match self.rtc.now() {
            Ok(dt) => CalendarTime {
                year: dt.year,
                month: dt.month,
                day: dt.day,
                weekday: weekday_from(dt.day_of_week),
                hour: dt.hour,
                minute: dt.minute,
                second: dt.second,
            },
            Err(_) => CalendarTime::EPOCH,
        }
    }

    fn now_minutes(&self) -> u16 {
        minutes_since_midnight(&self.device_time())
    }
}

/// Monday = 0 weekday index for an RTC day.
fn weekday_from(day: DayOfWeek) -> u8 {
    match day {
        DayOfWeek::Monday => 0,
        DayOfWeek::Tuesday => 1,
        DayOfWeek::Wednesday => 2,
        DayOfWeek::Thursday => 3,
        DayOfWeek::Friday => 4,
        DayOfWeek::Saturday => 5,
        DayOfWeek::Sunday => 6,
    }
}

fn day_of_week_from(weekday: u8) -> DayOfWeek {
    match weekday {
        0 => DayOfWeek::Monday,
        1 => DayOfWeek::Tuesday,
        2 => DayOfWeek::Wednesday,
        3 => DayOfWeek::Thursday,
        4 => DayOfWeek::Friday,
        5 => DayOfWeek::Saturday,
        _ => DayOfWeek::Sunday,
    }
}

fn rtc_datetime(t: &CalendarTime) -> DateTime {
    DateTime {
        year: t.year,
        month: t.month,
        day: t.day,
        day_of_week: day_of_week_from(t.weekday),
        hour: t.hour,
        minute: t.minute,
        second: t.second,
    }
}
