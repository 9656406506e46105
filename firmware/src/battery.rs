//! Battery monitor: shielded VSYS measurement.
//!
//! GPIO29 doubles as the radio SPI clock on the Pico W, so the pad is
//! parked high-impedance for the duration of the measurement and the
//! saved configuration written back on every exit path; a
//! misconfigured pad destabilizes the radio sharing the rail.

use defmt::{info, warn};
use embassy_rp::adc::{Adc, Async, Channel};
use embassy_rp::gpio::Pull;
use embassy_rp::pac;
use embassy_rp::peripherals::PIN_29;
use embassy_time::{Duration, Timer};
use pico_weather_core::battery::{status_from_volts, volts_from_raw};
use pico_weather_core::model::BatteryStatus;

/// VSYS sense line, ADC channel 3.
const VSYS_GPIO: usize = 29;

const SAMPLE_COUNT: usize = 9;
const SAMPLE_DELAY_MS: u64 = 5;

/// Saves a pad's electrical configuration and parks it with no pulls,
/// output disabled and input disabled. Dropping the guard writes the
/// saved configuration back, whatever happened in between.
struct PadGuard {
    gpio: usize,
    saved: pac::pads::regs::GpioCtrl,
}

impl PadGuard {
    fn isolate(gpio: usize) -> Self {
        let pad = pac::PADS_BANK0.gpio(gpio);
        let saved = pad.read();
        pad.write(|w| {
            w.set_od(true);
            w.set_ie(false);
            w.set_pue(false);
            w.set_pde(false);
        });
        Self { gpio, saved }
    }
}

impl Drop for PadGuard {
    fn drop(&mut self) {
        pac::PADS_BANK0.gpio(self.gpio).write_value(self.saved);
    }
}

pub struct BatteryMonitor {
    adc: Adc<'static, Async>,
}

impl BatteryMonitor {
    pub fn new(adc: Adc<'static, Async>) -> Self {
        Self { adc }
    }

    /// Measure VSYS and derive the charge state, computed fresh on
    /// every call. Median of nine samples to reject noise; a failed
    /// conversion counts as zero volts.
    pub async fn read_status(&mut self) -> BatteryStatus {
        // Guard before channel so it drops after it: the restore must
        // be the final word on the pad configuration.
        let _pad = PadGuard::isolate(VSYS_GPIO);
        // The pin itself belongs to the radio SPI; measuring VSYS is
        // the one sanctioned reason to reach past that, under the pad
        // guard.
        let vsys_pin = unsafe { PIN_29::steal() };
        let mut channel = Channel::new_pin(vsys_pin, Pull::None);

        // Let the divider settle after the pad switch.
        Timer::after(Duration::from_micros(100)).await;

        let mut samples = [0u16; SAMPLE_COUNT];
        let mut valid = 0;
        for slot in samples.iter_mut() {
            if let Ok(value) = self.adc.read(&mut channel).await {
                *slot = value;
                valid += 1;
            }
            Timer::after(Duration::from_millis(SAMPLE_DELAY_MS)).await;
        }

        if valid == 0 {
            warn!("no valid ADC samples, reporting empty battery");
            return status_from_volts(0.0);
        }

        samples[..valid].sort_unstable();
        let voltage = volts_from_raw(samples[valid / 2]);
        let status = status_from_volts(voltage);
        if status.external_power {
            info!("external power, VSYS {}V", status.voltage);
        } else {
            info!("battery {}V, {}%", status.voltage, status.percentage);
        }
        status
    }
}
