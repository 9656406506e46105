//! Local DHT22 sensor reader (GPIO27, single-wire).

use defmt::warn;
use dht22_sensor::{Dht22, DhtError};
use embassy_rp::Peri;
use embassy_rp::gpio::Flex;
use embassy_rp::peripherals::PIN_27;
use embassy_time::{Delay, Duration, Timer};
use pico_weather_core::model::SensorReading;

/// Measurement attempts per read.
const READ_ATTEMPTS: u8 = 3;
/// Settle time between attempts.
const SETTLE_SECS: u64 = 2;

pub struct Dht22Reader {
    pin: Flex<'static>,
}

impl Dht22Reader {
    pub fn new(pin: Peri<'static, PIN_27>) -> Self {
        let mut pin = Flex::new(pin);
        pin.set_as_input();
        Self { pin }
    }

    /// Read temperature and humidity with bounded retries.
    ///
    /// An all-zero reading is retried after a settle delay up to the
    /// attempt limit. A transport error (checksum, bus timeout, pin
    /// fault) gives up immediately instead. The caller substitutes its
    /// previous good values for an invalid result.
    pub async fn read(&mut self) -> SensorReading {
        let mut delay = Delay;
        let mut sensor = Dht22::new(&mut self.pin, &mut delay);
        let mut last = SensorReading::INVALID;

        for attempt in 1..=READ_ATTEMPTS {
            match sensor.read() {
                Ok(reading)
                    if SensorReading::is_plausible(
                        reading.temperature,
                        reading.relative_humidity,
                    ) =>
                {
                    return SensorReading {
                        temperature: reading.temperature,
                        humidity: reading.relative_humidity,
                        valid: true,
                    };
                }
                Ok(reading) => {
                    warn!(
                        "implausible zero reading, attempt {}/{}",
                        attempt, READ_ATTEMPTS
                    );
                    last = SensorReading {
                        temperature: reading.temperature,
                        humidity: reading.relative_humidity,
                        valid: false,
                    };
                }
                Err(DhtError::ChecksumMismatch) => {
                    warn!("dht22 checksum mismatch");
                    return SensorReading::INVALID;
                }
                Err(DhtError::Timeout) => {
                    warn!("dht22 bus timeout");
                    return SensorReading::INVALID;
                }
                Err(DhtError::PinError(_)) => {
                    warn!("dht22 pin fault");
                    return SensorReading::INVALID;
                }
            }
            if attempt < READ_ATTEMPTS {
                Timer::after(Duration::from_secs(SETTLE_SECS)).await;
            }
        }
        last
    }
}
