//! # Pico Weather Display
//! Raspberry Pi Pico W environmental display: local DHT22 readings,
//! periodic remote forecast/time refresh over WiFi, battery estimation
//! from VSYS and two rotating scenes on a 128x64 SSD1306.

#![no_std]
#![no_main]

use defmt::info;
use embassy_executor::Spawner;
use embassy_rp::adc::{Adc, Config as AdcConfig, InterruptHandler as AdcInterruptHandler};
use embassy_rp::bind_interrupts;
use embassy_rp::clocks::{ClockConfig, CoreVoltage};
use embassy_rp::config::Config;
use embassy_rp::gpio::{Input, Pull};
use embassy_rp::rtc::Rtc;
use {defmt_rtt as _, panic_probe as _};

mod battery;
mod config;
mod connectivity;
mod display;
mod fetch;
mod scenes;
mod scheduler;
mod sensor;

use battery::BatteryMonitor;
use connectivity::{Connectivity, WifiPeripherals};
use fetch::{FETCH_BUFFER_SIZE, Fetcher};
use scheduler::Scheduler;
use sensor::Dht22Reader;

/// Firmware version - automatically populated from Cargo.toml
pub static FIRMWARE_VERSION: &str = env!("CARGO_PKG_VERSION");

// Static buffer for HTTP response bodies
static mut FETCH_BUFFER: [u8; FETCH_BUFFER_SIZE] = [0u8; FETCH_BUFFER_SIZE];

bind_interrupts!(struct Irqs {
    ADC_IRQ_FIFO => AdcInterruptHandler;
});

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("starting pico-weather v{}", FIRMWARE_VERSION);

    // 5 MHz system clock at 0.85 V core: plenty for a 15-second display
    // cadence, and a battery saver alongside the sleep between
    // iterations.
    #[allow(clippy::unwrap_used)]
    let mut clock_config = ClockConfig::system_freq(5_000_000).unwrap();
    clock_config.core_voltage = CoreVoltage::V0_85;
    let p = embassy_rp::init(Config::new(clock_config));

    // ADC for the VSYS battery measurement (GPIO29/ADC3, shared with
    // the radio SPI clock; see battery.rs for the pad discipline).
    let adc = Adc::new(p.ADC, Irqs, AdcConfig::default());

    // SSD1306 on I2C1, the original device wiring (GPIO18/GPIO19).
    // Without a panel there is nothing this device can do.
    let screen = match display::init(p.I2C1, p.PIN_19, p.PIN_18) {
        Ok(screen) => screen,
        Err(_) => defmt::panic!("SSD1306 init failed"),
    };

    let wifi = WifiPeripherals {
        pwr_pin: p.PIN_23,
        cs_pin: p.PIN_25,
        pio: p.PIO0,
        dio_pin: p.PIN_24,
        clk_pin: p.PIN_29,
        dma_ch: p.DMA_CH0,
    };
    let connectivity = Connectivity::bring_up(spawner, wifi).await;

    // SAFETY: taken exactly once, before the scheduler starts.
    let fetch_buffer: &'static mut [u8; FETCH_BUFFER_SIZE] =
        unsafe { &mut *core::ptr::addr_of_mut!(FETCH_BUFFER) };

    let fetcher = Fetcher::new(fetch_buffer);
    let sensor = Dht22Reader::new(p.PIN_27);
    let battery = BatteryMonitor::new(adc);
    let rtc = Rtc::new(p.RTC);
    // Operator stop key; stands in for the interactive interrupt of the
    // tethered variant.
    let stop_key = Input::new(p.PIN_15, Pull::Up);

    Scheduler::new(connectivity, fetcher, sensor, battery, screen, rtc, stop_key)
        .run()
        .await
}
