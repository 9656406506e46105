//! WiFi lifecycle management.
//!
//! Owns the cyw43 control handle and the DHCP network stack. The rest
//! of the firmware only ever sees `activate`/`deactivate` and the
//! boolean outcome; radio state transitions stay in here.

use cyw43::JoinOptions;
use cyw43_pio::{DEFAULT_CLOCK_DIVIDER, PioSpi};
use defmt::{info, warn};
use embassy_executor::Spawner;
use embassy_net::{Config, Stack, StackResources};
use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::{DMA_CH0, PIN_23, PIN_24, PIN_25, PIN_29, PIO0};
use embassy_rp::pio::{InterruptHandler, Pio};
use embassy_time::{Duration, Instant, Timer, with_timeout};
use pico_weather_core::model::ConnectivityState;
use static_cell::StaticCell;

use crate::config::{CONNECT_TIMEOUT_SECS, WIFI_PASSWORD, WIFI_SSID};

/// WiFi peripherals needed for initialization
pub struct WifiPeripherals {
    pub pwr_pin: embassy_rp::Peri<'static, PIN_23>,
    pub cs_pin: embassy_rp::Peri<'static, PIN_25>,
    pub pio: embassy_rp::Peri<'static, PIO0>,
    pub dio_pin: embassy_rp::Peri<'static, PIN_24>,
    pub clk_pin: embassy_rp::Peri<'static, PIN_29>,
    pub dma_ch: embassy_rp::Peri<'static, DMA_CH0>,
}

/// CYW43 runner task
#[embassy_executor::task]
async fn cyw43_task(
    runner: cyw43::Runner<'static, Output<'static>, PioSpi<'static, PIO0, 0, DMA_CH0>>,
) -> ! {
    runner.run().await
}

/// Network stack runner task
#[embassy_executor::task]
async fn net_task(mut runner: embassy_net::Runner<'static, cyw43::NetDriver<'static>>) -> ! {
    runner.run().await
}

/// Radio and network stack, plus the lifecycle state the manager owns
/// exclusively.
pub struct Connectivity {
    control: cyw43::Control<'static>,
    stack: Stack<'static>,
    state: ConnectivityState,
}

impl Connectivity {
    /// Initialize the WiFi chip and network stack and spawn their
    /// runner tasks. The radio comes up powered but unjoined.
    pub async fn bring_up(spawner: Spawner, peripherals: WifiPeripherals) -> Self {
        // CYW43 firmware and CLM blobs live at fixed flash addresses,
        // flashed once with:
        //   probe-rs download 43439A0.bin --binary-format bin --chip RP2040 --base-address 0x10100000
        //   probe-rs download 43439A0_clm.bin --binary-format bin --chip RP2040 --base-address 0x10140000
        let fw = unsafe { core::slice::from_raw_parts(0x10100000 as *const u8, 230321) };
        let clm = unsafe { core::slice::from_raw_parts(0x10140000 as *const u8, 4752) };

        info!("Setting up PIO for CYW43 SPI...");
        let pwr = Output::new(peripherals.pwr_pin, Level::Low);
        let cs = Output::new(peripherals.cs_pin, Level::High);

        embassy_rp::bind_interrupts!(struct Irqs {
            PIO0_IRQ_0 => InterruptHandler<PIO0>;
        });

        let mut pio = Pio::new(peripherals.pio, Irqs);
        let spi = PioSpi::new(
            &mut pio.common,
            pio.sm0,
            DEFAULT_CLOCK_DIVIDER,
            pio.irq0,
            cs,
            peripherals.dio_pin,
            peripherals.clk_pin,
            peripherals.dma_ch,
        );

        static STATE: StaticCell<cyw43::State> = StaticCell::new();
        let state = STATE.init(cyw43::State::new());
        let (net_device, mut control, runner) = cyw43::new(state, pwr, spi, fw).await;

        // Failing to spawn a runner at init means a misbuilt binary;
        // fail fast.
        #[allow(clippy::unwrap_used)]
        spawner.spawn(cyw43_task(runner)).unwrap();

        control.init(clm).await;
        control
            .set_power_management(cyw43::PowerManagementMode::PowerSave)
            .await;
        info!("WiFi chip initialized");

        static RESOURCES: StaticCell<StackResources<5>> = StaticCell::new();

        // Pseudo-random seed from the boot-time jitter of the clock.
        let seed = Instant::now().as_micros();
        let (stack, runner) = embassy_net::new(
            net_device,
            Config::dhcpv4(Default::default()),
            RESOURCES.init(StackResources::new()),
            seed,
        );

        #[allow(clippy::unwrap_used)]
        spawner.spawn(net_task(runner)).unwrap();

        Self {
            control,
            stack,
            state: ConnectivityState::Inactive,
        }
    }

    pub fn stack(&self) -> Stack<'static> {
        self.stack
    }

    /// Bring the link up, returning whether the radio ended the call
    /// connected.
    ///
    /// Idempotent: an established connection returns true immediately
    /// without touching the radio. A timed-out attempt reports failure
    /// but leaves the radio powered; the caller decides whether to
    /// deactivate.
    pub async fn activate(&mut self) -> bool {
        if self.state == ConnectivityState::Connected && self.stack.is_config_up() {
            return true;
        }

        self.state = ConnectivityState::Connecting;
        info!("Joining WiFi network: {}", WIFI_SSID);
        self.control
            .set_power_management(cyw43::PowerManagementMode::Performance)
            .await;

        let outcome = with_timeout(
            Duration::from_secs(CONNECT_TIMEOUT_SECS),
            self.join_and_wait_for_config(),
        )
        .await;

        match outcome {
            Ok(()) => {
                self.state = ConnectivityState::Connected;
                if let Some(config) = self.stack.config_v4() {
                    info!("Network up, IP address: {}", config.address);
                }
                self.control
                    .set_power_management(cyw43::PowerManagementMode::PowerSave)
                    .await;
                true
            }
            Err(_) => {
                self.state = ConnectivityState::Failed;
                warn!(
                    "No connection within {} seconds, radio left active",
                    CONNECT_TIMEOUT_SECS
                );
                false
            }
        }
    }

    /// Join the network, then poll once per second until DHCP is up.
    /// Unbounded on its own; `activate` wraps it in the connect window.
    async fn join_and_wait_for_config(&mut self) {
        while let Err(err) = self
            .control
            .join(WIFI_SSID, JoinOptions::new(WIFI_PASSWORD.as_bytes()))
            .await
        {
            warn!("WiFi join failed: {:?}, retrying...", err.status);
            Timer::after(Duration::from_secs(1)).await;
        }
        while !(self.stack.is_link_up() && self.stack.is_config_up()) {
            Timer::after(Duration::from_secs(1)).await;
        }
    }

    /// Power the radio down to its deepest save mode. No-op when
    /// already inactive.
    pub async fn deactivate(&mut self) {
        if self.state == ConnectivityState::Inactive {
            return;
        }

        self.control.leave().await;

        // Bounded wait for the network stack to notice the link drop.
        let mut polls = 0;
        while self.stack.is_link_up() || self.stack.is_config_up() {
            Timer::after(Duration::from_millis(100)).await;
            polls += 1;
            if polls > 50 {
                warn!("Timeout waiting for network stack to go down");
                break;
            }
        }

        self.control
            .set_power_management(cyw43::PowerManagementMode::SuperSave)
            .await;
        self.state = ConnectivityState::Inactive;
        info!("WiFi deactivated");
    }
}
