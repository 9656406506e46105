//! SSD1306 panel bring-up: 128x64 monochrome over I2C1 on the
//! original device wiring (GPIO18 SDA / GPIO19 SCL).

use display_interface::DisplayError;
use embassy_rp::Peri;
use embassy_rp::i2c::{Blocking, Config as I2cConfig, I2c};
use embassy_rp::peripherals::{I2C1, PIN_18, PIN_19};
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::{I2CDisplayInterface, Ssd1306};

/// The concrete panel type the scheduler draws on.
pub type Screen = Ssd1306<
    I2CInterface<I2c<'static, I2C1, Blocking>>,
    DisplaySize128x64,
    BufferedGraphicsMode<DisplaySize128x64>,
>;

pub fn init(
    i2c: Peri<'static, I2C1>,
    scl: Peri<'static, PIN_19>,
    sda: Peri<'static, PIN_18>,
) -> Result<Screen, DisplayError> {
    let i2c = I2c::new_blocking(i2c, scl, sda, I2cConfig::default());
    let mut screen = Ssd1306::new(
        I2CDisplayInterface::new(i2c),
        DisplaySize128x64,
        DisplayRotation::Rotate0,
    )
    .into_buffered_graphics_mode();
    screen.init()?;
    Ok(screen)
}
