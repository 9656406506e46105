//! Platform-independent logic for the pico-weather display.
//!
//! Everything in this crate is pure computation over the data model:
//! remote payload parsing, time conversion, battery math and the
//! bookkeeping that drives the firmware's control loop. No peripheral
//! access lives here, which keeps the crate testable on the host.

#![cfg_attr(not(test), no_std)]

pub mod battery;
pub mod clock;
pub mod forecast;
pub mod model;
pub mod scene;
