//! Device configuration, consumed once at startup.
//!
//! Credentials, endpoint URLs and the cadence constants come from
//! `device.toml` (or the build-time defaults) via build.rs.

include!(concat!(env!("OUT_DIR"), "/config_generated.rs"));

/// Bounded window for one WiFi connect attempt.
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Bounded window for one HTTP exchange.
pub const FETCH_TIMEOUT_SECS: u64 = 20;
