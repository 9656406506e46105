//! Generates the device configuration module and sets up the linker.
//!
//! Settings layer as: built-in defaults, then an optional `device.toml`
//! next to this file. The merged values are emitted as consts into
//! `config_generated.rs`, pulled in by src/config.rs.

use std::env;
use std::fmt::Write;
use std::fs;
use std::path::PathBuf;

const STRING_KEYS: [(&str, &str); 5] = [
    ("wifi_ssid", "change-me"),
    ("wifi_password", "change-me"),
    (
        "forecast_url",
        "http://192.168.1.1/weatherapi/locationforecast/2.0/compact?lat=59.43&lon=24.75",
    ),
    ("time_url", "http://worldtimeapi.org/api/timezone/Europe/Tallinn"),
    ("user_agent", "pico-weather/0.1"),
];

const INT_KEYS: [(&str, i64, &str); 2] = [
    ("refresh_interval_minutes", 30, "u16"),
    ("scene_duration_secs", 15, "u64"),
];

fn main() {
    let out = PathBuf::from(env::var_os("OUT_DIR").unwrap());

    emit_device_config(&out);

    // Linker setup for cortex-m-rt + embassy-rp + defmt.
    fs::copy("memory.x", out.join("memory.x")).unwrap();
    println!("cargo:rustc-link-search={}", out.display());
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=device.toml");
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
}

fn emit_device_config(out: &PathBuf) {
    let mut builder = config::Config::builder()
        .add_source(config::File::with_name("device").required(false));
    for (key, default) in STRING_KEYS {
        builder = builder.set_default(key, default).unwrap();
    }
    for (key, default, _) in INT_KEYS {
        builder = builder.set_default(key, default).unwrap();
    }
    let settings = builder.build().unwrap();

    let mut generated = String::new();
    for (key, _) in STRING_KEYS {
        let value = settings.get_string(key).unwrap();
        writeln!(
            generated,
            "pub const {}: &str = {:?};",
            key.to_uppercase(),
            value
        )
        .unwrap();
    }
    for (key, _, ty) in INT_KEYS {
        let value = settings.get_int(key).unwrap();
        writeln!(generated, "pub const {}: {} = {};", key.to_uppercase(), ty, value).unwrap();
    }
    fs::write(out.join("config_generated.rs"), generated).unwrap();
}
