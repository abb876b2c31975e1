//! Build script for OpenPWM firmware
//!
//! Handles:
//! - Memory layout configuration (embassy-stm32 `memory-x`)
//! - Linker scripts for the target build

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Host builds (tests) need no linker scripts
    if std::env::var_os("CARGO_FEATURE_EMBEDDED").is_none() {
        return;
    }

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
}
