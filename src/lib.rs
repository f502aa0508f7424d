//! One-shot OTA firmware library.
//!
//! Exposes the boot sequencing and update logic for integration testing.
//! All ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module; other targets get simulation adapters.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
#[cfg(not(target_os = "espidf"))]
pub mod logging;
pub mod network;
pub mod ota;
pub mod platform;
