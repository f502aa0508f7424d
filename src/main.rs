//! OTA Basic: Main Entry Point
//!
//! Boots, joins WiFi, downloads one firmware image into the inactive slot
//! and restarts into it.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  NvsStore      WifiAdapter    HttpImageSource + OtaPartition │
//! │  (KvStore)     (Network)      (StreamingFetcher)             │
//! │  EspSystem     LogEventSink                                  │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ─────────────────      │
//! │                                                              │
//! │  BootSequence: store → network → update task ──▶ JobHandle   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{error, info};

use ota_basic::adapters::http_source::HttpImageSource;
use ota_basic::adapters::log_sink::LogEventSink;
use ota_basic::adapters::nvs::NvsStore;
use ota_basic::adapters::ota_partition::OtaPartition;
use ota_basic::adapters::system::EspSystem;
use ota_basic::adapters::wifi::WifiAdapter;
use ota_basic::app::service::{BootPorts, BootSequence, Booted};
use ota_basic::config::BootConfig;
use ota_basic::ota::UpdateOutcome;
use ota_basic::ota::stream::StreamingFetcher;
use ota_basic::platform::PlatformContext;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    #[cfg(target_os = "espidf")]
    {
        esp_idf_svc::sys::link_patches();
        esp_idf_logger::init()?;
    }
    #[cfg(not(target_os = "espidf"))]
    ota_basic::logging::init(log::LevelFilter::Info)
        .map_err(|e| anyhow::anyhow!("host logger: {}", e))?;

    info!("╔══════════════════════════════════════╗");
    info!("║  OTA Basic v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration + platform singletons ────────────────
    let config = BootConfig::compiled_in()?;
    info!("Config: {:?}", config.wifi);
    info!("Config: firmware URL {}", config.ota.url());
    let mut platform = PlatformContext::take()?;

    // ── 3. Adapters ───────────────────────────────────────────
    let network = WifiAdapter::new(&mut platform)?;
    let fetcher = StreamingFetcher::new(image_source(), OtaPartition::new());
    let ports = BootPorts {
        store: NvsStore::new(),
        network,
        fetcher,
        system: EspSystem::new(),
        sink: LogEventSink::new(),
    };

    // ── 4. Boot: store → network → update task ────────────────
    let mut booted = BootSequence::new(config).run(ports)?;
    info!("Boot complete, link {:?}; waiting for update task", booted.link);

    // ── 5. Wait for the single attempt ────────────────────────
    match booted.job.wait() {
        UpdateOutcome::Rebooting(report) => {
            // The task issues the restart itself.
            info!("Update flashed {} bytes, restart pending", report.bytes_written);
        }
        UpdateOutcome::Failed(e) => {
            error!("Update failed: {}; running image stays active", e);
        }
    }

    idle(booted)
}

/// The station must outlive `main` on the device and the update task owns
/// the restart, so there is nothing left to do but park.
#[cfg(target_os = "espidf")]
fn idle(_booted: Booted<WifiAdapter>) -> Result<()> {
    loop {
        std::thread::park();
    }
}

#[cfg(not(target_os = "espidf"))]
fn idle(booted: Booted<WifiAdapter>) -> Result<()> {
    let outcome = booted.job.join();
    info!("Simulation finished: {:?}", outcome);
    Ok(())
}

#[cfg(target_os = "espidf")]
fn image_source() -> HttpImageSource {
    HttpImageSource::new()
}

/// Simulation serves a small synthetic image.
#[cfg(not(target_os = "espidf"))]
fn image_source() -> HttpImageSource {
    HttpImageSource::serving((0..64 * 1024).map(|i| (i % 251) as u8).collect())
}
