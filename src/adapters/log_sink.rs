//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC on the device, stderr on the host).

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
///
/// Stateless, so one copy can go to the update task while `main` keeps another.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::StoreReady { recovered } => {
                info!("STORE | ready{}", if *recovered { " (erased)" } else { "" });
            }
            AppEvent::StationStarted { ssid } => {
                info!("WIFI | station started, ssid='{}'", ssid);
            }
            AppEvent::LinkUp { waited_ms } => {
                info!("WIFI | link up after {} ms", waited_ms);
            }
            AppEvent::LinkTimedOut { waited_ms } => {
                warn!("WIFI | no link after {} ms", waited_ms);
            }
            AppEvent::LinkStartFailed(e) => {
                warn!("WIFI | start failed: {}", e);
            }
            AppEvent::UpdateTaskSpawned => {
                info!("OTA | update task spawned");
            }
            AppEvent::UpdateStarted => {
                info!("OTA | started");
            }
            AppEvent::UpdateSucceeded(report) => match serde_json::to_string(report) {
                Ok(json) => info!("OTA | flashed {} sha256={}", json, report.sha256_hex()),
                Err(_) => info!(
                    "OTA | flashed {} bytes sha256={}",
                    report.bytes_written,
                    report.sha256_hex()
                ),
            },
            AppEvent::UpdateFailed(e) => {
                error!("OTA | failed: {}", e);
            }
            AppEvent::Restarting => {
                info!("SYS | restarting");
            }
        }
    }
}
