//! Port traits: the hexagonal boundary between boot sequencing and the SDK.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ BootSequence / NetworkBootstrapper / UpdateRunner
//! ```
//!
//! Device adapters wrap ESP-IDF calls; simulation adapters and test mocks
//! implement the same traits so every sequencing rule runs on the host.

use core::fmt;

use crate::config::{OtaRequest, WifiCredentials};
use crate::ota::{FlashReport, OtaError};

// ───────────────────────────────────────────────────────────────
// Persistent key-value store
// ───────────────────────────────────────────────────────────────

/// Boot-time lifecycle of the persistent key-value store.
///
/// This program never reads or writes keys; it only needs the store
/// initialised so the WiFi driver can keep its calibration data there.
pub trait KvStorePort {
    /// Initialise the store partition.
    fn init(&mut self) -> Result<(), StoreError>;

    /// Erase the whole store partition.
    fn erase(&mut self) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// Partition has no free pages left.
    NoFreePages,
    /// Partition was written by a newer store format.
    NewVersionFound,
    /// Any other SDK error code.
    Io(i32),
}

impl StoreError {
    /// Whether erase-and-reinitialise can recover from this error.
    pub fn is_recoverable_by_erase(self) -> bool {
        matches!(self, Self::NoFreePages | Self::NewVersionFound)
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoFreePages => write!(f, "no free pages"),
            Self::NewVersionFound => write!(f, "newer store version found"),
            Self::Io(code) => write!(f, "store I/O error ({code})"),
        }
    }
}

impl std::error::Error for StoreError {}

// ───────────────────────────────────────────────────────────────
// WiFi station
// ───────────────────────────────────────────────────────────────

pub trait NetworkPort {
    /// Apply the station config and start the driver.  Returns once the
    /// driver has *begun* associating.
    fn start_station(&mut self, credentials: &WifiCredentials) -> Result<(), ConnectivityError>;

    /// Associated with an AP and holding an IP address.
    fn is_associated(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    /// The modem peripheral was already claimed.
    ModemUnavailable,
    /// Network interface or driver init failed.
    DriverInit,
    /// Station configuration was rejected by the driver.
    Configuration,
    StartFailed,
    ConnectFailed,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModemUnavailable => write!(f, "modem peripheral already taken"),
            Self::DriverInit => write!(f, "WiFi driver init failed"),
            Self::Configuration => write!(f, "station configuration rejected"),
            Self::StartFailed => write!(f, "WiFi start failed"),
            Self::ConnectFailed => write!(f, "WiFi connect failed"),
        }
    }
}

impl std::error::Error for ConnectivityError {}

// ───────────────────────────────────────────────────────────────
// Fetch-and-flash
// ───────────────────────────────────────────────────────────────

/// Download the image named by `request` into the inactive OTA slot and
/// mark it bootable.  Every failure collapses into one [`OtaError`].
///
/// Runs on the update task, hence `Send`.
pub trait FirmwareFetcher: Send {
    fn fetch_and_flash(&mut self, request: &OtaRequest) -> Result<FlashReport, OtaError>;
}

// ───────────────────────────────────────────────────────────────
// System control
// ───────────────────────────────────────────────────────────────

pub trait SystemPort: Send {
    /// Full chip restart.  Does not return on the device.
    fn restart(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink
// ───────────────────────────────────────────────────────────────

/// The boot sequence and update task emit structured
/// [`AppEvent`](super::events::AppEvent)s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
