//! Unified error type for the boot path.
//!
//! Every subsystem error converts into [`Error`], so the boot sequence and
//! `main` handle failures uniformly.  All variants are `Copy`.

use core::fmt;

use crate::app::ports::{ConnectivityError, StoreError};
use crate::config::ConfigError;
use crate::ota::OtaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Persistent store could not be brought up, even after an erase.
    Store(StoreError),
    /// WiFi station setup failed.
    Wifi(ConnectivityError),
    /// The update attempt failed.
    Ota(OtaError),
    /// Compiled-in configuration is invalid.
    Config(ConfigError),
    /// SDK singleton or peripheral initialisation failed.
    Init(&'static str),
    /// The update task could not be created.
    Task(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "store: {e}"),
            Self::Wifi(e) => write!(f, "wifi: {e}"),
            Self::Ota(e) => write!(f, "ota: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Task(msg) => write!(f, "task: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<ConnectivityError> for Error {
    fn from(e: ConnectivityError) -> Self {
        Self::Wifi(e)
    }
}

impl From<OtaError> for Error {
    fn from(e: OtaError) -> Self {
        Self::Ota(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
