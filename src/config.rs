//! Compiled-in boot configuration.
//!
//! Everything the device needs to perform its single update is fixed at
//! build time.  The WiFi credentials and firmware URL can be overridden
//! through environment variables when building:
//!
//! ```text
//! OTA_WIFI_SSID=HomeNet OTA_WIFI_PASS=hunter2hunter2 \
//! OTA_FIRMWARE_URL=http://192.168.1.10:8000/firmware.bin cargo build --release
//! ```

use core::ffi::CStr;
use core::fmt;

use serde::{Deserialize, Serialize};

use crate::drivers::task_pin::Core;

/// Station SSID compiled into the image.
pub const WIFI_SSID: &str = match option_env!("OTA_WIFI_SSID") {
    Some(ssid) => ssid,
    None => "myssid",
};

/// Station passphrase compiled into the image.
pub const WIFI_PASS: &str = match option_env!("OTA_WIFI_PASS") {
    Some(pass) => pass,
    None => "mypassword",
};

/// Where the new image is fetched from.
pub const FIRMWARE_URL: &str = match option_env!("OTA_FIRMWARE_URL") {
    Some(url) => url,
    None => "http://example.com/firmware.bin",
};

/// Largest image accepted for the inactive slot.
pub const MAX_IMAGE_SIZE: u32 = 4 * 1024 * 1024; // 4 MB

/// FreeRTOS task name for the update runner (NUL-terminated for pthread cfg).
pub const UPDATE_TASK_NAME: &str = "ota_update_task\0";

const MAX_URL_LEN: usize = 256;

// ───────────────────────────────────────────────────────────────
// Errors
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    InvalidSsid,
    InvalidPassword,
    InvalidUrl,
    /// A trust anchor was configured for a plaintext `http://` URL.
    TrustAnchorWithoutTls,
    InvalidImageCap,
    InvalidTask,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(
                f,
                "password invalid (must be 8-64 bytes, or empty for an open network)"
            ),
            Self::InvalidUrl => write!(f, "firmware URL must be http:// or https:// and fit 256 bytes"),
            Self::TrustAnchorWithoutTls => write!(f, "trust anchor configured for a non-TLS URL"),
            Self::InvalidImageCap => write!(f, "maximum image size must be non-zero"),
            Self::InvalidTask => write!(f, "update task needs a stack of at least 4 KB"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ───────────────────────────────────────────────────────────────
// WiFi credentials
// ───────────────────────────────────────────────────────────────

/// Minimum authentication mode the station accepts from an AP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthMode {
    Open,
    Wpa2Personal,
    Wpa2Wpa3Personal,
    Wpa3Personal,
}

pub(crate) fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

/// Station credentials.  Immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct WifiCredentials {
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    min_auth: AuthMode,
}

impl WifiCredentials {
    pub fn new(ssid: &str, password: &str, min_auth: AuthMode) -> Result<Self, ConfigError> {
        if ssid.is_empty() || !is_printable_ascii(ssid) {
            return Err(ConfigError::InvalidSsid);
        }
        match (password.len(), min_auth) {
            (0, AuthMode::Open) => {}
            (0, _) => return Err(ConfigError::InvalidPassword),
            (8..=64, _) => {}
            _ => return Err(ConfigError::InvalidPassword),
        }

        let mut c = Self {
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            min_auth,
        };
        c.ssid.push_str(ssid).map_err(|()| ConfigError::InvalidSsid)?;
        c.password
            .push_str(password)
            .map_err(|()| ConfigError::InvalidPassword)?;
        Ok(c)
    }

    /// The credentials baked into this image (WPA2-Personal minimum).
    pub fn compiled_in() -> Result<Self, ConfigError> {
        Self::new(WIFI_SSID, WIFI_PASS, AuthMode::Wpa2Personal)
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    /// Owned copy for events that outlive the credentials borrow.
    pub fn ssid_string(&self) -> heapless::String<32> {
        self.ssid.clone()
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn min_auth(&self) -> AuthMode {
        self.min_auth
    }
}

impl fmt::Debug for WifiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WifiCredentials")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .field("min_auth", &self.min_auth)
            .finish()
    }
}

// ───────────────────────────────────────────────────────────────
// OTA request descriptor
// ───────────────────────────────────────────────────────────────

/// How the HTTP client authenticates the firmware server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrustAnchor {
    /// No server authentication.
    #[default]
    None,
    /// A PEM-encoded root certificate.
    Pem(&'static CStr),
    /// The certificate bundle compiled into ESP-IDF.
    CertBundle,
}

/// One update attempt's worth of HTTP client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtaRequest {
    url: heapless::String<MAX_URL_LEN>,
    pub trust_anchor: TrustAnchor,
    /// Reject the image unless its SHA-256 matches.
    pub expected_sha256: Option<[u8; 32]>,
    pub max_image_size: u32,
}

impl OtaRequest {
    pub fn new(url: &str) -> Result<Self, ConfigError> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl);
        }
        let mut owned = heapless::String::new();
        owned.push_str(url).map_err(|()| ConfigError::InvalidUrl)?;
        Ok(Self {
            url: owned,
            trust_anchor: TrustAnchor::None,
            expected_sha256: None,
            max_image_size: MAX_IMAGE_SIZE,
        })
    }

    pub fn with_trust_anchor(mut self, anchor: TrustAnchor) -> Self {
        self.trust_anchor = anchor;
        self
    }

    pub fn with_expected_sha256(mut self, digest: [u8; 32]) -> Self {
        self.expected_sha256 = Some(digest);
        self
    }

    pub fn with_max_image_size(mut self, bytes: u32) -> Self {
        self.max_image_size = bytes;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_tls(&self) -> bool {
        self.url.starts_with("https://")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trust_anchor != TrustAnchor::None && !self.is_tls() {
            return Err(ConfigError::TrustAnchorWithoutTls);
        }
        if self.max_image_size == 0 {
            return Err(ConfigError::InvalidImageCap);
        }
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Boot policy
// ───────────────────────────────────────────────────────────────

/// What the bootstrapper does between starting the station and
/// scheduling the update task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectPolicy {
    /// Start the driver and move on; the HTTP client copes with a link
    /// that is not up yet.
    FireAndForget,
    /// Poll until the station is associated with an IP, or give up after
    /// `timeout_ms` and continue anyway.
    WaitForAssociation { timeout_ms: u32, poll_ms: u32 },
}

impl Default for ConnectPolicy {
    fn default() -> Self {
        Self::WaitForAssociation {
            timeout_ms: 30_000,
            poll_ms: 250,
        }
    }
}

/// FreeRTOS parameters for the update task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskConfig {
    pub core: Core,
    pub priority: u8,
    pub stack_kb: usize,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            core: Core::App,
            priority: 5,
            stack_kb: 8,
        }
    }
}

/// Everything [`BootSequence`](crate::app::service::BootSequence) needs.
#[derive(Debug, Clone)]
pub struct BootConfig {
    pub wifi: WifiCredentials,
    pub ota: OtaRequest,
    pub connect: ConnectPolicy,
    pub task: TaskConfig,
}

impl BootConfig {
    pub fn new(wifi: WifiCredentials, ota: OtaRequest) -> Self {
        Self {
            wifi,
            ota,
            connect: ConnectPolicy::default(),
            task: TaskConfig::default(),
        }
    }

    /// Build from the compiled-in constants and validate.
    pub fn compiled_in() -> Result<Self, ConfigError> {
        let cfg = Self::new(WifiCredentials::compiled_in()?, OtaRequest::new(FIRMWARE_URL)?);
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ota.validate()?;
        if self.task.stack_kb < 4 {
            return Err(ConfigError::InvalidTask);
        }
        Ok(())
    }
}
