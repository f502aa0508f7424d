//! One-shot firmware update.
//!
//! Flow: [`UpdateJob::spawn`](job::UpdateJob::spawn) → task runs
//! [`UpdateRunner::attempt`](runner::UpdateRunner::attempt) → outcome
//! published on the completion signal → restart on success.
//!
//! ```text
//!   IDLE ──attempt──▶ UPDATING ──ok──▶ REBOOTING  (process restarts)
//!                         │
//!                         └──err──▶ FAILED     (task exits, image unchanged)
//! ```

use core::fmt;

use serde::Serialize;

pub mod job;
pub mod runner;
pub mod stream;

// ── Error type ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtaError {
    /// Connection, TLS handshake or body read failed.
    Transport,
    /// Server answered with anything but 200.
    HttpStatus(u16),
    /// Server returned a zero-length body.
    EmptyImage,
    /// Declared or streamed size exceeds the slot cap.
    ImageTooLarge,
    /// Body length differs from `Content-Length`.
    SizeMismatch { expected: u32, actual: u32 },
    /// SHA-256 of the streamed image differs from the expected digest.
    DigestMismatch,
    /// No inactive OTA partition could be opened.
    BeginFailed,
    WriteFailed,
    /// Image validation in the OTA layer failed.
    VerifyFailed,
    BootSetFailed,
    /// The runner already made its one attempt this boot.
    AlreadyAttempted,
    /// The update task died before publishing an outcome.
    TaskPanicked,
}

impl fmt::Display for OtaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => write!(f, "HTTP transport failed"),
            Self::HttpStatus(code) => write!(f, "server returned HTTP {code}"),
            Self::EmptyImage => write!(f, "firmware image is empty"),
            Self::ImageTooLarge => write!(f, "firmware image exceeds partition cap"),
            Self::SizeMismatch { expected, actual } => {
                write!(f, "size mismatch (expected {expected} bytes, got {actual})")
            }
            Self::DigestMismatch => write!(f, "SHA-256 digest mismatch"),
            Self::BeginFailed => write!(f, "no inactive OTA partition available"),
            Self::WriteFailed => write!(f, "OTA partition write failed"),
            Self::VerifyFailed => write!(f, "OTA image verification failed"),
            Self::BootSetFailed => write!(f, "set boot partition failed"),
            Self::AlreadyAttempted => write!(f, "update already attempted this boot"),
            Self::TaskPanicked => write!(f, "update task panicked"),
        }
    }
}

impl std::error::Error for OtaError {}

// ── Results ───────────────────────────────────────────────────

/// What landed in the inactive slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlashReport {
    pub bytes_written: u32,
    pub sha256: [u8; 32],
}

impl FlashReport {
    /// Lower-case hex of the image digest.
    pub fn sha256_hex(&self) -> HexDigest {
        HexDigest(self.sha256)
    }
}

/// Formats a SHA-256 digest as 64 lower-case hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexDigest([u8; 32]);

impl fmt::Display for HexDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|b| write!(f, "{b:02x}"))
    }
}

/// Binary result of the single update attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// New image is bootable; the task restarts the chip.
    Rebooting(FlashReport),
    /// Running image left untouched.
    Failed(OtaError),
}

impl UpdateOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Rebooting(_))
    }
}
