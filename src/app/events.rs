//! Outbound application events.
//!
//! Emitted through the [`EventSink`](super::ports::EventSink) port by the
//! boot sequence, the network bootstrapper and the update task.

use crate::app::ports::ConnectivityError;
use crate::ota::{FlashReport, OtaError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Persistent store is usable; `recovered` if it had to be erased first.
    StoreReady { recovered: bool },

    /// Station driver started and associating with `ssid`.
    StationStarted { ssid: heapless::String<32> },

    /// Station associated and holding an IP.
    LinkUp { waited_ms: u32 },

    /// Association did not complete within the policy timeout.
    LinkTimedOut { waited_ms: u32 },

    /// Station bring-up failed; boot continues regardless.
    LinkStartFailed(ConnectivityError),

    /// The update task was created.
    UpdateTaskSpawned,

    /// The update task began its fetch.
    UpdateStarted,

    UpdateSucceeded(FlashReport),

    UpdateFailed(OtaError),

    /// A full chip restart is about to be issued.
    Restarting,
}
