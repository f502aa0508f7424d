//! Update Runner: exactly one fetch-and-flash per boot.

use log::{error, info, warn};

use super::{OtaError, UpdateOutcome};
use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, FirmwareFetcher, SystemPort};
use crate::config::OtaRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateState {
    Idle,
    Updating,
    /// Terminal for the process.
    Rebooting,
    /// Terminal for the task.
    Failed,
}

/// Owns the request descriptor and the ports for the lifetime of the task.
pub struct UpdateRunner<F, S, E> {
    request: OtaRequest,
    fetcher: F,
    system: S,
    sink: E,
    state: UpdateState,
}

impl<F, S, E> UpdateRunner<F, S, E>
where
    F: FirmwareFetcher,
    S: SystemPort,
    E: EventSink,
{
    pub fn new(request: OtaRequest, fetcher: F, system: S, sink: E) -> Self {
        Self {
            request,
            fetcher,
            system,
            sink,
            state: UpdateState::Idle,
        }
    }

    pub fn state(&self) -> UpdateState {
        self.state
    }

    /// Perform the update.  Only the first call reaches the fetcher; later
    /// calls report [`OtaError::AlreadyAttempted`].
    pub fn attempt(&mut self) -> UpdateOutcome {
        if self.state != UpdateState::Idle {
            warn!("OTA: attempt ignored in state {:?}", self.state);
            return UpdateOutcome::Failed(OtaError::AlreadyAttempted);
        }

        self.state = UpdateState::Updating;
        info!("Starting OTA update...");
        self.sink.emit(&AppEvent::UpdateStarted);

        match self.fetcher.fetch_and_flash(&self.request) {
            Ok(report) => {
                self.state = UpdateState::Rebooting;
                self.sink.emit(&AppEvent::UpdateSucceeded(report));
                UpdateOutcome::Rebooting(report)
            }
            Err(e) => {
                self.state = UpdateState::Failed;
                error!("OTA Update Failed: {}", e);
                self.sink.emit(&AppEvent::UpdateFailed(e));
                UpdateOutcome::Failed(e)
            }
        }
    }

    /// End of the task: restart into the new image, or just return.
    pub fn finish(mut self) {
        if self.state == UpdateState::Rebooting {
            info!("OTA Update Completed. Rebooting...");
            self.sink.emit(&AppEvent::Restarting);
            self.system.restart();
        } else {
            info!("OTA: update task exiting ({:?})", self.state);
        }
    }
}
