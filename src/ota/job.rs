//! The update task and its completion channel.
//!
//! ```text
//!  ┌──────────────┐   spawn    ┌───────────────────────────────┐
//!  │  boot task   │──────────▶│ ota_update_task               │
//!  │              │            │  attempt() → signal → finish() │
//!  │  JobHandle   │◀──────────│                               │
//!  └──────────────┘  outcome   └───────────────────────────────┘
//! ```
//!
//! The outcome is signalled *before* `finish()` so an observer sees it
//! even when the task then restarts the chip.  A task that unwinds before
//! signalling publishes [`OtaError::TaskPanicked`] on its way out.

use std::sync::Arc;
use std::thread::JoinHandle;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use log::warn;

use super::runner::UpdateRunner;
use super::{OtaError, UpdateOutcome};
use crate::app::ports::{EventSink, FirmwareFetcher, SystemPort};
use crate::config::{TaskConfig, UPDATE_TASK_NAME};
use crate::drivers::task_pin::spawn_on_core;
use crate::error::Error;

type Completion = Signal<CriticalSectionRawMutex, UpdateOutcome>;

/// Task-side end of the completion channel.  Dropping it unpublished
/// signals a panic so `JobHandle::wait` never blocks on a dead task.
struct Publisher {
    tx: Arc<Completion>,
    sent: bool,
}

impl Publisher {
    fn publish(&mut self, outcome: UpdateOutcome) {
        self.tx.signal(outcome);
        self.sent = true;
    }
}

impl Drop for Publisher {
    fn drop(&mut self) {
        if !self.sent {
            warn!("OTA: update task unwound before publishing an outcome");
            self.tx.signal(UpdateOutcome::Failed(OtaError::TaskPanicked));
        }
    }
}

pub struct UpdateJob;

impl UpdateJob {
    /// Spawn the update task.  The runner is moved into it and attempted once.
    pub fn spawn<F, S, E>(runner: UpdateRunner<F, S, E>, task: &TaskConfig) -> Result<JobHandle, Error>
    where
        F: FirmwareFetcher + 'static,
        S: SystemPort + 'static,
        E: EventSink + Send + 'static,
    {
        let completion: Arc<Completion> = Arc::new(Signal::new());
        let mut publisher = Publisher {
            tx: Arc::clone(&completion),
            sent: false,
        };

        let thread = spawn_on_core(
            task.core,
            task.priority,
            task.stack_kb,
            UPDATE_TASK_NAME,
            move || {
                let mut runner = runner;
                let outcome = runner.attempt();
                publisher.publish(outcome);
                runner.finish();
            },
        )
        .map_err(|e| {
            warn!("OTA: task spawn failed: {}", e);
            Error::Task("update task spawn failed")
        })?;

        Ok(JobHandle {
            completion,
            thread: Some(thread),
            outcome: None,
        })
    }
}

/// Observer side of a spawned update task.
pub struct JobHandle {
    completion: Arc<Completion>,
    thread: Option<JoinHandle<()>>,
    outcome: Option<UpdateOutcome>,
}

impl JobHandle {
    /// Outcome if the task has published one.
    pub fn try_outcome(&mut self) -> Option<UpdateOutcome> {
        if self.outcome.is_none() {
            self.outcome = self.completion.try_take();
        }
        self.outcome
    }

    /// Block until the task publishes its outcome.
    pub fn wait(&mut self) -> UpdateOutcome {
        if let Some(o) = self.try_outcome() {
            return o;
        }
        let o = futures_lite::future::block_on(self.completion.wait());
        self.outcome = Some(o);
        o
    }

    /// Wait for the task to exit entirely, including its `finish()` step.
    pub fn join(mut self) -> UpdateOutcome {
        let panicked = self
            .thread
            .take()
            .is_some_and(|t| t.join().is_err());
        if panicked {
            warn!("OTA: update task panicked");
        }
        self.try_outcome()
            .unwrap_or(UpdateOutcome::Failed(OtaError::TaskPanicked))
    }
}
