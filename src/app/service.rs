//! Boot sequence: the hexagonal core.
//!
//! ```text
//!  KvStorePort ──▶ ┌──────────────────────────────┐
//!  NetworkPort ──▶ │ BootSequence                  │ ──▶ EventSink
//!                  │ store → network → update task │
//!  Fetcher/System ▶└──────────────────────────────┘ ──▶ JobHandle
//! ```
//!
//! Store failures are fatal (after one erase-and-retry).  Network failures
//! never are.  The update task is spawned exactly once.

use log::{error, info, warn};

use super::events::AppEvent;
use super::ports::{EventSink, FirmwareFetcher, KvStorePort, NetworkPort, SystemPort};
use crate::config::BootConfig;
use crate::error::Result;
use crate::network::{LinkStatus, NetworkBootstrapper};
use crate::ota::job::{JobHandle, UpdateJob};
use crate::ota::runner::UpdateRunner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreInit {
    /// Initialised on the first try.
    Ready,
    /// Erased and re-initialised.
    Recovered,
}

/// Adapters consumed by [`BootSequence::run`].
pub struct BootPorts<K, N, F, S, E> {
    pub store: K,
    pub network: N,
    pub fetcher: F,
    pub system: S,
    pub sink: E,
}

/// What a successful boot hands back to `main`.
pub struct Booted<N> {
    pub store: StoreInit,
    pub link: LinkStatus,
    /// Dropping this tears the station down.
    pub network: N,
    pub job: JobHandle,
}

pub struct BootSequence {
    config: BootConfig,
}

impl BootSequence {
    pub fn new(config: BootConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BootConfig {
        &self.config
    }

    /// Initialise the persistent store, erasing it once if it is full or
    /// from a newer format.
    pub fn init_store(&self, store: &mut impl KvStorePort, sink: &mut impl EventSink) -> Result<StoreInit> {
        let outcome = match store.init() {
            Ok(()) => StoreInit::Ready,
            Err(e) if e.is_recoverable_by_erase() => {
                warn!("NVS: {}, erasing and re-initialising", e);
                store.erase().inspect_err(|e| error!("NVS: erase failed: {}", e))?;
                store.init().inspect_err(|e| error!("NVS: re-init failed: {}", e))?;
                StoreInit::Recovered
            }
            Err(e) => {
                error!("NVS: init failed: {}", e);
                return Err(e.into());
            }
        };
        sink.emit(&AppEvent::StoreReady {
            recovered: outcome == StoreInit::Recovered,
        });
        Ok(outcome)
    }

    pub fn bring_up_network(&self, net: &mut impl NetworkPort, sink: &mut impl EventSink) -> LinkStatus {
        NetworkBootstrapper::new(&self.config.wifi, self.config.connect).bring_up(net, sink)
    }

    /// Move the fetcher and system port into a fresh update task.
    ///
    /// Consumes the sequence: there is no second update task per boot.
    pub fn start_update<F, S, E>(self, fetcher: F, system: S, mut sink: E) -> Result<JobHandle>
    where
        F: FirmwareFetcher + 'static,
        S: SystemPort + 'static,
        E: EventSink + Clone + Send + 'static,
    {
        let runner = UpdateRunner::new(self.config.ota, fetcher, system, sink.clone());
        let job = UpdateJob::spawn(runner, &self.config.task)?;
        sink.emit(&AppEvent::UpdateTaskSpawned);
        Ok(job)
    }

    /// Full boot: store → network → update task.
    pub fn run<K, N, F, S, E>(self, ports: BootPorts<K, N, F, S, E>) -> Result<Booted<N>>
    where
        K: KvStorePort,
        N: NetworkPort,
        F: FirmwareFetcher + 'static,
        S: SystemPort + 'static,
        E: EventSink + Clone + Send + 'static,
    {
        let BootPorts {
            mut store,
            mut network,
            fetcher,
            system,
            mut sink,
        } = ports;

        let store_init = self.init_store(&mut store, &mut sink)?;
        let link = self.bring_up_network(&mut network, &mut sink);
        info!("Boot: store {:?}, link {:?}", store_init, link);
        let job = self.start_update(fetcher, system, sink)?;

        Ok(Booted {
            store: store_init,
            link,
            network,
            job,
        })
    }
}
