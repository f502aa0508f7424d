//! System control adapter: implements [`SystemPort`].

use log::info;

use crate::app::ports::SystemPort;

#[cfg(not(target_os = "espidf"))]
use std::sync::Arc;
#[cfg(not(target_os = "espidf"))]
use std::sync::atomic::{AtomicU32, Ordering};

/// On the host, restarts are counted instead of performed.  Clones share
/// the counter so a test can observe a port that moved into the update task.
#[derive(Clone, Default)]
pub struct EspSystem {
    #[cfg(not(target_os = "espidf"))]
    restarts: Arc<AtomicU32>,
}

impl EspSystem {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn restart_count(&self) -> u32 {
        self.restarts.load(Ordering::SeqCst)
    }
}

impl SystemPort for EspSystem {
    #[cfg(target_os = "espidf")]
    fn restart(&mut self) {
        info!("SYS: esp_restart");
        esp_ota::restart();
    }

    #[cfg(not(target_os = "espidf"))]
    fn restart(&mut self) {
        let n = self.restarts.fetch_add(1, Ordering::SeqCst) + 1;
        info!("SYS(sim): restart #{}", n);
    }
}
