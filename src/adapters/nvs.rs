//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`KvStorePort`].  This firmware stores nothing of its own in
//! NVS; the WiFi driver keeps PHY calibration and station state there, so
//! the partition must be initialised before the station starts.
//!
//! - **`target_os = "espidf"`**: `nvs_flash_init` / `nvs_flash_erase`.
//! - **all other targets**: replays a scripted list of init results.

use log::info;

use crate::app::ports::{KvStorePort, StoreError};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::{
    ESP_ERR_NVS_NEW_VERSION_FOUND, ESP_ERR_NVS_NO_FREE_PAGES, ESP_OK, esp_err_t, nvs_flash_erase,
    nvs_flash_init,
};

#[cfg(not(target_os = "espidf"))]
use std::collections::VecDeque;

#[cfg(target_os = "espidf")]
fn map_err(ret: esp_err_t) -> Result<(), StoreError> {
    match ret {
        ESP_OK => Ok(()),
        ESP_ERR_NVS_NO_FREE_PAGES => Err(StoreError::NoFreePages),
        ESP_ERR_NVS_NEW_VERSION_FOUND => Err(StoreError::NewVersionFound),
        other => Err(StoreError::Io(other)),
    }
}

pub struct NvsStore {
    #[cfg(not(target_os = "espidf"))]
    script: VecDeque<Result<(), StoreError>>,
    #[cfg(not(target_os = "espidf"))]
    init_calls: u32,
    #[cfg(not(target_os = "espidf"))]
    erase_calls: u32,
}

impl NvsStore {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            script: VecDeque::new(),
            #[cfg(not(target_os = "espidf"))]
            init_calls: 0,
            #[cfg(not(target_os = "espidf"))]
            erase_calls: 0,
        }
    }

    /// Simulation: successive `init()` calls return these results, then `Ok`.
    #[cfg(not(target_os = "espidf"))]
    pub fn scripted(results: impl IntoIterator<Item = Result<(), StoreError>>) -> Self {
        Self {
            script: results.into_iter().collect(),
            ..Self::new()
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn init_calls(&self) -> u32 {
        self.init_calls
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn erase_calls(&self) -> u32 {
        self.erase_calls
    }
}

impl Default for NvsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStorePort for NvsStore {
    #[cfg(target_os = "espidf")]
    fn init(&mut self) -> Result<(), StoreError> {
        // SAFETY: called from the boot task before any other NVS user exists.
        let ret = unsafe { nvs_flash_init() };
        map_err(ret)?;
        info!("NvsStore: default partition initialised");
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn init(&mut self) -> Result<(), StoreError> {
        self.init_calls += 1;
        let ret = self.script.pop_front().unwrap_or(Ok(()));
        if ret.is_ok() {
            info!("NvsStore(sim): initialised");
        }
        ret
    }

    #[cfg(target_os = "espidf")]
    fn erase(&mut self) -> Result<(), StoreError> {
        // SAFETY: as for init; no NVS handles are open yet.
        let ret = unsafe { nvs_flash_erase() };
        map_err(ret)?;
        info!("NvsStore: default partition erased");
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn erase(&mut self) -> Result<(), StoreError> {
        self.erase_calls += 1;
        info!("NvsStore(sim): erased");
        Ok(())
    }
}
