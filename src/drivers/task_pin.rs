//! Core-pinned task spawning.
//!
//! ESP-IDF implements `std::thread` on top of pthreads, which are thin
//! FreeRTOS tasks.  `esp_pthread_set_cfg()` sets a thread-local config
//! that applies to the *next* `pthread_create()` from the calling thread,
//! so the config→spawn pair must not interleave with other spawns on the
//! same thread.  Off-target the core and priority are ignored.

use serde::{Deserialize, Serialize};

/// CPU core identifiers for the dual-core Xtensa parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum Core {
    /// Core 0 (PRO_CPU), shared with WiFi and lwIP.
    Pro = 0,
    /// Core 1 (APP_CPU).
    App = 1,
}

/// Spawn `f` as a FreeRTOS task pinned to `core`.
///
/// `name` must be NUL-terminated (e.g. `"ota_update_task\0"`).
#[cfg(target_os = "espidf")]
pub fn spawn_on_core<F>(
    core: Core,
    priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: F,
) -> std::io::Result<std::thread::JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    // SAFETY: the config struct is fully initialised by the default
    // constructor and `name` outlives the spawn (it is 'static).
    let ret = unsafe {
        let mut cfg = esp_idf_sys::esp_create_default_pthread_config();
        cfg.pin_to_core = core as i32;
        cfg.prio = priority as i32;
        cfg.stack_size = (stack_kb * 1024) as _;
        cfg.thread_name = name.as_ptr().cast();
        esp_idf_sys::esp_pthread_set_cfg(&cfg)
    };
    if ret != esp_idf_sys::ESP_OK as i32 {
        return Err(std::io::Error::other(format!(
            "esp_pthread_set_cfg failed: {ret}"
        )));
    }

    let display_name = name.trim_end_matches('\0');
    log::info!(
        "Spawning '{}' on {:?} (pri={}, stack={}KB)",
        display_name,
        core,
        priority,
        stack_kb
    );

    // std passes its own stack size to pthread_create, overriding the cfg.
    std::thread::Builder::new()
        .name(display_name.into())
        .stack_size(stack_kb * 1024)
        .spawn(f)
}

/// Simulation fallback.
#[cfg(not(target_os = "espidf"))]
pub fn spawn_on_core<F>(
    _core: Core,
    _priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: F,
) -> std::io::Result<std::thread::JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    let display_name = name.trim_end_matches('\0');
    log::info!("Spawning '{}' (sim, stack={}KB)", display_name, stack_kb);

    // Host threads need more headroom than the firmware task.
    std::thread::Builder::new()
        .name(display_name.into())
        .stack_size(stack_kb.max(64) * 1024)
        .spawn(f)
}
