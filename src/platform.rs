//! Process-wide SDK state as an explicit context object.
//!
//! ESP-IDF keeps the network stack, default event loop and peripheral
//! ownership in global singletons.  [`PlatformContext::take`] claims them
//! once at boot; components that need one receive `&mut PlatformContext`
//! instead of reaching for globals.

use log::info;

use crate::error::Result;
#[cfg(target_os = "espidf")]
use crate::error::Error;

#[cfg(target_os = "espidf")]
use esp_idf_svc::{eventloop::EspSystemEventLoop, hal::modem::Modem, hal::peripherals::Peripherals};

pub struct PlatformContext {
    #[cfg(target_os = "espidf")]
    modem: Option<Modem>,
    #[cfg(target_os = "espidf")]
    sysloop: EspSystemEventLoop,
    #[cfg(not(target_os = "espidf"))]
    modem_taken: bool,
}

impl PlatformContext {
    /// Claim peripherals and create the default system event loop.
    /// Fails if called twice in one process.
    #[cfg(target_os = "espidf")]
    pub fn take() -> Result<Self> {
        let peripherals = Peripherals::take().map_err(|e| {
            log::error!("Peripherals::take failed: {}", e);
            Error::Init("peripherals already taken")
        })?;
        let sysloop = EspSystemEventLoop::take().map_err(|e| {
            log::error!("EspSystemEventLoop::take failed: {}", e);
            Error::Init("system event loop")
        })?;
        info!("Platform: peripherals and system event loop claimed");
        Ok(Self {
            modem: Some(peripherals.modem),
            sysloop,
        })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn take() -> Result<Self> {
        info!("Platform: simulation context");
        Ok(Self { modem_taken: false })
    }

    /// Hand the modem to the WiFi driver.  `None` once taken.
    #[cfg(target_os = "espidf")]
    pub fn take_modem(&mut self) -> Option<Modem> {
        self.modem.take()
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn take_modem(&mut self) -> Option<()> {
        if self.modem_taken {
            return None;
        }
        self.modem_taken = true;
        Some(())
    }

    #[cfg(target_os = "espidf")]
    pub fn sysloop(&self) -> EspSystemEventLoop {
        self.sysloop.clone()
    }
}
