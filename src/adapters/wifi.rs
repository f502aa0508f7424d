//! WiFi station-mode adapter.
//!
//! Implements [`NetworkPort`].
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver calls via `esp_idf_svc::wifi`.
//! - **all other targets**: simulation stubs for host-side tests.
//!
//! The driver is created lazily in `start_station`, after the boot
//! sequence has initialised NVS, because `EspWifi` keeps its calibration
//! data in the default NVS partition.

use log::{error, info};

use crate::app::ports::{ConnectivityError, NetworkPort};
use crate::config::{AuthMode, WifiCredentials};
use crate::platform::PlatformContext;

#[cfg(target_os = "espidf")]
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::modem::Modem,
    nvs::EspDefaultNvsPartition,
    wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi},
};

#[cfg(not(target_os = "espidf"))]
use core::cell::Cell;

#[cfg(target_os = "espidf")]
fn auth_method(mode: AuthMode) -> AuthMethod {
    match mode {
        AuthMode::Open => AuthMethod::None,
        AuthMode::Wpa2Personal => AuthMethod::WPA2Personal,
        AuthMode::Wpa2Wpa3Personal => AuthMethod::WPA2WPA3Personal,
        AuthMode::Wpa3Personal => AuthMethod::WPA3Personal,
    }
}

pub struct WifiAdapter {
    #[cfg(target_os = "espidf")]
    modem: Option<Modem>,
    #[cfg(target_os = "espidf")]
    sysloop: EspSystemEventLoop,
    #[cfg(target_os = "espidf")]
    wifi: Option<EspWifi<'static>>,

    /// Simulation: association reported after this many polls; `None` = never.
    #[cfg(not(target_os = "espidf"))]
    associate_after: Option<u32>,
    #[cfg(not(target_os = "espidf"))]
    start_result: Result<(), ConnectivityError>,
    #[cfg(not(target_os = "espidf"))]
    polls: Cell<u32>,
    #[cfg(not(target_os = "espidf"))]
    starts: u32,
    #[cfg(not(target_os = "espidf"))]
    last_auth: Option<AuthMode>,
}

impl WifiAdapter {
    /// Claim the modem from the platform context.
    #[cfg(target_os = "espidf")]
    pub fn new(ctx: &mut PlatformContext) -> Result<Self, ConnectivityError> {
        let modem = ctx.take_modem().ok_or(ConnectivityError::ModemUnavailable)?;
        Ok(Self {
            modem: Some(modem),
            sysloop: ctx.sysloop(),
            wifi: None,
        })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(ctx: &mut PlatformContext) -> Result<Self, ConnectivityError> {
        ctx.take_modem().ok_or(ConnectivityError::ModemUnavailable)?;
        Ok(Self {
            associate_after: Some(0),
            start_result: Ok(()),
            polls: Cell::new(0),
            starts: 0,
            last_auth: None,
        })
    }

    /// Simulation: report association only after `polls` polls.
    #[cfg(not(target_os = "espidf"))]
    pub fn associating_after(mut self, polls: u32) -> Self {
        self.associate_after = Some(polls);
        self
    }

    /// Simulation: the AP never answers.
    #[cfg(not(target_os = "espidf"))]
    pub fn never_associating(mut self) -> Self {
        self.associate_after = None;
        self
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn with_start_failure(mut self, e: ConnectivityError) -> Self {
        self.start_result = Err(e);
        self
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn starts(&self) -> u32 {
        self.starts
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn polls(&self) -> u32 {
        self.polls.get()
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn last_auth(&self) -> Option<AuthMode> {
        self.last_auth
    }
}

impl NetworkPort for WifiAdapter {
    #[cfg(target_os = "espidf")]
    fn start_station(&mut self, credentials: &WifiCredentials) -> Result<(), ConnectivityError> {
        if self.wifi.is_none() {
            let modem = self.modem.take().ok_or(ConnectivityError::ModemUnavailable)?;
            let nvs = EspDefaultNvsPartition::take().map_err(|e| {
                error!("WiFi: NVS partition unavailable: {}", e);
                ConnectivityError::DriverInit
            })?;
            let wifi = EspWifi::new(modem, self.sysloop.clone(), Some(nvs)).map_err(|e| {
                error!("WiFi: driver init failed: {}", e);
                ConnectivityError::DriverInit
            })?;
            self.wifi = Some(wifi);
        }
        let wifi = self.wifi.as_mut().ok_or(ConnectivityError::DriverInit)?;

        let client = ClientConfiguration {
            ssid: credentials
                .ssid()
                .try_into()
                .map_err(|_| ConnectivityError::Configuration)?,
            password: credentials
                .password()
                .try_into()
                .map_err(|_| ConnectivityError::Configuration)?,
            auth_method: auth_method(credentials.min_auth()),
            ..Default::default()
        };
        wifi.set_configuration(&Configuration::Client(client))
            .map_err(|e| {
                error!("WiFi: set_configuration failed: {}", e);
                ConnectivityError::Configuration
            })?;

        wifi.start().map_err(|e| {
            error!("WiFi: start failed: {}", e);
            ConnectivityError::StartFailed
        })?;
        wifi.connect().map_err(|e| {
            error!("WiFi: connect failed: {}", e);
            ConnectivityError::ConnectFailed
        })?;

        info!("WiFi: station started, associating with '{}'", credentials.ssid());
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn start_station(&mut self, credentials: &WifiCredentials) -> Result<(), ConnectivityError> {
        self.starts += 1;
        self.last_auth = Some(credentials.min_auth());
        if let Err(e) = self.start_result {
            error!("WiFi(sim): start failed: {}", e);
            return Err(e);
        }
        info!("WiFi(sim): station started for '{}'", credentials.ssid());
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn is_associated(&self) -> bool {
        self.wifi
            .as_ref()
            .is_some_and(|w| w.is_up().unwrap_or(false))
    }

    #[cfg(not(target_os = "espidf"))]
    fn is_associated(&self) -> bool {
        if self.starts == 0 || self.start_result.is_err() {
            return false;
        }
        let n = self.polls.get();
        self.polls.set(n + 1);
        self.associate_after.is_some_and(|after| n >= after)
    }
}
