//! Network Bootstrapper: bring the WiFi station up before the update task runs.
//!
//! Whether to wait for association is a [`ConnectPolicy`] decision.  Neither
//! a failed start nor a timeout stops the boot: the update task is scheduled
//! either way and its HTTP client fails cleanly if the link never comes up.

use std::time::{Duration, Instant};

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{ConnectivityError, EventSink, NetworkPort};
use crate::config::{ConnectPolicy, WifiCredentials};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// Driver started; association not awaited.
    Pending,
    Associated,
    TimedOut,
    StartFailed(ConnectivityError),
}

pub struct NetworkBootstrapper<'a> {
    credentials: &'a WifiCredentials,
    policy: ConnectPolicy,
}

impl<'a> NetworkBootstrapper<'a> {
    pub fn new(credentials: &'a WifiCredentials, policy: ConnectPolicy) -> Self {
        Self {
            credentials,
            policy,
        }
    }

    pub fn bring_up(&self, net: &mut impl NetworkPort, sink: &mut impl EventSink) -> LinkStatus {
        info!("WiFi: starting station for '{}'", self.credentials.ssid());
        if let Err(e) = net.start_station(self.credentials) {
            warn!("WiFi: station start failed ({}), continuing without link", e);
            sink.emit(&AppEvent::LinkStartFailed(e));
            return LinkStatus::StartFailed(e);
        }

        sink.emit(&AppEvent::StationStarted {
            ssid: self.credentials.ssid_string(),
        });

        match self.policy {
            ConnectPolicy::FireAndForget => {
                info!("WiFi: not waiting for association");
                LinkStatus::Pending
            }
            ConnectPolicy::WaitForAssociation {
                timeout_ms,
                poll_ms,
            } => wait_for_association(&*net, sink, timeout_ms, poll_ms),
        }
    }
}

fn wait_for_association(
    net: &impl NetworkPort,
    sink: &mut impl EventSink,
    timeout_ms: u32,
    poll_ms: u32,
) -> LinkStatus {
    let started = Instant::now();
    let timeout = Duration::from_millis(timeout_ms as u64);
    let poll = Duration::from_millis(poll_ms.max(1) as u64);

    loop {
        let elapsed = started.elapsed();
        let waited_ms = elapsed.as_millis().min(u32::MAX as u128) as u32;
        if net.is_associated() {
            info!("WiFi: associated after {} ms", waited_ms);
            sink.emit(&AppEvent::LinkUp { waited_ms });
            return LinkStatus::Associated;
        }
        if elapsed >= timeout {
            warn!("WiFi: no association after {} ms, continuing", waited_ms);
            sink.emit(&AppEvent::LinkTimedOut { waited_ms });
            return LinkStatus::TimedOut;
        }
        std::thread::sleep(poll);
    }
}
