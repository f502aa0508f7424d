//! End-to-end boot flow: store → network → update task → restart.
//!
//! Uses the crate's own simulation adapters where they exist and the
//! recording mocks from `mock_ports` where a test needs to observe a port
//! after it moved into the update task.

use ota_basic::adapters::http_source::HttpImageSource;
use ota_basic::adapters::log_sink::LogEventSink;
use ota_basic::adapters::nvs::NvsStore;
use ota_basic::adapters::ota_partition::OtaPartition;
use ota_basic::adapters::system::EspSystem;
use ota_basic::adapters::wifi::WifiAdapter;
use ota_basic::app::events::AppEvent;
use ota_basic::app::ports::{ConnectivityError, StoreError};
use ota_basic::app::service::{BootPorts, BootSequence, StoreInit};
use ota_basic::config::{AuthMode, BootConfig, ConnectPolicy, OtaRequest, WifiCredentials};
use ota_basic::error::Error;
use ota_basic::network::LinkStatus;
use ota_basic::ota::stream::StreamingFetcher;
use ota_basic::ota::{OtaError, UpdateOutcome};
use ota_basic::platform::PlatformContext;

use crate::mock_ports::{CapturedLog, CorruptStore, CountingSystem, RecordingNetwork, RecordingSink, ScriptedFetcher};

const URL: &str = "http://192.168.1.10:8000/firmware.bin";

fn config(policy: ConnectPolicy) -> BootConfig {
    let mut cfg = BootConfig::new(
        WifiCredentials::new("HomeNet", "hunter2hunter2", AuthMode::Wpa2Personal).unwrap(),
        OtaRequest::new(URL).unwrap(),
    );
    cfg.connect = policy;
    cfg
}

fn quick_wait() -> ConnectPolicy {
    ConnectPolicy::WaitForAssociation {
        timeout_ms: 50,
        poll_ms: 1,
    }
}

fn image() -> Vec<u8> {
    (0..10_000u32).map(|i| (i % 253) as u8).collect()
}

// ── Scenario: full store, successful update ───────────────────

#[test]
fn full_store_is_recovered_and_update_restarts() {
    let mut platform = PlatformContext::take().unwrap();
    let system = EspSystem::new();
    let sink = RecordingSink::default();

    let ports = BootPorts {
        store: NvsStore::scripted([Err(StoreError::NoFreePages)]),
        network: WifiAdapter::new(&mut platform).unwrap().associating_after(2),
        fetcher: StreamingFetcher::new(HttpImageSource::serving(image()), OtaPartition::new()),
        system: system.clone(),
        sink: sink.clone(),
    };

    let booted = BootSequence::new(config(quick_wait())).run(ports).unwrap();
    assert_eq!(booted.store, StoreInit::Recovered);
    assert_eq!(booted.link, LinkStatus::Associated);
    assert_eq!(booted.network.starts(), 1);

    let outcome = booted.job.join();
    let UpdateOutcome::Rebooting(report) = outcome else {
        panic!("expected success, got {outcome:?}");
    };
    assert_eq!(report.bytes_written, 10_000);
    assert_eq!(report.sha256, hmac_sha256::Hash::hash(&image()));
    assert_eq!(system.restart_count(), 1);

    let events = sink.events();
    assert_eq!(events[0], AppEvent::StoreReady { recovered: true });
    assert!(matches!(&events[1], AppEvent::StationStarted { ssid } if ssid.as_str() == "HomeNet"));
    assert!(events.contains(&AppEvent::UpdateTaskSpawned));
    assert!(events.contains(&AppEvent::UpdateStarted));
    assert!(events.contains(&AppEvent::UpdateSucceeded(report)));
    assert_eq!(events.last(), Some(&AppEvent::Restarting));
}

#[test]
fn station_is_started_with_compiled_in_credentials() {
    let cfg = BootConfig::compiled_in().unwrap();
    let (ssid, pass) = (cfg.wifi.ssid().to_owned(), cfg.wifi.password().to_owned());
    let fetcher = ScriptedFetcher::succeeding(1);

    let ports = BootPorts {
        store: CorruptStore::new(StoreError::NoFreePages, 1),
        network: RecordingNetwork::default(),
        fetcher: fetcher.clone(),
        system: CountingSystem::default(),
        sink: RecordingSink::default(),
    };
    let booted = BootSequence::new(cfg).run(ports).unwrap();
    assert_eq!(booted.network.started_with, vec![(ssid, pass)]);

    booted.job.join();
    assert_eq!(fetcher.urls(), vec![ota_basic::config::FIRMWARE_URL.to_owned()]);
}

// ── Scenario: transport error, no restart ─────────────────────

#[test]
fn transport_error_logs_failure_and_never_restarts() {
    let mut platform = PlatformContext::take().unwrap();
    let system = EspSystem::new();
    let sink = RecordingSink::default();

    let ports = BootPorts {
        store: NvsStore::new(),
        network: WifiAdapter::new(&mut platform).unwrap(),
        fetcher: StreamingFetcher::new(
            HttpImageSource::serving(image()).unreachable(),
            OtaPartition::new(),
        ),
        system: system.clone(),
        sink: sink.clone(),
    };

    let booted = BootSequence::new(config(quick_wait())).run(ports).unwrap();
    assert_eq!(
        booted.job.join(),
        UpdateOutcome::Failed(OtaError::Transport)
    );
    assert_eq!(system.restart_count(), 0);
    assert_eq!(sink.count(|e| *e == AppEvent::UpdateFailed(OtaError::Transport)), 1);
    assert_eq!(sink.count(|e| *e == AppEvent::Restarting), 0);
}

#[test]
fn failed_update_is_written_to_the_log() {
    CapturedLog::install();
    let mut platform = PlatformContext::take().unwrap();
    let system = EspSystem::new();

    // 418 is not served by any other scenario, so the lines below are ours.
    let ports = BootPorts {
        store: NvsStore::new(),
        network: WifiAdapter::new(&mut platform).unwrap(),
        fetcher: StreamingFetcher::new(
            HttpImageSource::serving(image()).with_status(418),
            OtaPartition::new(),
        ),
        system: system.clone(),
        sink: LogEventSink::new(),
    };

    let booted = BootSequence::new(config(quick_wait())).run(ports).unwrap();
    assert_eq!(
        booted.job.join(),
        UpdateOutcome::Failed(OtaError::HttpStatus(418))
    );
    assert_eq!(system.restart_count(), 0);

    let failed = CapturedLog::lines_containing("OTA | failed: server returned HTTP 418");
    assert_eq!(failed.len(), 1, "{failed:?}");
    assert!(failed[0].starts_with("ERROR"));
    assert_eq!(
        CapturedLog::lines_containing("OTA Update Failed: server returned HTTP 418").len(),
        1
    );
}

// ── Store recovery is bounded ─────────────────────────────────

#[test]
fn persistently_corrupt_store_gives_up_after_one_erase() {
    for fail in [StoreError::NoFreePages, StoreError::NewVersionFound] {
        let fetcher = ScriptedFetcher::succeeding(1);
        let ports = BootPorts {
            store: CorruptStore::new(fail, u32::MAX),
            network: RecordingNetwork::default(),
            fetcher: fetcher.clone(),
            system: CountingSystem::default(),
            sink: RecordingSink::default(),
        };
        let err = BootSequence::new(config(ConnectPolicy::FireAndForget))
            .run(ports)
            .err()
            .unwrap();
        assert_eq!(err, Error::Store(fail));
        assert_eq!(fetcher.calls(), 0, "no update task after a fatal store error");
    }
}

#[test]
fn unrecoverable_store_error_is_not_erased() {
    let mut store = CorruptStore::new(StoreError::Io(0x1105), u32::MAX);
    let boot = BootSequence::new(config(ConnectPolicy::FireAndForget));
    assert!(boot.init_store(&mut store, &mut RecordingSink::default()).is_err());
    assert_eq!((store.inits, store.erases), (1, 0));
}

// ── Update task is spawned exactly once ───────────────────────

#[test]
fn update_task_spawns_once_whatever_the_link() {
    let failures = [
        None,
        Some(ConnectivityError::DriverInit),
        Some(ConnectivityError::StartFailed),
        Some(ConnectivityError::ConnectFailed),
    ];
    for fail in failures {
        let fetcher = ScriptedFetcher::failing(OtaError::Transport);
        let sink = RecordingSink::default();
        let ports = BootPorts {
            store: CorruptStore::new(StoreError::NoFreePages, 0),
            network: RecordingNetwork {
                fail,
                ..Default::default()
            },
            fetcher: fetcher.clone(),
            system: CountingSystem::default(),
            sink: sink.clone(),
        };
        let booted = BootSequence::new(config(quick_wait())).run(ports).unwrap();
        booted.job.join();

        assert_eq!(sink.count(|e| *e == AppEvent::UpdateTaskSpawned), 1);
        assert_eq!(fetcher.calls(), 1, "link failure {fail:?}");
    }
}

#[test]
fn update_task_spawns_after_association_timeout() {
    let mut platform = PlatformContext::take().unwrap();
    let fetcher = ScriptedFetcher::succeeding(1);
    let ports = BootPorts {
        store: NvsStore::new(),
        network: WifiAdapter::new(&mut platform).unwrap().never_associating(),
        fetcher: fetcher.clone(),
        system: CountingSystem::default(),
        sink: RecordingSink::default(),
    };
    let booted = BootSequence::new(config(quick_wait())).run(ports).unwrap();
    assert_eq!(booted.link, LinkStatus::TimedOut);
    booted.job.join();
    assert_eq!(fetcher.calls(), 1);
}

// ── Restart only on success, never a retry ────────────────────

#[test]
fn success_always_restarts_exactly_once() {
    let system = CountingSystem::default();
    let ports = BootPorts {
        store: CorruptStore::new(StoreError::NoFreePages, 0),
        network: RecordingNetwork::default(),
        fetcher: ScriptedFetcher::succeeding(4096),
        system: system.clone(),
        sink: RecordingSink::default(),
    };
    let booted = BootSequence::new(config(ConnectPolicy::FireAndForget)).run(ports).unwrap();
    assert!(booted.job.join().is_success());
    assert_eq!(system.restarts(), 1);
}

#[test]
fn failures_never_restart_or_retry() {
    let failures = [
        OtaError::Transport,
        OtaError::HttpStatus(404),
        OtaError::EmptyImage,
        OtaError::ImageTooLarge,
        OtaError::SizeMismatch {
            expected: 10,
            actual: 9,
        },
        OtaError::DigestMismatch,
        OtaError::BeginFailed,
        OtaError::WriteFailed,
        OtaError::VerifyFailed,
        OtaError::BootSetFailed,
    ];
    for e in failures {
        let fetcher = ScriptedFetcher::failing(e);
        let system = CountingSystem::default();
        let ports = BootPorts {
            store: CorruptStore::new(StoreError::NoFreePages, 0),
            network: RecordingNetwork::default(),
            fetcher: fetcher.clone(),
            system: system.clone(),
            sink: RecordingSink::default(),
        };
        let booted = BootSequence::new(config(ConnectPolicy::FireAndForget)).run(ports).unwrap();
        assert_eq!(booted.job.join(), UpdateOutcome::Failed(e));
        assert_eq!(system.restarts(), 0, "{e}");
        assert_eq!(fetcher.calls(), 1, "{e}");
    }
}
