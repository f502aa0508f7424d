//! Recording mocks for the port traits.
//!
//! Ports move into the update task, so every mock keeps its record behind
//! an `Arc` and hands out clones as observers.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use ota_basic::app::events::AppEvent;
use ota_basic::app::ports::{
    ConnectivityError, EventSink, FirmwareFetcher, KvStorePort, NetworkPort, StoreError, SystemPort,
};
use ota_basic::config::{OtaRequest, WifiCredentials};
use ota_basic::ota::{FlashReport, OtaError};

// ── Log capture ───────────────────────────────────────────────

/// Global `log` backend that keeps every formatted line for inspection.
/// Tests run in parallel, so assertions should look for lines unique to
/// the scenario under test.
pub struct CapturedLog;

static CAPTURED: Mutex<Vec<String>> = Mutex::new(Vec::new());
static LOGGER: CapturedLog = CapturedLog;

impl log::Log for CapturedLog {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        CAPTURED
            .lock()
            .unwrap()
            .push(format!("{} {}", record.level(), record.args()));
    }

    fn flush(&self) {}
}

impl CapturedLog {
    pub fn install() {
        static ONCE: std::sync::Once = std::sync::Once::new();
        ONCE.call_once(|| {
            log::set_logger(&LOGGER).unwrap();
            log::set_max_level(log::LevelFilter::Trace);
        });
    }

    pub fn lines_containing(needle: &str) -> Vec<String> {
        CAPTURED
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.contains(needle))
            .cloned()
            .collect()
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<AppEvent>>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn events(&self) -> Vec<AppEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

// ── Fetcher ───────────────────────────────────────────────────

#[derive(Clone)]
pub struct ScriptedFetcher {
    result: Result<FlashReport, OtaError>,
    calls: Arc<AtomicU32>,
    urls: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl ScriptedFetcher {
    pub fn succeeding(bytes: u32) -> Self {
        Self::with_result(Ok(FlashReport {
            bytes_written: bytes,
            sha256: [0x5A; 32],
        }))
    }

    pub fn failing(e: OtaError) -> Self {
        Self::with_result(Err(e))
    }

    fn with_result(result: Result<FlashReport, OtaError>) -> Self {
        Self {
            result,
            calls: Arc::new(AtomicU32::new(0)),
            urls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

impl FirmwareFetcher for ScriptedFetcher {
    fn fetch_and_flash(&mut self, request: &OtaRequest) -> Result<FlashReport, OtaError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(request.url().to_owned());
        self.result
    }
}

// ── System ────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct CountingSystem {
    restarts: Arc<AtomicU32>,
}

impl CountingSystem {
    pub fn restarts(&self) -> u32 {
        self.restarts.load(Ordering::SeqCst)
    }
}

impl SystemPort for CountingSystem {
    fn restart(&mut self) {
        self.restarts.fetch_add(1, Ordering::SeqCst);
    }
}

// ── Store ─────────────────────────────────────────────────────

/// Every `init()` returns `fail` until `ok_after_erases` erases happened.
pub struct CorruptStore {
    pub fail: StoreError,
    pub ok_after_erases: u32,
    pub inits: u32,
    pub erases: u32,
}

#[allow(dead_code)]
impl CorruptStore {
    pub fn new(fail: StoreError, ok_after_erases: u32) -> Self {
        Self {
            fail,
            ok_after_erases,
            inits: 0,
            erases: 0,
        }
    }
}

impl KvStorePort for CorruptStore {
    fn init(&mut self) -> Result<(), StoreError> {
        self.inits += 1;
        if self.erases >= self.ok_after_erases {
            Ok(())
        } else {
            Err(self.fail)
        }
    }

    fn erase(&mut self) -> Result<(), StoreError> {
        self.erases += 1;
        Ok(())
    }
}

// ── Network ───────────────────────────────────────────────────

/// Records which credentials the station was started with.
#[derive(Default)]
pub struct RecordingNetwork {
    pub started_with: Vec<(String, String)>,
    pub fail: Option<ConnectivityError>,
}

impl NetworkPort for RecordingNetwork {
    fn start_station(&mut self, credentials: &WifiCredentials) -> Result<(), ConnectivityError> {
        self.started_with
            .push((credentials.ssid().to_owned(), credentials.password().to_owned()));
        match self.fail {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn is_associated(&self) -> bool {
        self.fail.is_none()
    }
}
