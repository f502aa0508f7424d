//! Console logger for host builds.
//!
//! On the device `esp_idf_logger` owns the `log` facade.  The simulation
//! binary installs [`init`] instead so the same `info!`/`error!` lines reach
//! stderr.  `OTA_LOG` (`error`..`trace`) overrides the default level.

use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Instant;

use log::{Level, LevelFilter, Metadata, Record};

static START: OnceLock<Instant> = OnceLock::new();
static LOGGER: HostLogger = HostLogger;

struct HostLogger;

impl log::Log for HostLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let elapsed = START.get_or_init(Instant::now).elapsed();
        eprintln!(
            "{:>4}.{:03}s {}",
            elapsed.as_secs(),
            elapsed.subsec_millis(),
            format_line(record.level(), record.module_path(), &record.args().to_string())
        );
    }

    fn flush(&self) {}
}

/// `[I] service      | message`, module trimmed to its last segment.
fn format_line(level: Level, module_path: Option<&str>, message: &str) -> String {
    let tag = match level {
        Level::Error => 'E',
        Level::Warn => 'W',
        Level::Info => 'I',
        Level::Debug => 'D',
        Level::Trace => 'T',
    };
    let module = module_path
        .and_then(|m| m.rsplit("::").next())
        .unwrap_or("unknown");
    format!("[{}] {:<12} | {}", tag, module, message)
}

fn level_from_env(raw: Option<&str>, default: LevelFilter) -> LevelFilter {
    raw.and_then(|v| LevelFilter::from_str(v.trim()).ok())
        .unwrap_or(default)
}

/// Install the host logger.  Fails if another logger is already set.
pub fn init(default: LevelFilter) -> Result<(), log::SetLoggerError> {
    START.get_or_init(Instant::now);
    log::set_logger(&LOGGER)?;
    let level = level_from_env(std::env::var("OTA_LOG").ok().as_deref(), default);
    log::set_max_level(level);
    Ok(())
}
