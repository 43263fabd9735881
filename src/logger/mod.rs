//! Logger module
//!
//! Provides logging utilities for the shim including:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Operator-facing diagnostics for failed page and asset lookups
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use chrono::Local;
use std::net::SocketAddr;
use std::str::FromStr;

/// Severity, ordered from most to least important
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    const fn label(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warn => "WARN",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" | "trace" => Ok(Self::Debug),
            other => Err(format!("Unknown log level '{other}'")),
        }
    }
}

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let level = config.logging.level.parse::<LogLevel>()?;
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
        level,
    )?;
    Ok(())
}

fn line(level: LogLevel, message: &str) -> String {
    format!(
        "{} [{}] {message}",
        Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z"),
        level.label()
    )
}

fn write(level: LogLevel, message: &str) {
    if !writer::enabled(level) {
        return;
    }
    let line = line(level, message);
    match (writer::get(), level) {
        (Some(w), LogLevel::Error | LogLevel::Warn) => w.write_error(&line),
        (Some(w), _) => w.write_access(&line),
        (None, LogLevel::Error | LogLevel::Warn) => eprintln!("{line}"),
        (None, _) => println!("{line}"),
    }
}

pub fn log_error(message: &str) {
    write(LogLevel::Error, message);
}

pub fn log_warning(message: &str) {
    write(LogLevel::Warn, message);
}

pub fn log_info(message: &str) {
    write(LogLevel::Info, message);
}

pub fn log_debug(message: &str) {
    write(LogLevel::Debug, message);
}

pub fn log_server_start(addr: &SocketAddr, config: &Config, backend: &str) {
    log_info("======================================");
    log_info("Bundle shim started");
    log_info(&format!("Listening on: http://{addr}"));
    log_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        log_info(&format!("Worker threads: {workers}"));
    }
    log_info(&format!("Object store: {backend}"));
    match backend {
        "fs" => {
            if let Some(root) = &config.storage.root {
                log_info(&format!("Bundle root: {root}"));
            }
        }
        _ => {
            if let Some(bucket) = &config.storage.bucket {
                log_info(&format!("Bucket: {bucket}"));
            }
        }
    }
    log_info(&format!("Asset relay: {}/{{id}}/{{asset}}", config.routes.assets_prefix));
    if let Some(ref path) = config.logging.access_log_file {
        log_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        log_info(&format!("Error log: {path}"));
    }
    log_info("======================================");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    log_debug(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    log_error(&format!("[Connection] Failed to serve connection: {err:?}"));
}

pub fn log_headers_count(count: usize, show: bool) {
    if show {
        log_info(&format!("[Headers] Count: {count}"));
    }
}

/// Page lookups that failed for an ordinary reason (bad id, unknown bundle)
pub fn log_page_miss(id: &str, reason: &str) {
    log_info(&format!("[Page] {id}: {reason}"));
}

/// Page lookups that failed inside the store
pub fn log_page_failure(id: &str, error_chain: &str) {
    log_error(&format!("[Page] Error fetching bundle '{id}': {error_chain}"));
}

pub fn log_asset_failure(id: &str, asset: &str, error_chain: &str) {
    log_error(&format!("[Asset] Error fetching '{id}/{asset}': {error_chain}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    let message = entry.format(format);
    match writer::get() {
        Some(w) => w.write_access(&message),
        None => println!("{message}"),
    }
}

pub fn log_shutdown_started(active: usize) {
    log_info(&format!(
        "[Shutdown] Listener closed, waiting for {active} active connection(s)"
    ));
}

pub fn log_shutdown_finished(remaining: usize) {
    if remaining == 0 {
        log_info("[Shutdown] All connections finished");
    } else {
        log_warning(&format!(
            "[Shutdown] Grace period elapsed with {remaining} connection(s) still open"
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_levels() {
        assert_eq!("info".parse::<LogLevel>(), Ok(LogLevel::Info));
        assert_eq!("WARN".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert_eq!("warning".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert_eq!("debug".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Error < LogLevel::Warn);
        assert!(LogLevel::Info < LogLevel::Debug);
    }

    #[test]
    fn test_line_carries_level_label() {
        let line = line(LogLevel::Warn, "disk almost full");
        assert!(line.ends_with(" [WARN] disk almost full"));
    }
}
