//! Process-wide diagnostic channel
//!
//! The shader manager, the reflection printer and the Vulkan passes never
//! write to stdout directly: every message goes through `Engine::log`, which
//! forwards it to the installed [`Logger`]. A host application (editor, test
//! harness, tool) redirects all engine output by calling `Engine::set_logger`.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{OnceLock, RwLock};
use std::time::SystemTime;
use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};

static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Entries below this severity are dropped before reaching the logger
static MIN_SEVERITY: AtomicU8 = AtomicU8::new(0);

fn logger_slot() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)))
}

fn severity_rank(severity: LogSeverity) -> u8 {
    match severity {
        LogSeverity::Trace => 0,
        LogSeverity::Debug => 1,
        LogSeverity::Info => 2,
        LogSeverity::Warn => 3,
        LogSeverity::Error => 4,
    }
}

fn severity_from_rank(rank: u8) -> LogSeverity {
    match rank {
        0 => LogSeverity::Trace,
        1 => LogSeverity::Debug,
        2 => LogSeverity::Info,
        3 => LogSeverity::Warn,
        _ => LogSeverity::Error,
    }
}

/// Logging front shared by both crates
///
/// ```no_run
/// use umbra_engine::umbra::Engine;
/// use umbra_engine::umbra::log::{Logger, LogEntry, LogSeverity};
///
/// struct Console;
///
/// impl Logger for Console {
///     fn log(&self, entry: &LogEntry) {
///         eprintln!("{}: {}", entry.source, entry.message);
///     }
/// }
///
/// Engine::set_logger(Console);
/// Engine::set_min_severity(LogSeverity::Info);
/// ```
pub struct Engine;

impl Engine {
    /// Route every later entry to `logger`
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        if let Ok(mut slot) = logger_slot().write() {
            *slot = Box::new(logger);
        }
    }

    /// Back to stdout output with no severity filter
    pub fn reset_logger() {
        Self::set_logger(DefaultLogger);
        MIN_SEVERITY.store(severity_rank(LogSeverity::Trace), Ordering::Relaxed);
    }

    /// Drop every entry whose severity is lower than `severity`
    pub fn set_min_severity(severity: LogSeverity) {
        MIN_SEVERITY.store(severity_rank(severity), Ordering::Relaxed);
    }

    /// Current minimum severity
    pub fn min_severity() -> LogSeverity {
        severity_from_rank(MIN_SEVERITY.load(Ordering::Relaxed))
    }

    /// Entry point of the `engine_*!` macros; `source` names the emitting
    /// component, e.g. `"umbra::ShaderManager"`
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        Self::dispatch(severity, source, message, None, None);
    }

    /// Same as [`Engine::log`], recording the call site as well
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        Self::dispatch(severity, source, message, Some(file), Some(line));
    }

    fn dispatch(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: Option<&'static str>,
        line: Option<u32>,
    ) {
        if severity < Self::min_severity() {
            return;
        }
        let entry = LogEntry {
            timestamp: SystemTime::now(),
            source: source.to_owned(),
            severity,
            message,
            file,
            line,
        };
        if let Ok(sink) = logger_slot().read() {
            sink.log(&entry);
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
