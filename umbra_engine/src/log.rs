//! Engine log channel
//!
//! Everything the shader tooling reports (compiler diagnostics, reflection
//! dumps, cache activity, Vulkan failures) goes through [`Engine::log`] and
//! ends up in the installed [`Logger`]. The default sink prints colored lines
//! to stdout; a host replaces it with [`Engine::set_logger`] to capture them.
//!
//! [`Engine::log`]: crate::umbra::Engine::log
//! [`Engine::set_logger`]: crate::umbra::Engine::set_logger

use chrono::{DateTime, Local};
use colored::{ColoredString, Colorize};
use std::time::SystemTime;

/// Sink for log entries
///
/// ```no_run
/// use umbra_engine::umbra::log::{LogEntry, Logger};
///
/// struct Collect(std::sync::Mutex<Vec<String>>);
///
/// impl Logger for Collect {
///     fn log(&self, entry: &LogEntry) {
///         self.0.lock().unwrap().push(entry.message.clone());
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    fn log(&self, entry: &LogEntry);
}

/// One record handed to the [`Logger`]
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub severity: LogSeverity,
    pub timestamp: SystemTime,
    /// Emitting component, e.g. `"umbra::ShaderCompiler"`
    pub source: String,
    pub message: String,
    /// Call site, filled in for errors only
    pub file: Option<&'static str>,
    pub line: Option<u32>,
}

impl LogEntry {
    /// `file:line` of the call site when both are known
    pub fn location(&self) -> Option<String> {
        match (self.file, self.line) {
            (Some(file), Some(line)) => Some(format!("{}:{}", file, line)),
            _ => None,
        }
    }
}

/// Severity, ordered from most to least verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    Trace,
    Debug,
    Info,
    /// Also used for compiler warnings and recoverable reload failures
    Warn,
    Error,
}

impl LogSeverity {
    /// Fixed-width tag printed between brackets
    pub fn label(self) -> &'static str {
        match self {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
        }
    }

    fn painted(self) -> ColoredString {
        let label = self.label();
        match self {
            LogSeverity::Trace => label.bright_black(),
            LogSeverity::Debug => label.cyan(),
            LogSeverity::Info => label.green(),
            LogSeverity::Warn => label.yellow(),
            LogSeverity::Error => label.red().bold(),
        }
    }
}

/// Stdout sink
///
/// Lines look like `[2026-01-02 10:11:12.345] [WARN ] [umbra::ShaderCompiler] message`,
/// with ` (file:line)` appended when the entry carries a call site.
pub struct DefaultLogger;

impl DefaultLogger {
    /// The line [`DefaultLogger`] prints, without terminal colors
    pub fn format_plain(entry: &LogEntry) -> String {
        render(entry, entry.severity.label().into(), entry.source.as_str().into())
    }
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        println!("{}", render(entry, entry.severity.painted(), entry.source.bright_blue()));
    }
}

fn render(entry: &LogEntry, severity: ColoredString, source: ColoredString) -> String {
    let local: DateTime<Local> = entry.timestamp.into();
    let mut line = format!(
        "[{}] [{}] [{}] {}",
        local.format("%Y-%m-%d %H:%M:%S%.3f"),
        severity,
        source,
        entry.message
    );
    if let Some(location) = entry.location() {
        line.push_str(&format!(" ({})", location));
    }
    line
}

// ----------------------------------------------------------------------------
// Macros
// ----------------------------------------------------------------------------

#[doc(hidden)]
#[macro_export]
macro_rules! __engine_log {
    ($severity:ident, $source:expr, $($arg:tt)*) => {
        $crate::umbra::Engine::log(
            $crate::umbra::log::LogSeverity::$severity,
            $source,
            format!($($arg)*),
        )
    };
}

/// Trace-level message
///
/// ```no_run
/// umbra_engine::engine_trace!("umbra::ShaderManager", "lookup {}", "shadows.wgsl");
/// ```
#[macro_export]
macro_rules! engine_trace {
    ($source:expr, $($arg:tt)*) => { $crate::__engine_log!(Trace, $source, $($arg)*) };
}

/// Debug-level message
#[macro_export]
macro_rules! engine_debug {
    ($source:expr, $($arg:tt)*) => { $crate::__engine_log!(Debug, $source, $($arg)*) };
}

/// Info-level message
///
/// ```no_run
/// umbra_engine::engine_info!("umbra::ShaderManager", "reloaded {} shaders", 3);
/// ```
#[macro_export]
macro_rules! engine_info {
    ($source:expr, $($arg:tt)*) => { $crate::__engine_log!(Info, $source, $($arg)*) };
}

#[macro_export]
macro_rules! engine_warn {
    ($source:expr, $($arg:tt)*) => { $crate::__engine_log!(Warn, $source, $($arg)*) };
}

/// Error-level message tagged with the caller's `file!()` and `line!()`
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::umbra::Engine::log_detailed(
            $crate::umbra::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!(),
        )
    };
}

/// Logs like [`engine_error!`] and evaluates to `Error::BackendError` with the same text
///
/// Meant for `map_err` and `ok_or_else`:
///
/// ```no_run
/// # fn f() -> umbra_engine::umbra::Result<()> {
/// let module: Option<u32> = None;
/// let _ = module.ok_or_else(|| umbra_engine::engine_err!("umbra::vulkan", "no module for {}", "computeMain"))?;
/// # Ok(()) }
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let text = format!($($arg)*);
        $crate::engine_error!($source, "{}", text);
        $crate::umbra::Error::BackendError(text)
    }};
}

/// `return Err(engine_err!(..))`
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

/// Warn-level counterpart of [`engine_err!`], without the call site
#[macro_export]
macro_rules! engine_warn_err {
    ($source:expr, $($arg:tt)*) => {{
        let text = format!($($arg)*);
        $crate::engine_warn!($source, "{}", text);
        $crate::umbra::Error::BackendError(text)
    }};
}

/// `return Err(engine_warn_err!(..))`
#[macro_export]
macro_rules! engine_bail_warn {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_warn_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
