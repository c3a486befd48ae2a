//! Unit tests for log.rs

use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
use std::sync::Mutex;
use std::time::SystemTime;

fn entry(severity: LogSeverity, message: &str) -> LogEntry {
    LogEntry {
        severity,
        timestamp: SystemTime::now(),
        source: "umbra::ShaderManager".to_string(),
        message: message.to_string(),
        file: None,
        line: None,
    }
}

#[test]
fn test_severity_order_follows_verbosity() {
    let mut all = vec![
        LogSeverity::Error,
        LogSeverity::Trace,
        LogSeverity::Warn,
        LogSeverity::Info,
        LogSeverity::Debug,
    ];
    all.sort();
    assert_eq!(all, vec![
        LogSeverity::Trace,
        LogSeverity::Debug,
        LogSeverity::Info,
        LogSeverity::Warn,
        LogSeverity::Error,
    ]);
}

#[test]
fn test_labels_share_one_width() {
    for severity in [LogSeverity::Trace, LogSeverity::Debug, LogSeverity::Info, LogSeverity::Warn, LogSeverity::Error] {
        assert_eq!(severity.label().len(), 5);
    }
    assert_eq!(LogSeverity::Warn.label(), "WARN ");
}

#[test]
fn test_location_needs_file_and_line() {
    let mut e = entry(LogSeverity::Error, "compile failed");
    assert_eq!(e.location(), None);

    e.file = Some("shader_compiler.rs");
    assert_eq!(e.location(), None);

    e.line = Some(42);
    assert_eq!(e.location().as_deref(), Some("shader_compiler.rs:42"));
}

#[test]
fn test_plain_line_layout() {
    let line = DefaultLogger::format_plain(&entry(LogSeverity::Info, "name: ubo\tbinding=0, set=0"));

    assert!(line.starts_with('['));
    assert!(line.contains("] [INFO ] [umbra::ShaderManager] "));
    assert!(line.ends_with("name: ubo\tbinding=0, set=0"));
}

#[test]
fn test_plain_line_appends_call_site() {
    let mut e = entry(LogSeverity::Error, "boom");
    e.file = Some("shader_manager.rs");
    e.line = Some(7);

    let line = DefaultLogger::format_plain(&e);
    assert!(line.contains("[ERROR]"));
    assert!(line.ends_with("boom (shader_manager.rs:7)"));
}

#[test]
fn test_default_logger_prints_every_severity() {
    for severity in [LogSeverity::Trace, LogSeverity::Debug, LogSeverity::Info, LogSeverity::Warn, LogSeverity::Error] {
        DefaultLogger.log(&entry(severity, "message"));
    }
}

struct Collect(Mutex<Vec<(LogSeverity, String)>>);

impl Logger for Collect {
    fn log(&self, entry: &LogEntry) {
        self.0.lock().unwrap().push((entry.severity, entry.message.clone()));
    }
}

#[test]
fn test_custom_sink_receives_entries_in_order() {
    let sink = Collect(Mutex::new(Vec::new()));
    sink.log(&entry(LogSeverity::Warn, "unused variable"));
    sink.log(&entry(LogSeverity::Info, "loaded"));

    assert_eq!(*sink.0.lock().unwrap(), vec![
        (LogSeverity::Warn, "unused variable".to_string()),
        (LogSeverity::Info, "loaded".to_string()),
    ]);
}

#[test]
fn test_sinks_are_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DefaultLogger>();
    assert_send_sync::<Collect>();
}
