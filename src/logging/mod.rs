//! Logging façade with a custom DATA severity.
//!
//! The logger carries one level the stock facades do not have: **DATA**,
//! numerically 15, sitting between DEBUG (10) and INFO (20). It is reserved
//! for measured and published values, so the data records of a run can be
//! told apart from diagnostic chatter at a glance and filtered
//! independently of it.
//!
//! Rather than mutating ambient global state, all configuration lives in an
//! explicit [`Logging`] object created once at process start and passed to
//! every component that needs a logger. [`Logging::root`] returns the root
//! logger and [`Logging::child`] is the factory for independently leveled
//! child loggers; all loggers share the same sinks and formatter, and a
//! record is emitted exactly once (children do not propagate).
//!
//! The one deliberate piece of process-global state is [`Logging::install`],
//! which bridges the `log` crate so `log::info!` and friends from drivers
//! and third-party code flow through the same sinks. Like any `log`
//! installation it can happen once per process and has no teardown.

mod capture;

pub use capture::LogBuffer;

use crate::config::Settings;
use crate::error::{AppResult, RecorderError};
use chrono::{DateTime, Local};
use std::fmt;
use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;

const ANSI_RESET: &str = "\x1b[0m";

// =============================================================================
// Severity
// =============================================================================

/// Logging severity, ordered by numeric value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Diagnostic detail (10).
    Debug,
    /// Measured or published values (15).
    Data,
    /// Normal operation (20).
    Info,
    /// Something surprising but survivable (30).
    Warning,
    /// An operation failed (40).
    Error,
    /// The process cannot continue (50).
    Critical,
}

impl Severity {
    /// Numeric value of this level.
    pub fn value(&self) -> i64 {
        match self {
            Severity::Debug => 10,
            Severity::Data => 15,
            Severity::Info => 20,
            Severity::Warning => 30,
            Severity::Error => 40,
            Severity::Critical => 50,
        }
    }

    /// Canonical upper-case level name.
    pub fn name(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Data => "DATA",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }

    /// Level from its canonical numeric value.
    pub fn from_value(value: i64) -> Option<Severity> {
        match value {
            10 => Some(Severity::Debug),
            15 => Some(Severity::Data),
            20 => Some(Severity::Info),
            30 => Some(Severity::Warning),
            40 => Some(Severity::Error),
            50 => Some(Severity::Critical),
            _ => None,
        }
    }

    /// ANSI color sequence used for this level's record header.
    fn color(&self) -> &'static str {
        match self {
            Severity::Debug => "\x1b[36m",       // cyan
            Severity::Data => "\x1b[37m",        // white
            Severity::Info => "\x1b[32m",        // green
            Severity::Warning => "\x1b[33m",     // yellow
            Severity::Error => "\x1b[31m",       // red
            Severity::Critical => "\x1b[30;47m", // black on white
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Severity {
    type Err = RecorderError;

    /// Parses a level name ("warning", case-insensitive) or a canonical
    /// numeric value ("15"). Anything else is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(Severity::Debug),
            "DATA" => Ok(Severity::Data),
            "INFO" => Ok(Severity::Info),
            "WARNING" | "WARN" => Ok(Severity::Warning),
            "ERROR" => Ok(Severity::Error),
            "CRITICAL" => Ok(Severity::Critical),
            other => other
                .parse::<i64>()
                .ok()
                .and_then(Severity::from_value)
                .ok_or_else(|| RecorderError::InvalidLogLevel(s.to_string())),
        }
    }
}

// =============================================================================
// Records and sinks
// =============================================================================

/// A single emitted log record.
#[derive(Clone, Debug)]
pub struct LogRecord {
    /// Local time the record was created.
    pub timestamp: DateTime<Local>,
    /// Severity it was logged at.
    pub severity: Severity,
    /// Name of the logger that emitted it.
    pub logger: String,
    /// The formatted message.
    pub message: String,
}

/// Destination for emitted records.
pub trait LogSink: Send + Sync {
    /// Writes one record. Sinks must not panic on I/O failure.
    fn emit(&self, record: &LogRecord);
}

/// Sink writing color-coded records to stdout.
///
/// Record format: a level-colored `LEVEL - name - timestamp :` header line
/// followed by the message on its own line.
pub struct ConsoleSink {
    ansi: bool,
}

impl ConsoleSink {
    /// Colorized console sink.
    pub fn new() -> Self {
        Self { ansi: true }
    }

    /// Console sink without ANSI sequences, for dumb terminals and pipes.
    pub fn plain() -> Self {
        Self { ansi: false }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink for ConsoleSink {
    fn emit(&self, record: &LogRecord) {
        let header = format!(
            "{} - {} - {} :",
            record.severity.name(),
            record.logger,
            record.timestamp.format("%Y-%m-%d %H:%M:%S%.3f")
        );
        let mut out = std::io::stdout();
        let result = if self.ansi {
            writeln!(
                out,
                "{}{header}{}\n{}",
                record.severity.color(),
                ANSI_RESET,
                record.message
            )
        } else {
            writeln!(out, "{header}\n{}", record.message)
        };
        // A broken stdout must not take the acquisition down.
        let _ = result;
    }
}

// =============================================================================
// Logging configuration object
// =============================================================================

struct Shared {
    root_level: Severity,
    sinks: Vec<Box<dyn LogSink>>,
}

impl Shared {
    fn emit(&self, severity: Severity, logger: &str, message: String) {
        let record = LogRecord {
            timestamp: Local::now(),
            severity,
            logger: logger.to_string(),
            message,
        };
        for sink in &self.sinks {
            sink.emit(&record);
        }
    }
}

/// Process-wide logging configuration.
///
/// Created once at startup and handed (by cheap clone) to every component
/// that needs a logger.
#[derive(Clone)]
pub struct Logging {
    shared: Arc<Shared>,
}

impl Logging {
    /// Logging setup with the colorized console sink.
    pub fn new(root_level: Severity) -> Self {
        Self::with_sinks(root_level, vec![Box::new(ConsoleSink::new())])
    }

    /// Logging setup with caller-supplied sinks (tests use [`LogBuffer`]).
    pub fn with_sinks(root_level: Severity, sinks: Vec<Box<dyn LogSink>>) -> Self {
        Self {
            shared: Arc::new(Shared { root_level, sinks }),
        }
    }

    /// Logging setup from the configured `log_level`.
    pub fn from_settings(settings: &Settings) -> AppResult<Self> {
        Ok(Self::new(settings.log_level.parse()?))
    }

    /// The root logger.
    pub fn root(&self) -> Logger {
        Logger {
            name: "root".to_string(),
            level: self.shared.root_level,
            shared: Arc::clone(&self.shared),
        }
    }

    /// Child-logger factory: an independently leveled logger sharing the
    /// root sinks and formatter.
    pub fn child(&self, name: impl Into<String>, level: Severity) -> Logger {
        Logger {
            name: name.into(),
            level,
            shared: Arc::clone(&self.shared),
        }
    }

    /// Installs this configuration as the process-global `log` backend, so
    /// `log::info!` and friends from drivers and dependencies share our
    /// sinks. Can succeed once per process; there is no teardown.
    pub fn install(&self) -> AppResult<()> {
        let bridge = LogBridge {
            shared: Arc::clone(&self.shared),
        };
        log::set_boxed_logger(Box::new(bridge)).map_err(|err| {
            RecorderError::Configuration(format!("global logger already installed: {err}"))
        })?;
        log::set_max_level(max_level_filter(self.shared.root_level));
        Ok(())
    }
}

/// Named handle emitting records at or above its own level.
#[derive(Clone)]
pub struct Logger {
    name: String,
    level: Severity,
    shared: Arc<Shared>,
}

impl Logger {
    /// This logger's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// This logger's threshold.
    pub fn level(&self) -> Severity {
        self.level
    }

    /// Whether a record at `severity` would be emitted.
    pub fn enabled(&self, severity: Severity) -> bool {
        severity >= self.level
    }

    /// Emits one record at `severity` if enabled.
    pub fn log(&self, severity: Severity, message: impl fmt::Display) {
        if self.enabled(severity) {
            self.shared.emit(severity, &self.name, message.to_string());
        }
    }

    /// Diagnostic detail.
    pub fn debug(&self, message: impl fmt::Display) {
        self.log(Severity::Debug, message);
    }

    /// Measured, posted, or read data values.
    pub fn data(&self, message: impl fmt::Display) {
        self.log(Severity::Data, message);
    }

    /// Normal operation.
    pub fn info(&self, message: impl fmt::Display) {
        self.log(Severity::Info, message);
    }

    /// Something surprising but survivable.
    pub fn warning(&self, message: impl fmt::Display) {
        self.log(Severity::Warning, message);
    }

    /// An operation failed.
    pub fn error(&self, message: impl fmt::Display) {
        self.log(Severity::Error, message);
    }

    /// The process cannot continue.
    pub fn critical(&self, message: impl fmt::Display) {
        self.log(Severity::Critical, message);
    }
}

// =============================================================================
// `log` crate bridge
// =============================================================================

struct LogBridge {
    shared: Arc<Shared>,
}

fn severity_of(level: log::Level) -> Severity {
    match level {
        log::Level::Trace | log::Level::Debug => Severity::Debug,
        log::Level::Info => Severity::Info,
        log::Level::Warn => Severity::Warning,
        log::Level::Error => Severity::Error,
    }
}

fn max_level_filter(root: Severity) -> log::LevelFilter {
    match root {
        Severity::Debug => log::LevelFilter::Trace,
        Severity::Data => log::LevelFilter::Debug,
        Severity::Info => log::LevelFilter::Info,
        Severity::Warning => log::LevelFilter::Warn,
        Severity::Error | Severity::Critical => log::LevelFilter::Error,
    }
}

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        severity_of(metadata.level()) >= self.shared.root_level
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        self.shared.emit(
            severity_of(record.level()),
            record.target(),
            format!("{}", record.args()),
        );
    }

    fn flush(&self) {}
}
