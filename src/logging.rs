//! Logging setup for wachat.
//!
//! The library only emits `tracing` events; this module installs the
//! subscriber for the binary and for tests. Events go to stderr so that
//! `wachat parse --format json` output on stdout stays machine-readable.
//!
//! ```rust
//! use wachat::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::default());
//! tracing::info!("ready");
//! ```

use std::sync::Mutex;
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Logging configuration.
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub timestamps: bool,
    /// Include the module path of each event.
    pub target: bool,
    /// Emit span enter/exit events.
    pub spans: bool,
    pub colors: bool,
    /// Also append plain (uncoloured) logs to this file.
    pub file: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, human-oriented.
    Pretty,
    /// One line per event.
    Compact,
    /// Thread ids, file and line on every event.
    Full,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Warn,
            format: LogFormat::Compact,
            timestamps: false,
            target: false,
            spans: false,
            colors: true,
            file: None,
        }
    }
}

impl LogConfig {
    /// Errors only.
    #[must_use]
    pub const fn quiet() -> Self {
        Self {
            level: LogLevel::Error,
            format: LogFormat::Compact,
            timestamps: false,
            target: false,
            spans: false,
            colors: true,
            file: None,
        }
    }

    /// Archive milestones plus per-message degradations.
    #[must_use]
    pub const fn verbose() -> Self {
        Self {
            level: LogLevel::Debug,
            format: LogFormat::Compact,
            timestamps: true,
            target: true,
            spans: false,
            colors: true,
            file: None,
        }
    }

    /// Everything, including individual signature hits.
    #[must_use]
    pub const fn trace() -> Self {
        Self {
            level: LogLevel::Trace,
            format: LogFormat::Full,
            timestamps: true,
            target: true,
            spans: true,
            colors: true,
            file: None,
        }
    }

    /// Pick a preset from CLI flags: `-q` wins, then one `-v` for debug
    /// and two or more for trace.
    #[must_use]
    pub fn from_verbosity(quiet: bool, verbose: u8) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::quiet(),
            (false, 0) => Self::default(),
            (false, 1) => Self::verbose(),
            (false, _) => Self::trace(),
        }
    }
}

impl LogLevel {
    const fn as_directive(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" | "e" => Ok(Self::Error),
            "warn" | "warning" | "w" => Ok(Self::Warn),
            "info" | "i" => Ok(Self::Info),
            "debug" | "d" => Ok(Self::Debug),
            "trace" | "t" => Ok(Self::Trace),
            "off" | "none" | "quiet" => Ok(Self::Off),
            _ => Err(format!("Invalid log level: {s}")),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "p" => Ok(Self::Pretty),
            "compact" | "c" => Ok(Self::Compact),
            "full" | "f" => Ok(Self::Full),
            _ => Err(format!("Invalid log format: {s}")),
        }
    }
}

fn filter_for(config: &LogConfig) -> EnvFilter {
    if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(format!("wachat={}", config.level.as_directive()))
    }
}

fn stderr_layer(config: &LogConfig) -> BoxedLayer {
    let span_events = if config.spans {
        FmtSpan::ENTER | FmtSpan::EXIT
    } else {
        FmtSpan::NONE
    };
    let base = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(config.colors)
        .with_target(config.target)
        .with_span_events(span_events);

    match (config.format, config.timestamps) {
        (LogFormat::Pretty, true) => base.pretty().boxed(),
        (LogFormat::Pretty, false) => base.pretty().without_time().boxed(),
        (LogFormat::Compact, true) => base.compact().boxed(),
        (LogFormat::Compact, false) => base.compact().without_time().boxed(),
        (LogFormat::Full, _) => base
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
    }
}

fn file_layer(path: &str) -> Option<BoxedLayer> {
    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
    {
        Ok(file) => Some(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .boxed(),
        ),
        Err(e) => {
            eprintln!("warning: cannot open log file '{path}': {e}");
            None
        }
    }
}

/// Install the global subscriber. Only the first call has any effect.
pub fn init_logging(config: &LogConfig) {
    let mut layers = vec![stderr_layer(config)];
    if let Some(layer) = config.file.as_deref().and_then(file_layer) {
        layers.push(layer);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter_for(config))
        .try_init()
        .ok();
}

pub fn init_cli_logging(quiet: bool, verbose: u8) {
    init_logging(&LogConfig::from_verbosity(quiet, verbose));
}

/// Logs the start and outcome of a named operation with its wall time.
pub struct OperationGuard {
    name: String,
    start: std::time::Instant,
}

impl OperationGuard {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        tracing::debug!(operation = %name, "Starting operation");
        Self {
            name,
            start: std::time::Instant::now(),
        }
    }

    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }

    pub fn complete(self) {
        tracing::info!(
            operation = %self.name,
            duration_ms = self.start.elapsed().as_millis(),
            "Operation completed"
        );
    }

    pub fn fail(self, error: &dyn std::error::Error) {
        tracing::error!(
            operation = %self.name,
            duration_ms = self.start.elapsed().as_millis(),
            error = %error,
            "Operation failed"
        );
    }
}
