//! Structured logging for the `optic` CLI
//!
//! Logs never go to stdout, which carries the exported document.
//! - Compact or pretty console output on stderr
//! - JSON lines for machine consumption
//! - Daily rotated log files

use crate::config::LoggingConfig;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

const LOG_FILE_PREFIX: &str = "optic.log";

type Filtered = Layered<EnvFilter, Registry>;
type BoxedLayer = Box<dyn Layer<Filtered> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-line output
    Pretty,
    /// One JSON object per event
    Json,
    /// Single-line output
    Compact,
}

impl LogFormat {
    pub fn from_name(name: &str) -> Self {
        match name {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Compact,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Stderr,
    File,
    Both,
}

impl LogOutput {
    pub fn from_name(name: &str) -> Self {
        match name {
            "file" => LogOutput::File,
            "both" => LogOutput::Both,
            _ => LogOutput::Stderr,
        }
    }
}

fn console_layer(format: LogFormat) -> BoxedLayer {
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .boxed(),
    }
}

fn file_layer(directory: &str) -> BoxedLayer {
    std::fs::create_dir_all(directory).ok();
    let appender = RollingFileAppender::new(Rotation::DAILY, directory, LOG_FILE_PREFIX);
    fmt::layer()
        .with_writer(appender)
        .with_ansi(false)
        .boxed()
}

/// Initialize the global subscriber from the logging section of the config.
///
/// `level` is an `EnvFilter` directive, e.g. `"debug"` or
/// `"optic_builder=trace,optic_export=debug"`. An invalid directive falls
/// back to `warn`.
pub fn init(config: &LoggingConfig) {
    let format = LogFormat::from_name(&config.format);
    let output = LogOutput::from_name(&config.output);

    let env_filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("warn"));

    let mut layers = Vec::with_capacity(2);
    if matches!(output, LogOutput::Stderr | LogOutput::Both) {
        layers.push(console_layer(format));
    }
    if matches!(output, LogOutput::File | LogOutput::Both) {
        layers.push(file_layer(&config.directory));
    }

    tracing_subscriber::registry().with(env_filter).with(layers).init();

    tracing::debug!(
        format = ?format,
        output = ?output,
        level = %config.level,
        "logging initialized"
    );
}
