//! Logging setup shared by the meetsync crates.
//!
//! The CLI initialises a compact human-readable subscriber; a long-running
//! host embedding the service crate would use [`TracingConfig::service`] for
//! JSON output with span events.
//!
//! ```ignore
//! use meetsync_core::tracing::{init_tracing, TracingConfig};
//!
//! init_tracing(TracingConfig::service())?;
//! ```

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, format::FmtSpan},
    prelude::*,
};

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error("failed to parse env filter: {0}")]
    EnvFilter(#[from] tracing_subscriber::filter::ParseError),
}

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingOutputFormat {
    /// Multi-line, human-readable
    #[default]
    Pretty,
    /// One line per event
    Compact,
    /// JSON lines
    Json,
}

/// Subscriber options.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Level used when neither `RUST_LOG` nor `env_filter` is set
    pub default_level: Level,
    pub output_format: TracingOutputFormat,
    /// Emit file and line of the callsite
    pub include_location: bool,
    pub include_timestamp: bool,
    /// Emit span open/close events, useful to time provider fan-out
    pub include_span_events: bool,
    /// Explicit filter directive, overrides both `RUST_LOG` and `default_level`
    pub env_filter: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_level: Level::INFO,
            output_format: TracingOutputFormat::Pretty,
            include_location: false,
            include_timestamp: true,
            include_span_events: false,
            env_filter: None,
        }
    }
}

impl TracingConfig {
    /// Compact debug output for interactive use.
    #[must_use]
    pub fn cli_debug() -> Self {
        Self {
            default_level: Level::DEBUG,
            output_format: TracingOutputFormat::Compact,
            include_location: true,
            include_timestamp: false,
            ..Self::default()
        }
    }

    /// JSON output with span events for a long-running host.
    #[must_use]
    pub fn service() -> Self {
        Self {
            output_format: TracingOutputFormat::Json,
            include_location: true,
            include_span_events: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: TracingOutputFormat) -> Self {
        self.output_format = format;
        self
    }

    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns an error if a global subscriber is already set or if the filter
/// directive does not parse.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let filter = build_filter(&config)?;
    let subscriber = tracing_subscriber::registry()
        .with(format_layer(&config))
        .with(filter);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn format_layer(config: &TracingConfig) -> Box<dyn Layer<Registry> + Send + Sync> {
    let span_events = if config.include_span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };
    let base = fmt::layer()
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_span_events(span_events);

    match (config.output_format, config.include_timestamp) {
        (TracingOutputFormat::Pretty, true) => base.pretty().boxed(),
        (TracingOutputFormat::Pretty, false) => base.pretty().without_time().boxed(),
        (TracingOutputFormat::Compact, true) => base.compact().boxed(),
        (TracingOutputFormat::Compact, false) => base.compact().without_time().boxed(),
        (TracingOutputFormat::Json, true) => base.json().boxed(),
        (TracingOutputFormat::Json, false) => base.json().without_time().boxed(),
    }
}

fn build_filter(config: &TracingConfig) -> Result<EnvFilter, TracingError> {
    if let Some(ref directive) = config.env_filter {
        return Ok(EnvFilter::try_new(directive)?);
    }
    Ok(EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config.default_level))))
}

/// The filter used when neither `RUST_LOG` nor an explicit directive is set.
pub fn default_directive(level: Level) -> String {
    format!("meetsync={}", level.to_string().to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_pretty_info() {
        let config = TracingConfig::default();
        assert_eq!(config.default_level, Level::INFO);
        assert_eq!(config.output_format, TracingOutputFormat::Pretty);
        assert!(config.env_filter.is_none());
    }

    #[test]
    fn presets() {
        let cli = TracingConfig::cli_debug();
        assert_eq!(cli.default_level, Level::DEBUG);
        assert_eq!(cli.output_format, TracingOutputFormat::Compact);
        assert!(!cli.include_timestamp);

        let service = TracingConfig::service();
        assert_eq!(service.output_format, TracingOutputFormat::Json);
        assert!(service.include_span_events);
        assert_eq!(service.default_level, Level::INFO);
    }

    #[test]
    fn default_directive_targets_meetsync_crates() {
        assert_eq!(default_directive(Level::WARN), "meetsync=warn");
    }

    #[test]
    fn explicit_filter_is_parsed() {
        let config = TracingConfig::default().with_env_filter("meetsync_service=trace");
        assert!(build_filter(&config).is_ok());

        let bad = TracingConfig::default().with_env_filter("meetsync=verbose");
        assert!(matches!(build_filter(&bad), Err(TracingError::EnvFilter(_))));
    }
}
