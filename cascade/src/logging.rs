//! Logging initialization using `tracing` and `tracing-subscriber`.
//!
//! This module provides static (non-reloadable) logging configuration controlled by:
//! - `RUST_LOG`: Controls log level filtering (standard tracing-subscriber behavior)
//! - `CASCADE_FORMAT`: Controls output format (compact, full, pretty, json)

use std::str::FromStr;

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Log output format options.
///
/// Controlled by the `CASCADE_FORMAT` environment variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Emit human-readable, single-line logs.
    Full,

    /// A variant of the full-format, optimized for short line lengths (default).
    Compact,

    /// Excessively pretty, multi-line logs for local development/debugging.
    Pretty,

    /// Output newline-delimited (structured) JSON logs.
    Json,
}

impl Default for LogFormat {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Compact
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "compact" => Ok(Self::Compact),
            "pretty" | "verbose" => Ok(Self::Pretty),
            "json" | "jsonl" => Ok(Self::Json),
            _ => Err(format!(
                "Invalid log format '{s}'. Valid options: full, compact, pretty, json"
            )),
        }
    }
}

/// Initialize the global tracing subscriber for the given filter and format.
///
/// Bridges `log` records into `tracing` events, applies the filter string,
/// and installs a subscriber with the requested output format.
pub fn init_tracing(filter: &str, format: Option<String>) {
    // Initialize log -> tracing bridge (ignore if already initialized)
    let _ = tracing_log::LogTracer::builder()
        .with_interest_cache(tracing_log::InterestCacheConfig::default())
        .init();

    let env_filter = EnvFilter::from_str(filter).unwrap_or_else(|_| {
        eprintln!(
            "Warning: Invalid filter string '{filter}' passed. Since you passed a filter, you likely want to debug us, so we set the filter to debug"
        );
        EnvFilter::new("debug")
    });

    let format = format
        .and_then(|s| {
            s.parse::<LogFormat>()
                .map_err(|e| {
                    eprintln!("Warning: {e}");
                    eprintln!("Falling back to default format (compact)");
                })
                .ok()
        })
        .unwrap_or_default();
    match format {
        LogFormat::Full => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_span_events(FmtSpan::NONE)
                .with_filter(env_filter);

            Registry::default().with(fmt_layer).init();
        }
        LogFormat::Compact => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .compact()
                .with_span_events(FmtSpan::NONE)
                .with_filter(env_filter);

            Registry::default().with(fmt_layer).init();
        }
        LogFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_filter(env_filter);

            Registry::default().with(fmt_layer).init();
        }
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_span_events(FmtSpan::NONE)
                .with_filter(env_filter);

            Registry::default().with(fmt_layer).init();
        }
    }
}

/// Mirrors the `cascade=` level onto `cascade_core=` when `RUST_LOG` sets
/// the former but not the latter.
pub fn ensure_core_log_level_matches(env_filter: Option<String>) -> String {
    if let Some(rust_log) = env_filter {
        if rust_log.contains("cascade=") && !rust_log.contains("cascade_core=") {
            if let Some(level) = rust_log.split(',').find_map(|s| s.strip_prefix("cascade=")) {
                format!("{rust_log},cascade_core={level}")
            } else {
                rust_log
            }
        } else {
            rust_log
        }
    } else {
        "cascade=info,cascade_core=info".to_string()
    }
}

/// Initialize tracing for tests.
///
/// Does not panic if a subscriber is already installed, uses the compact
/// format, and writes through the test writer so parallel tests do not
/// interleave output.
pub fn init_tracing_for_tests() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::fmt;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::from_str("info"))
        .unwrap();

    let subscriber = fmt()
        .compact()
        .with_test_writer()
        .with_env_filter(env_filter)
        .with_span_events(FmtSpan::NONE)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::full("full", LogFormat::Full)]
    #[case::compact("Compact", LogFormat::Compact)]
    #[case::pretty("pretty", LogFormat::Pretty)]
    #[case::verbose_alias("verbose", LogFormat::Pretty)]
    #[case::json("JSON", LogFormat::Json)]
    #[case::jsonl_alias("jsonl", LogFormat::Json)]
    fn parses_log_formats(#[case] input: &str, #[case] expected: LogFormat) {
        assert_eq!(input.parse::<LogFormat>(), Ok(expected));
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn core_level_mirrors_the_main_crate() {
        assert_eq!(
            ensure_core_log_level_matches(Some("cascade=debug".to_string())),
            "cascade=debug,cascade_core=debug"
        );
        assert_eq!(
            ensure_core_log_level_matches(Some("cascade=debug,cascade_core=warn".to_string())),
            "cascade=debug,cascade_core=warn"
        );
        assert_eq!(
            ensure_core_log_level_matches(None),
            "cascade=info,cascade_core=info"
        );
    }
}
