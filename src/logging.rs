//! Tracing subscriber setup shared by the binaries.
//!
//! `RUST_LOG` selects the filter (falling back to the binary's default) and
//! `LOG_FORMAT` selects `json` (structured, Cloud Logging compatible) or
//! `pretty` output. Logs go to stderr so stdout stays free for reports.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event.
    Json,
    /// Human-readable output for local use.
    Pretty,
}

impl LogFormat {
    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" | "text" => Some(Self::Pretty),
            _ => None,
        }
    }

    /// Read `LOG_FORMAT`, falling back to `default`.
    pub fn from_env(default: Self) -> Self {
        std::env::var("LOG_FORMAT")
            .ok()
            .and_then(|s| Self::from_str(&s))
            .unwrap_or(default)
    }
}

/// Install the global subscriber.
///
/// Must be called at most once per process.
pub fn init_tracing(default_filter: &str, default_format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    match LogFormat::from_env(default_format) {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_span_events(FmtSpan::CLOSE),
                )
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_current_span(true)
                        .with_span_events(FmtSpan::CLOSE)
                        .flatten_event(true),
                )
                .init();
        }
    }
}
