//! Logging setup.
//!
//! `console` is a compact human format for a terminal; `json` emits one
//! object per event for log collectors. The configured level applies to
//! every target; `RUST_LOG` accepts full directives such as
//! `info,qsimd_server::dispatcher=debug`.

use std::str::FromStr;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::config::LoggingConfig;

/// Transport crates log every frame at `debug`.
const QUIET_DIRECTIVES: &[&str] = &["hyper=warn", "h2=warn"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TracingFormat {
    #[default]
    Console,
    Json,
}

impl FromStr for TracingFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "console" => Ok(TracingFormat::Console),
            "json" => Ok(TracingFormat::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub filter: String,
    pub format: TracingFormat,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: TracingFormat::Console,
        }
    }
}

impl From<&LoggingConfig> for TracingConfig {
    /// The format string is checked by `Config::validate`; anything that
    /// slips through logs to the console.
    fn from(logging: &LoggingConfig) -> Self {
        Self {
            filter: logging.level.clone(),
            format: logging.format.parse().unwrap_or_default(),
        }
    }
}

/// `RUST_LOG` wins when set, so operators can raise verbosity without
/// touching the config file.
fn build_filter(configured: &str, rust_log: Option<&str>) -> EnvFilter {
    let base = rust_log.unwrap_or(configured);
    let mut filter = EnvFilter::try_new(base).unwrap_or_else(|_| EnvFilter::new("info"));
    for directive in QUIET_DIRECTIVES {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_tracing(config: TracingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = build_filter(&config.filter, rust_log.as_deref());

    let layer = match config.format {
        TracingFormat::Console => fmt::layer().compact().with_target(false).boxed(),
        TracingFormat::Json => fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_thread_ids(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()?;

    tracing::debug!(filter = %config.filter, format = ?config.format, "Logging ready");
    Ok(())
}
