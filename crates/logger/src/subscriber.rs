use std::env::var;

use tracing::{level_filters::LevelFilter, warn};
use tracing_subscriber::{Layer, filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Output layout of the log layer, picked from `RUST_LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl LogFormat {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Compact,
        }
    }

    fn from_env() -> Self {
        var("RUST_LOG_FORMAT").map(|raw| Self::parse(&raw)).unwrap_or_default()
    }
}

pub fn init_tracing() {
    init_tracing_with_level(LevelFilter::INFO);
}

/// Initialize the global subscriber. `RUST_LOG` directives win over `level`.
///
/// Calling this twice is harmless: the second attempt is logged and ignored.
pub fn init_tracing_with_level(level: LevelFilter) {
    let env_filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();

    let log_layer = match LogFormat::from_env() {
        LogFormat::Json => tracing_subscriber::fmt::layer().json().with_filter(env_filter).boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .compact()
            .with_target(false)
            .with_filter(env_filter)
            .boxed(),
    };

    if let Err(error) = tracing_subscriber::registry().with(log_layer).try_init() {
        warn!("Tracing subscriber already installed: {error}");
    }
}
