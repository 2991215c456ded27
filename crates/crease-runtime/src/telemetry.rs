//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

use crease_core::{CreaseError, CreaseResult};

/// Log output configuration
#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    /// Filter used when `RUST_LOG` is unset
    pub default_filter: String,
    /// One JSON object per event instead of human-readable lines
    pub json: bool,
    /// Include the event target (module path)
    pub with_target: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        TelemetryConfig {
            default_filter: "info".into(),
            json: false,
            with_target: true,
        }
    }
}

impl TelemetryConfig {
    /// JSON lines, for log shippers
    pub fn json() -> Self {
        TelemetryConfig {
            json: true,
            ..Self::default()
        }
    }

    /// Resolve the filter: `RUST_LOG` wins over the default
    pub fn filter(&self) -> CreaseResult<EnvFilter> {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.default_filter))
            .map_err(|e| CreaseError::InvalidConfig(format!("log filter: {}", e)))
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_tracing(config: &TelemetryConfig) -> CreaseResult<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(config.filter()?)
        .with_target(config.with_target);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| CreaseError::InvalidConfig(format!("tracing: {}", e)))
}
