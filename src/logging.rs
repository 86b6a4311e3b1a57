//! Tracing subscriber setup

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingSettings;
use crate::error::{Result, TranscodeError};

/// Install a global subscriber. `RUST_LOG` takes precedence over the
/// configured level.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(settings: &LoggingSettings) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .map_err(|e| {
            TranscodeError::Config(format!("Invalid log level {:?}: {}", settings.level, e))
        })?;

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match settings.format.as_deref() {
        Some("json") => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        Some("pretty") | None => registry.with(tracing_subscriber::fmt::layer()).try_init(),
        Some(other) => {
            return Err(TranscodeError::Config(format!(
                "Unknown log format: {}",
                other
            )))
        }
    };
    installed.map_err(|e| TranscodeError::Config(format!("Logging already initialised: {}", e)))
}
