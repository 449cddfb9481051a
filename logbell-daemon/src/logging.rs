//! Logging initialization for logbell.
//!
//! Configures `tracing-subscriber` based on the `general` section
//! of `LogbellConfig`. Supports JSON structured logging and
//! human-readable pretty format.

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use logbell_core::config::GeneralConfig;

/// Initialize the global tracing subscriber.
///
/// Must be called exactly once, before any tracing macros are used.
/// `RUST_LOG` takes precedence over `config.log_level` when set.
///
/// # Formats
///
/// * `"json"` - Machine-parseable JSON lines
/// * `"pretty"` - Human-readable colored output (default)
pub fn init_tracing(config: &GeneralConfig) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()
                .map_err(|e| {
                    anyhow::anyhow!("failed to initialize JSON tracing subscriber: {}", e)
                })?;
        }
        "pretty" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()
                .map_err(|e| {
                    anyhow::anyhow!("failed to initialize pretty tracing subscriber: {}", e)
                })?;
        }
        _ => {
            return Err(anyhow::anyhow!(
                "unknown log format '{}', expected 'json' or 'pretty'",
                config.log_format
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_format() {
        let config = GeneralConfig {
            log_level: "info".to_owned(),
            log_format: "xml".to_owned(),
        };
        let err = init_tracing(&config).unwrap_err();
        assert!(err.to_string().contains("unknown log format"));
    }
}
