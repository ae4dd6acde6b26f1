use crate::utils::config::LoggingConfig;
use anyhow::{Context, Result};
use std::path::Path;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging system. `RUST_LOG` wins over `level` when set.
pub fn init_logger(level: &str, json_output: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);

    match (json_output, log_file) {
        (true, Some(file)) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file)
                .with_context(|| format!("opening log file {}", file.display()))?;

            registry
                .with(fmt::layer().json().with_writer(file))
                .try_init()?;
        }
        (true, None) => {
            registry.with(fmt::layer().json()).try_init()?;
        }
        (false, _) => {
            registry
                .with(fmt::layer().with_target(false))
                .try_init()?;
        }
    }

    Ok(())
}

/// Initialize logger from config
pub fn init_from_config(config: &LoggingConfig) -> Result<()> {
    let json = config.output == "json";
    let log_file = if !config.file_path.is_empty() {
        Some(Path::new(&config.file_path))
    } else {
        None
    };

    init_logger(&config.level, json, log_file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_an_error_not_a_panic() {
        // The first call may or may not win the global slot; after it
        // one subscriber is installed, so another init must fail.
        let _ = init_logger("debug", false, None);
        let second = init_logger("debug", false, None);
        assert!(second.is_err());
    }
}
