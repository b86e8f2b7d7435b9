//! Configuration loader for chathub.
//!
//! Reads the TOML configuration file and deserializes it into [`AppConfig`].
//! A missing file yields the defaults; anything else that goes wrong is fatal.

use std::path::Path;

use chathub_types::config::AppConfig;
use chathub_types::error::ConfigError;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "chathub.toml";

/// Load, normalize and validate the configuration at `path`.
///
/// - If the file does not exist, returns [`AppConfig::default()`] (volatile
///   store, no OCR, pass-through authentication).
/// - If the file cannot be read or parsed, returns an error.
/// - Selected backends without their option sections fail validation.
pub async fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("No config file at {}, using defaults", path.display());
            return Ok(AppConfig::default());
        }
        Err(err) => {
            return Err(ConfigError::Read {
                path: path.display().to_string(),
                message: err.to_string(),
            });
        }
    };

    let config = parse_config(&content)?;
    tracing::debug!(
        "Loaded config from {} (chat_store={})",
        path.display(),
        config.chat_store.kind
    );
    Ok(config)
}

/// Parse, normalize and validate configuration text.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let mut config: AppConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.normalize();
    config.validate()?;
    Ok(config)
}
