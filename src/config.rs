//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\shelf-minder\config.toml
//! - macOS: ~/Library/Application Support/shelf-minder/config.toml
//! - Linux: ~/.config/shelf-minder/config.toml
//!
//! The config file is human-readable and editable. Settings are loaded at
//! startup; credentials can also come from the environment via the CLI.

use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API credentials (keep separate for potential future encryption)
    pub credentials: Credentials,

    /// Enrichment pipeline settings
    pub enrichment: EnrichmentSettings,
}

/// API credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// OpenAI API key for summary generation
    pub openai_api_key: Option<String>,

    /// Goodreads API key for ratings lookups
    pub goodreads_api_key: Option<String>,
}

/// Enrichment pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentSettings {
    /// Books per summary-job run (bounds per-run cost)
    pub summary_batch_size: u32,

    /// Books per ratings-job run
    pub ratings_batch_size: u32,

    /// Minimum spacing between AI requests, in milliseconds
    pub summary_pace_ms: u64,

    /// Minimum spacing between ratings requests, in milliseconds.
    /// Goodreads has no formal API agreement, so we keep this generous.
    pub ratings_pace_ms: u64,

    /// Model used for summary generation
    pub summary_model: String,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            summary_batch_size: 10,
            ratings_batch_size: 15,
            summary_pace_ms: 1000,
            ratings_pace_ms: 2500,
            summary_model: "gpt-4o-mini".to_string(),
        }
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("shelf-minder"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<std::path::PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from disk
///
/// Returns default config if file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };

    if !path.exists() {
        tracing::debug!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::error!("Failed to parse config file {:?}: {}", path, e);
                tracing::warn!("Using default configuration");
                Config::default()
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file {:?}: {}", path, e);
            Config::default()
        }
    }
}

/// Save configuration to disk
///
/// Creates the config directory if it doesn't exist.
pub fn save(config: &Config) -> Result<(), ConfigError> {
    let dir = config_dir().ok_or(ConfigError::NoConfigDir)?;
    let path = dir.join("config.toml");

    // Ensure directory exists
    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::CreateDir(dir.clone(), e))?;

    // Serialize to pretty TOML
    let contents = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    // Write atomically (write to temp, then rename)
    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, &path)
        .map_err(|e| ConfigError::Rename(temp_path, path.clone(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(std::path::PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(std::path::PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(std::path::PathBuf, std::path::PathBuf, std::io::Error),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[credentials]"));
        assert!(toml.contains("[enrichment]"));
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.credentials.openai_api_key = Some("test-key-123".to_string());
        config.enrichment.summary_batch_size = 5;
        config.enrichment.ratings_pace_ms = 4000;

        let toml = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();

        assert_eq!(
            parsed.credentials.openai_api_key,
            Some("test-key-123".to_string())
        );
        assert_eq!(parsed.enrichment.summary_batch_size, 5);
        assert_eq!(parsed.enrichment.ratings_pace_ms, 4000);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        // Config with only some fields
        let toml = r#"
[credentials]
openai_api_key = "my-key"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        // Specified field is set
        assert_eq!(config.credentials.openai_api_key, Some("my-key".to_string()));

        // Other fields use defaults
        assert_eq!(config.enrichment.summary_batch_size, 10);
        assert_eq!(config.enrichment.ratings_batch_size, 15);
        assert_eq!(config.enrichment.summary_pace_ms, 1000);
        assert_eq!(config.enrichment.ratings_pace_ms, 2500);
        assert_eq!(config.enrichment.summary_model, "gpt-4o-mini");
    }
}
