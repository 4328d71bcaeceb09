//! # Store Configuration
//!
//! Where the backend lives, how to authenticate to it, and how sales are
//! written.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STOCKROOM_URL=https://abc.supabase.co                              │
//! │     STOCKROOM_ANON_KEY=eyJ...                                          │
//! │     STOCKROOM_SALE_MODE=atomic                                         │
//! │     STOCKROOM_SALE_PROCEDURE=record_sale                               │
//! │     STOCKROOM_TIMEOUT_SECS=10                                          │
//! │                                                                         │
//! │  2. TOML Config File (--config, or the platform default)               │
//! │     ~/.config/stockroom/stockroom.toml (Linux)                         │
//! │     ~/Library/Application Support/com.stockroom.stockroom/... (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     local backend, two-step sales, 30s timeout                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # stockroom.toml
//! [backend]
//! url = "https://abc.supabase.co"
//! anon_key = "eyJ..."
//! timeout_secs = 30
//!
//! [sales]
//! mode = "two_step"   # two_step | atomic
//! procedure = "record_sale"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ConfigError;

// =============================================================================
// Sale Mode
// =============================================================================

/// How a sale reaches the backend.
///
/// ```text
/// TWO_STEP (default)                    ATOMIC
/// ──────────────────                    ──────
/// insert sales row                      rpc/<procedure>(product_id, quantity,
///      │                                                price, sale_date)
///      ▼                                     │
/// update inventory.quantity                  ▼
///      │                                one backend transaction
///      ▼
/// decrement may fail after the insert   all or nothing
/// → partial failure is reported
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleMode {
    /// Insert the sale, then decrement inventory, as two requests.
    #[default]
    TwoStep,

    /// One server-side procedure call that does both writes.
    Atomic,
}

impl std::fmt::Display for SaleMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaleMode::TwoStep => write!(f, "two_step"),
            SaleMode::Atomic => write!(f, "atomic"),
        }
    }
}

impl std::str::FromStr for SaleMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "two_step" | "two-step" | "twostep" => Ok(SaleMode::TwoStep),
            "atomic" | "rpc" => Ok(SaleMode::Atomic),
            other => Err(ConfigError::Invalid(format!(
                "Unknown sale mode: '{}'. Valid options: two_step, atomic",
                other
            ))),
        }
    }
}

// =============================================================================
// Sections
// =============================================================================

/// Connection settings for the hosted backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Project base URL; REST and auth paths are appended to it.
    #[serde(default = "default_url")]
    pub url: String,

    /// Public (anonymous) API key sent as `apikey`.
    #[serde(default)]
    pub anon_key: String,

    /// Per-request timeout.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_url() -> String {
    "http://localhost:54321".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for BackendSettings {
    fn default() -> Self {
        BackendSettings {
            url: default_url(),
            anon_key: String::new(),
            timeout_secs: default_timeout(),
        }
    }
}

impl BackendSettings {
    /// Checks the settings needed to talk to a remote backend.
    pub fn validate_remote(&self) -> Result<(), ConfigError> {
        if self.anon_key.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "anon_key is required (set it in stockroom.toml or STOCKROOM_ANON_KEY)".into(),
            ));
        }
        Ok(())
    }

    /// Request timeout as a `Duration`.
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

/// Sale recording settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesSettings {
    #[serde(default)]
    pub mode: SaleMode,

    /// Procedure name used in atomic mode.
    #[serde(default = "default_procedure")]
    pub procedure: String,
}

fn default_procedure() -> String {
    "record_sale".to_string()
}

impl Default for SalesSettings {
    fn default() -> Self {
        SalesSettings {
            mode: SaleMode::default(),
            procedure: default_procedure(),
        }
    }
}

// =============================================================================
// Store Config
// =============================================================================

/// Complete client configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: BackendSettings,

    #[serde(default)]
    pub sales: SalesSettings,
}

impl StoreConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (stockroom.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                config = Self::from_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parses one TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> Result<(), ConfigError> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ConfigError::SaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::SaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;

        info!(?path, "Config saved");
        Ok(())
    }

    /// Validates the configuration.
    ///
    /// The API key is not checked here; the in-memory backend needs none.
    /// See [`BackendSettings::validate_remote`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = url::Url::parse(&self.backend.url)
            .map_err(|e| ConfigError::Invalid(format!("Invalid backend URL: {}", e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Invalid(format!(
                "Backend URL must start with http:// or https://, got: {}",
                self.backend.url
            )));
        }

        if self.backend.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if self.sales.mode == SaleMode::Atomic && self.sales.procedure.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "procedure is required when sale mode is atomic".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_with(|key| std::env::var(key).ok());
    }

    /// Applies overrides from an arbitrary variable source.
    pub fn apply_env_overrides_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("STOCKROOM_URL") {
            debug!(url = %url, "Overriding backend URL from environment");
            self.backend.url = url;
        }

        if let Some(key) = lookup("STOCKROOM_ANON_KEY") {
            self.backend.anon_key = key;
        }

        if let Some(mode) = lookup("STOCKROOM_SALE_MODE") {
            match mode.parse() {
                Ok(parsed) => {
                    debug!(mode = %mode, "Overriding sale mode from environment");
                    self.sales.mode = parsed;
                }
                Err(_) => warn!(mode = %mode, "Unknown sale mode in environment"),
            }
        }

        if let Some(procedure) = lookup("STOCKROOM_SALE_PROCEDURE") {
            self.sales.procedure = procedure;
        }

        if let Some(timeout) = lookup("STOCKROOM_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(secs) => self.backend.timeout_secs = secs,
                Err(_) => warn!(timeout = %timeout, "Invalid timeout in environment"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "stockroom", "stockroom")
            .map(|dirs| dirs.config_dir().join("stockroom.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_sale_mode_parsing() {
        assert_eq!("two_step".parse::<SaleMode>().unwrap(), SaleMode::TwoStep);
        assert_eq!("two-step".parse::<SaleMode>().unwrap(), SaleMode::TwoStep);
        assert_eq!("ATOMIC".parse::<SaleMode>().unwrap(), SaleMode::Atomic);
        assert!("eventual".parse::<SaleMode>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.sales.mode, SaleMode::TwoStep);
        assert_eq!(config.sales.procedure, "record_sale");
        assert_eq!(config.backend.timeout_secs, 30);
        assert!(config.validate().is_ok());
        assert!(config.backend.validate_remote().is_err());
    }

    #[test]
    fn test_config_validation() {
        let mut config = StoreConfig::default();

        config.backend.url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());

        config.backend.url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.backend.url = "https://abc.supabase.co".to_string();
        config.backend.timeout_secs = 0;
        assert!(config.validate().is_err());

        config.backend.timeout_secs = 5;
        config.sales.mode = SaleMode::Atomic;
        config.sales.procedure = " ".to_string();
        assert!(config.validate().is_err());

        config.sales.procedure = "record_sale".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("STOCKROOM_URL", "https://abc.supabase.co"),
            ("STOCKROOM_ANON_KEY", "anon"),
            ("STOCKROOM_SALE_MODE", "atomic"),
            ("STOCKROOM_TIMEOUT_SECS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = StoreConfig::default();
        config.apply_env_overrides_with(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.backend.url, "https://abc.supabase.co");
        assert_eq!(config.backend.anon_key, "anon");
        assert_eq!(config.sales.mode, SaleMode::Atomic);
        assert_eq!(config.backend.timeout_secs, 30);
        assert!(config.backend.validate_remote().is_ok());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("stockroom.toml");

        let mut config = StoreConfig::default();
        config.backend.url = "https://abc.supabase.co".to_string();
        config.backend.anon_key = "anon".to_string();
        config.sales.mode = SaleMode::Atomic;
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[backend]"));
        assert!(contents.contains("mode = \"atomic\""));

        assert_eq!(StoreConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stockroom.toml");
        std::fs::write(&path, "[backend]\nurl = \"https://abc.supabase.co\"\n").unwrap();

        let config = StoreConfig::from_file(&path).unwrap();
        assert_eq!(config.backend.url, "https://abc.supabase.co");
        assert_eq!(config.backend.timeout_secs, 30);
        assert_eq!(config.sales, SalesSettings::default());
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stockroom.toml");
        std::fs::write(&path, "[backend\nurl = ").unwrap();

        assert!(matches!(
            StoreConfig::from_file(&path),
            Err(ConfigError::LoadFailed(_))
        ));
    }
}
