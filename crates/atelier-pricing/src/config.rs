//! # Pricing Configuration
//!
//! Where the price lookup service lives, how long to wait for it, and which
//! database file the CLI opens.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     ATELIER_PRICE_ENDPOINT=https://lookup.example/price                │
//! │     ATELIER_PRICE_TIMEOUT_SECS=20                                      │
//! │     ATELIER_DB_PATH=/srv/atelier.db                                    │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/atelier/pricing.toml (Linux)                             │
//! │     ~/Library/Application Support/com.atelier.atelier/pricing.toml     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     no endpoint, 15 s timeout, atelier.db in the data dir              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # pricing.toml
//! [lookup]
//! endpoint = "http://localhost:8787/price"
//! timeout_secs = 15
//! user_agent = "atelier-ledger/0.1"
//! minor_units = false  # true when the service returns price × 100
//!
//! [database]
//! path = "/home/taller/atelier.db"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{PricingError, PricingResult};

/// File name inside the platform config dir.
const CONFIG_FILE: &str = "pricing.toml";

/// Default database file name.
const DB_FILE: &str = "atelier.db";

// =============================================================================
// Lookup Settings
// =============================================================================

/// How to reach the external price lookup service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupSettings {
    /// Lookup URL. The vendor link is passed as the `url` query parameter.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Per-item timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// The service reports prices in minor units (price × 100). Off by
    /// default: the lookup services answer with the converted price.
    #[serde(default)]
    pub minor_units: bool,
}

fn default_timeout() -> u64 {
    15
}

fn default_user_agent() -> String {
    format!("atelier-ledger/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for LookupSettings {
    fn default() -> Self {
        LookupSettings {
            endpoint: None,
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
            minor_units: false,
        }
    }
}

// =============================================================================
// Database Settings
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Defaults to `atelier.db` in the platform data dir.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// =============================================================================
// Main Pricing Configuration
// =============================================================================

/// Complete pricing configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    #[serde(default)]
    pub lookup: LookupSettings,

    #[serde(default)]
    pub database: DatabaseSettings,
}

impl PricingConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (pricing.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> PricingResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading pricing config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load pricing config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> PricingResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| PricingError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Pricing config saved");
        Ok(())
    }

    /// Validates the configuration. A missing endpoint is allowed here; it
    /// only matters once a lookup is attempted.
    pub fn validate(&self) -> PricingResult<()> {
        if let Some(ref endpoint) = self.lookup.endpoint {
            let parsed = url::Url::parse(endpoint)?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(PricingError::InvalidUrl(format!(
                    "Lookup endpoint must be http:// or https://, got: {}",
                    endpoint
                )));
            }
        }

        if self.lookup.timeout_secs == 0 {
            return Err(PricingError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies overrides from a key lookup (the process environment in
    /// [`PricingConfig::load`]).
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(endpoint) = var("ATELIER_PRICE_ENDPOINT") {
            debug!(endpoint = %endpoint, "Overriding lookup endpoint from environment");
            self.lookup.endpoint = Some(endpoint);
        }

        if let Some(timeout) = var("ATELIER_PRICE_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(secs) => self.lookup.timeout_secs = secs,
                Err(_) => warn!(value = %timeout, "Ignoring non-numeric ATELIER_PRICE_TIMEOUT_SECS"),
            }
        }

        if let Some(path) = var("ATELIER_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("com", "atelier", "atelier")
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn endpoint(&self) -> Option<&str> {
        self.lookup.endpoint.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.lookup.timeout_secs)
    }

    /// Database file to open: configured path, else the platform data dir,
    /// else the working directory.
    pub fn database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .or_else(|| Self::project_dirs().map(|dirs| dirs.data_dir().join(DB_FILE)))
            .unwrap_or_else(|| PathBuf::from(DB_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = PricingConfig::default();
        assert_eq!(config.lookup.timeout_secs, 15);
        assert!(!config.lookup.minor_units);
        assert!(config.endpoint().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = PricingConfig::default();

        config.lookup.endpoint = Some("not a url".into());
        assert!(matches!(config.validate(), Err(PricingError::InvalidUrl(_))));

        config.lookup.endpoint = Some("ftp://lookup.local/price".into());
        assert!(matches!(config.validate(), Err(PricingError::InvalidUrl(_))));

        config.lookup.endpoint = Some("http://localhost:8787/price".into());
        assert!(config.validate().is_ok());

        config.lookup.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(PricingError::InvalidConfig(_))));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("ATELIER_PRICE_ENDPOINT", "https://lookup.example/price"),
            ("ATELIER_PRICE_TIMEOUT_SECS", "30"),
            ("ATELIER_DB_PATH", "/tmp/taller.db"),
        ]
        .into_iter()
        .collect();

        let mut config = PricingConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.endpoint(), Some("https://lookup.example/price"));
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.database_path(), PathBuf::from("/tmp/taller.db"));
    }

    #[test]
    fn test_bad_timeout_override_is_ignored() {
        let mut config = PricingConfig::default();
        config.apply_overrides(|key| (key == "ATELIER_PRICE_TIMEOUT_SECS").then(|| "soon".to_string()));
        assert_eq!(config.lookup.timeout_secs, 15);
    }

    #[test]
    fn test_toml_roundtrip() {
        let toml_str = r#"
            [lookup]
            endpoint = "http://localhost:8787/price"
            minor_units = true

            [database]
            path = "taller.db"
        "#;
        let config: PricingConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.lookup.timeout_secs, 15);
        assert!(config.lookup.minor_units);
        assert_eq!(config.database_path(), PathBuf::from("taller.db"));

        let written = toml::to_string_pretty(&config).unwrap();
        assert!(written.contains("[lookup]"));
        assert!(written.contains("[database]"));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let path = std::env::temp_dir().join("atelier-pricing-does-not-exist.toml");
        let config = PricingConfig::load_or_default(Some(path));
        assert_eq!(config.lookup.timeout_secs, PricingConfig::default().lookup.timeout_secs);
    }
}
