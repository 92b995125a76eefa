//! # Checkout Configuration
//!
//! Everything a terminal needs before it can price a cart: where the
//! database lives, the default tax rate, and the payment terms.
//!
//! ## Configuration Sources (in order of precedence)
//! 1. Environment variables (highest priority)
//! 2. Config file (`kredit.toml`)
//! 3. Default values (lowest priority)
//!
//! ## Example Config File
//! ```toml
//! [database]
//! path = "/var/lib/kredit/kredit.db"
//! max_connections = 5
//!
//! [pricing]
//! default_tax_rate_bps = 1800
//!
//! [terms]
//! partial_min_percent = 30
//! partial_max_percent = 90
//!
//! [[terms.credit_plans]]
//! months = 3
//! rate_bps = 500
//!
//! [[terms.credit_plans]]
//! months = 6
//! rate_bps = 800
//! ```
//!
//! ## Environment Variables
//! | Variable | Overrides |
//! |----------|-----------|
//! | `KREDIT_DB_PATH` | `database.path` |
//! | `KREDIT_TAX_RATE_BPS` | `pricing.default_tax_rate_bps` |
//! | `KREDIT_PARTIAL_MIN_PERCENT` | `terms.partial_min_percent` |
//! | `KREDIT_PARTIAL_MAX_PERCENT` | `terms.partial_max_percent` |

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use kredit_core::validation::validate_rate_bps;
use kredit_core::{CheckoutTerms, Rate};
use kredit_db::DbConfig;

use crate::error::{CheckoutError, CheckoutResult};

// =============================================================================
// Database Settings
// =============================================================================

/// Where and how to open the ledger database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Database file. Defaults to the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Connection pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
        }
    }
}

// =============================================================================
// Pricing Settings
// =============================================================================

/// Pricing defaults applied when a request does not carry its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingSettings {
    /// Tax rate used by new checkout requests (1800 = 18%).
    #[serde(default = "default_tax_rate_bps")]
    pub default_tax_rate_bps: u32,
}

fn default_tax_rate_bps() -> u32 {
    1800
}

impl Default for PricingSettings {
    fn default() -> Self {
        PricingSettings {
            default_tax_rate_bps: default_tax_rate_bps(),
        }
    }
}

impl PricingSettings {
    pub fn default_tax_rate(&self) -> Rate {
        Rate::from_bps(self.default_tax_rate_bps)
    }
}

// =============================================================================
// Checkout Config
// =============================================================================

/// Complete checkout configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub pricing: PricingSettings,

    /// Partial bounds and the credit duration → rate table.
    #[serde(default)]
    pub terms: CheckoutTerms,
}

impl CheckoutConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (kredit.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> CheckoutResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading checkout config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load checkout config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> CheckoutResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| CheckoutError::Config("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Checkout config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> CheckoutResult<()> {
        if self.database.max_connections == 0 {
            return Err(CheckoutError::Config(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        validate_rate_bps("pricing.default_tax_rate_bps", self.pricing.default_tax_rate_bps)
            .map_err(|e| CheckoutError::Config(e.to_string()))?;

        self.terms
            .validate()
            .map_err(|e| CheckoutError::Config(format!("terms: {}", e)))?;

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(path) = var("KREDIT_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(bps) = var("KREDIT_TAX_RATE_BPS") {
            match bps.parse::<u32>() {
                Ok(b) => {
                    debug!(bps = b, "Overriding default tax rate from environment");
                    self.pricing.default_tax_rate_bps = b;
                }
                Err(_) => warn!(value = %bps, "Ignoring unparsable KREDIT_TAX_RATE_BPS"),
            }
        }

        if let Some(pct) = var("KREDIT_PARTIAL_MIN_PERCENT") {
            if let Ok(p) = pct.parse::<u32>() {
                debug!(percent = p, "Overriding partial minimum from environment");
                self.terms.partial_min_percent = p;
            }
        }

        if let Some(pct) = var("KREDIT_PARTIAL_MAX_PERCENT") {
            if let Ok(p) = pct.parse::<u32>() {
                debug!(percent = p, "Overriding partial maximum from environment");
                self.terms.partial_max_percent = p;
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "kredit", "pos").map(|dirs| dirs.config_dir().join("kredit.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Resolves the database file, creating the platform data directory
    /// when no explicit path is configured.
    pub fn database_path(&self) -> CheckoutResult<PathBuf> {
        if let Some(path) = &self.database.path {
            return Ok(path.clone());
        }

        let dirs = directories::ProjectDirs::from("com", "kredit", "pos")
            .ok_or_else(|| CheckoutError::Config("Could not determine data directory".into()))?;

        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        Ok(data_dir.join("kredit.db"))
    }

    /// Database settings in the form the pool expects.
    pub fn db_config(&self) -> CheckoutResult<DbConfig> {
        Ok(DbConfig::new(self.database_path()?).max_connections(self.database.max_connections))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use kredit_core::CreditPlanTerm;

    #[test]
    fn test_defaults() {
        let config = CheckoutConfig::new();
        assert_eq!(config.pricing.default_tax_rate().bps(), 1800);
        assert_eq!(config.terms.partial_min_percent, 30);
        assert_eq!(config.terms.partial_max_percent, 90);
        assert_eq!(config.terms.allowed_durations(), vec![3, 6, 12, 24]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            [database]
            path = "/tmp/kredit-test.db"

            [pricing]
            default_tax_rate_bps = 1600

            [terms]
            partial_min_percent = 25
            partial_max_percent = 80

            [[terms.credit_plans]]
            months = 6
            rate_bps = 900

            [[terms.credit_plans]]
            months = 9
            rate_bps = 1100
        "#;

        let config: CheckoutConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.database.path, Some(PathBuf::from("/tmp/kredit-test.db")));
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.pricing.default_tax_rate_bps, 1600);
        assert_eq!(config.terms.partial_min_percent, 25);
        assert_eq!(
            config.terms.credit_plans,
            vec![CreditPlanTerm::new(6, 900), CreditPlanTerm::new(9, 1100)]
        );
        assert_eq!(config.terms.credit_rate(9).map(|r| r.bps()), Some(1100));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config: CheckoutConfig = toml::from_str("[terms]\npartial_max_percent = 70\n").unwrap();
        assert_eq!(config.terms.partial_min_percent, 30);
        assert_eq!(config.terms.partial_max_percent, 70);
        assert_eq!(config.terms.credit_plans.len(), 4);
        assert_eq!(config.pricing.default_tax_rate_bps, 1800);
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = CheckoutConfig::new();
        config.database.path = Some(PathBuf::from("/tmp/kredit.db"));

        let text = toml::to_string_pretty(&config).unwrap();
        assert!(text.contains("[[terms.credit_plans]]"));

        let parsed: CheckoutConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.terms, config.terms);
        assert_eq!(parsed.database.path, config.database.path);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = CheckoutConfig::new();
        config.terms.partial_min_percent = 95;
        assert!(matches!(config.validate(), Err(CheckoutError::Config(_))));

        let mut config = CheckoutConfig::new();
        config.terms.credit_plans.clear();
        assert!(config.validate().is_err());

        let mut config = CheckoutConfig::new();
        config.pricing.default_tax_rate_bps = 10_001;
        assert!(config.validate().is_err());

        let mut config = CheckoutConfig::new();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("KREDIT_DB_PATH", "/data/pos.db"),
            ("KREDIT_TAX_RATE_BPS", "1600"),
            ("KREDIT_PARTIAL_MIN_PERCENT", "20"),
            ("KREDIT_PARTIAL_MAX_PERCENT", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = CheckoutConfig::new();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.database.path, Some(PathBuf::from("/data/pos.db")));
        assert_eq!(config.pricing.default_tax_rate_bps, 1600);
        assert_eq!(config.terms.partial_min_percent, 20);
        assert_eq!(config.terms.partial_max_percent, 90);
    }

    #[test]
    fn test_explicit_database_path() {
        let mut config = CheckoutConfig::new();
        config.database.path = Some(PathBuf::from("/tmp/explicit.db"));
        config.database.max_connections = 3;

        let db = config.db_config().unwrap();
        assert_eq!(db.database_path, PathBuf::from("/tmp/explicit.db"));
        assert_eq!(db.max_connections, 3);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("kredit-config-{}.toml", std::process::id()));

        let mut config = CheckoutConfig::new();
        config.pricing.default_tax_rate_bps = 1500;
        config.save(Some(path.clone())).unwrap();

        let loaded = CheckoutConfig::load(Some(path.clone())).unwrap();
        assert_eq!(loaded.pricing.default_tax_rate_bps, 1500);

        let _ = std::fs::remove_file(path);
    }
}
