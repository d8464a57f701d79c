//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/refnet/refnet.toml`
//! 3. Local config: `<dir>/.refnet.toml` (directory given with `-C`)
//! 4. Environment variables: `REFNET_*` prefix

use std::path::{Path, PathBuf};
use std::str::FromStr;

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::identifier::{DEFAULT_FIRST_SEQUENCE, DEFAULT_PREFIX};
use crate::domain::{expand_env_vars, PublicIdScheme, RewardSchedule};

/// Traversal depth used when the caller does not ask for one.
pub const DEFAULT_MAX_LEVELS: usize = 3;

/// Public id allocation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IdentifierConfig {
    /// Prefix of public ids (e.g., "REG")
    pub prefix: String,
    /// Sequence used for the very first member
    pub first_sequence: u64,
    /// Allocation attempts before a public id conflict is reported
    pub max_attempts: u32,
}

impl Default for IdentifierConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            first_sequence: DEFAULT_FIRST_SEQUENCE,
            max_attempts: 3,
        }
    }
}

/// Reward paid per member, one entry per generation level.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RewardConfig {
    pub rates: Vec<Decimal>,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            rates: RewardSchedule::default().rates().to_vec(),
        }
    }
}

/// Raw identifier config for intermediate parsing (None = not specified).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawIdentifierConfig {
    pub prefix: Option<String>,
    pub first_sequence: Option<u64>,
    pub max_attempts: Option<u32>,
}

/// Raw reward config for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawRewardConfig {
    pub rates: Option<Vec<Decimal>>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub store_path: Option<PathBuf>,
    pub max_levels: Option<usize>,
    pub identifiers: RawIdentifierConfig,
    pub rewards: RawRewardConfig,
}

/// Unified configuration for refnet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Member store file (default: ~/.refnet/members.json)
    pub store_path: PathBuf,
    /// Default traversal depth for team, levels and tree queries
    pub max_levels: usize,
    pub identifiers: IdentifierConfig,
    pub rewards: RewardConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            max_levels: DEFAULT_MAX_LEVELS,
            identifiers: IdentifierConfig::default(),
            rewards: RewardConfig::default(),
        }
    }
}

/// Get the default store location (~/.refnet/members.json).
fn default_store_path() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".refnet"))
        .unwrap_or_else(|| PathBuf::from("~/.refnet"))
        .join("members.json")
}

/// Get the XDG config directory for refnet.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "refnet").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("refnet.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".refnet.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Parse a comma separated list of rates, e.g. "100,50,25".
pub fn parse_rates(value: &str) -> Result<Vec<Decimal>, ApplicationError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Decimal::from_str(s).map_err(|e| ApplicationError::Config {
                message: format!("invalid reward rate '{s}': {e}"),
            })
        })
        .collect()
}

impl Settings {
    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        let expanded = expand_env_vars(self.store_path.to_string_lossy().as_ref());
        self.store_path = PathBuf::from(expanded);
    }

    /// Overlay wins wherever it specifies a value; arrays are replaced.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            store_path: overlay
                .store_path
                .clone()
                .unwrap_or_else(|| self.store_path.clone()),
            max_levels: overlay.max_levels.unwrap_or(self.max_levels),
            identifiers: IdentifierConfig {
                prefix: overlay
                    .identifiers
                    .prefix
                    .clone()
                    .unwrap_or_else(|| self.identifiers.prefix.clone()),
                first_sequence: overlay
                    .identifiers
                    .first_sequence
                    .unwrap_or(self.identifiers.first_sequence),
                max_attempts: overlay
                    .identifiers
                    .max_attempts
                    .unwrap_or(self.identifiers.max_attempts),
            },
            rewards: RewardConfig {
                rates: overlay
                    .rewards
                    .rates
                    .clone()
                    .unwrap_or_else(|| self.rewards.rates.clone()),
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a `.refnet.toml`
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/refnet/refnet.toml`
    /// 3. Local config: `<local_dir>/.refnet.toml`
    /// 4. Environment variables: `REFNET_*` prefix, `__` separates sections
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();
        current.validate()?;

        Ok(current)
    }

    /// Apply REFNET_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("REFNET").separator("__"))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("store_path") {
            settings.store_path = PathBuf::from(val);
        }
        if let Ok(val) = config.get_int("max_levels") {
            settings.max_levels = usize::try_from(val).map_err(|_| ApplicationError::Config {
                message: format!("max_levels must not be negative: {val}"),
            })?;
        }
        if let Ok(val) = config.get_string("identifiers.prefix") {
            settings.identifiers.prefix = val;
        }
        if let Ok(val) = config.get_int("identifiers.first_sequence") {
            settings.identifiers.first_sequence =
                u64::try_from(val).map_err(|_| ApplicationError::Config {
                    message: format!("first_sequence must not be negative: {val}"),
                })?;
        }
        if let Ok(val) = config.get_int("identifiers.max_attempts") {
            settings.identifiers.max_attempts =
                u32::try_from(val).map_err(|_| ApplicationError::Config {
                    message: format!("invalid max_attempts: {val}"),
                })?;
        }
        if let Ok(val) = config.get_string("rewards.rates") {
            settings.rewards.rates = parse_rates(&val)?;
        }

        Ok(settings)
    }

    /// Reject settings the engine cannot work with.
    pub fn validate(&self) -> Result<(), ApplicationError> {
        if self.identifiers.prefix.trim().is_empty() {
            return Err(ApplicationError::Config {
                message: "identifiers.prefix must not be empty".to_string(),
            });
        }
        if self.identifiers.max_attempts == 0 {
            return Err(ApplicationError::Config {
                message: "identifiers.max_attempts must be at least 1".to_string(),
            });
        }
        if let Some(rate) = self.rewards.rates.iter().find(|r| r.is_sign_negative()) {
            return Err(ApplicationError::Config {
                message: format!("reward rates must not be negative: {rate}"),
            });
        }
        Ok(())
    }

    pub fn id_scheme(&self) -> Result<PublicIdScheme, ApplicationError> {
        Ok(PublicIdScheme::new(
            &self.identifiers.prefix,
            self.identifiers.first_sequence,
        )?)
    }

    pub fn reward_schedule(&self) -> RewardSchedule {
        RewardSchedule::new(self.rewards.rates.clone())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# refnet configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/refnet/refnet.toml
#   Local:  <dir>/.refnet.toml           (select with -C <dir>)
#   Env:    REFNET_* environment variables, e.g. REFNET_MAX_LEVELS=4,
#           REFNET_REWARDS__RATES="100,50,25"

# Member store (JSON)
# store_path = "~/.refnet/members.json"

# Default depth for team, levels and tree queries
# max_levels = 3

[identifiers]
# prefix = "REG"
# first_sequence = 1001
# max_attempts = 3

[rewards]
# Reward per member for level 1, 2, 3, ...; deeper levels earn nothing
# rates = [100, 50, 25]
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
