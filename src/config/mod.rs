//! # Configuration Management Module
//!
//! Server-wide settings for the character runtime, loaded from TOML.
//!
//! ## Configuration Structure
//!
//! - [`CharacterConfig`] - Gameplay rule toggles and limits
//! - `formulas` - Named arithmetic expressions for derived pools
//! - [`StorageConfig`] - Row store and seed file locations
//! - [`LoggingConfig`] - Logging level and optional file
//!
//! ## Configuration File Format
//!
//! ```toml
//! [character]
//! use_adjusted_stats = true
//! max_item = 10000000
//! max_trade = 10000000
//! trade_add_quantity = false
//!
//! [formulas]
//! hp = "10 + level * 5 + con * 2"
//! weight = "70 + str"
//!
//! [storage]
//! data_dir = "./data"
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every field carries a serde default so partial files load cleanly.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::fs;

/// Gameplay limits and rule switches consumed by every character.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterConfig {
    /// Rule checks use class/equipment adjusted attributes instead of base.
    pub use_adjusted_stats: bool,
    /// Upper bound of a single inventory line.
    pub max_item: i32,
    /// Upper bound of a single trade offer line.
    pub max_trade: i32,
    /// Most distinct items one side may put into a trade.
    pub max_trade_lines: usize,
    /// Extend mode: repeated offers accumulate onto the existing line.
    /// Replace mode (false): a repeated offer overwrites the line.
    pub trade_add_quantity: bool,
    /// 2 or higher limits pickups by remaining carry weight.
    pub enforce_weight: u8,
    /// Use `class.<archetype>.*` formulas instead of the linear fallback.
    pub use_class_formulas: bool,
    /// Base damage only applies while the accumulated damage is zero.
    pub base_damage_at_zero: bool,
    pub base_min_damage: i32,
    pub base_max_damage: i32,
    pub stat_per_level: i32,
    pub skill_per_level: i32,
    /// Comma separated character names flagged as bots.
    pub bot_characters: String,
    pub mute_length_secs: i64,
    /// Wall-clock length of one spell cast-time unit.
    pub spell_tick_ms: u64,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            use_adjusted_stats: true,
            max_item: 10_000_000,
            max_trade: 10_000_000,
            max_trade_lines: 10,
            trade_add_quantity: false,
            enforce_weight: 1,
            use_class_formulas: false,
            base_damage_at_zero: false,
            base_min_damage: 1,
            base_max_damage: 2,
            stat_per_level: 3,
            skill_per_level: 3,
            bot_characters: String::new(),
            mute_length_secs: 90,
            spell_tick_ms: 470,
        }
    }
}

impl CharacterConfig {
    /// Normalised bot list: trimmed, lowercase, empty entries removed.
    pub fn bot_names(&self) -> Vec<String> {
        self.bot_characters
            .split(',')
            .map(|name| name.trim().to_lowercase())
            .filter(|name| !name.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
    /// Optional override for the Sled database path; defaults to `<data_dir>/characters`.
    pub db_path: Option<String>,
    /// JSON seed with item/class/spell tables.
    pub definitions: Option<String>,
    /// JSON seed with quest definitions.
    pub quests: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            db_path: None,
            definitions: None,
            quests: None,
        }
    }
}

impl StorageConfig {
    pub fn db_path(&self) -> PathBuf {
        match &self.db_path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(&self.data_dir).join("characters"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Some("charcore.log".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub character: CharacterConfig,
    pub formulas: HashMap<String, String>,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Formulas written by `Config::create_default`.
pub fn default_formulas() -> HashMap<String, String> {
    [
        ("hp", "10 + level * 5 + con * 2"),
        ("tp", "10 + level * 2 + int * 2"),
        ("sp", "20 + level * 2"),
        ("weight", "70 + str"),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value.to_string()))
    .collect()
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        Self::from_toml(&content).map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config {
            formulas: default_formulas(),
            ..Config::default()
        };
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }
}
