//! Configuration for stockroom
//!
//! One file covers the database, the HTTP server, seeding and the test-data
//! generator. Every section has defaults, so an empty file is valid.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable overriding `database.path`.
pub const ENV_DB: &str = "STOCKROOM_DB";
/// Environment variable overriding `server.addr`.
pub const ENV_ADDR: &str = "STOCKROOM_ADDR";

/// System-wide configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StockroomConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub seed: SeedConfig,
    pub generator: GeneratorConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Sqlite,
    Memory,
}

/// Item store settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: Backend,
    /// SQLite file holding the `items` collection
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Sqlite,
            path: default_data_dir().join("items.db"),
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Bulk upload settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Items per write batch
    pub batch_size: usize,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self { batch_size: 500 }
    }
}

/// Random test-data settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub low_stock_probability: f64,
    pub order_placed_probability: f64,
    pub min_syllables: usize,
    pub max_syllables: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            low_stock_probability: 0.2,
            order_placed_probability: 0.1,
            min_syllables: 2,
            max_syllables: 4,
        }
    }
}

/// Location tree source; the built-in layout when unset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Value out of range: {0}")]
    OutOfRange(String),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StockroomConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json_str)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a TOML file and validate it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::from_toml(&std::fs::read_to_string(path)?)?;
        config.validate()?;
        Ok(config)
    }

    /// `<config dir>/stockroom/config.toml`, if the platform has a config dir.
    pub fn standard_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("stockroom").join("config.toml"))
    }

    /// Load the standard file when present, then apply environment overrides.
    pub fn load_standard() -> Result<Self, ConfigError> {
        let mut config = match Self::standard_path() {
            Some(path) if path.exists() => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::load(&path)?
            }
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply `STOCKROOM_DB` / `STOCKROOM_ADDR` as returned by `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db) = lookup(ENV_DB).filter(|v| !v.is_empty()) {
            self.database.path = PathBuf::from(db);
        }
        if let Some(addr) = lookup(ENV_ADDR).filter(|v| !v.is_empty()) {
            self.server.addr = addr;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.backend == Backend::Sqlite && self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::MissingField("database.path".to_string()));
        }
        if self.server.addr.trim().is_empty() {
            return Err(ConfigError::MissingField("server.addr".to_string()));
        }
        if self.seed.batch_size == 0 {
            return Err(ConfigError::OutOfRange(
                "seed.batch_size must be positive".to_string(),
            ));
        }

        let g = &self.generator;
        for (name, p) in [
            ("low_stock_probability", g.low_stock_probability),
            ("order_placed_probability", g.order_placed_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::OutOfRange(format!(
                    "generator.{} must be between 0.0 and 1.0",
                    name
                )));
            }
        }
        if g.min_syllables == 0 || g.min_syllables > g.max_syllables {
            return Err(ConfigError::OutOfRange(
                "generator syllable range must be non-empty and start above zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("stockroom"))
        .unwrap_or_else(|| PathBuf::from("."))
}
