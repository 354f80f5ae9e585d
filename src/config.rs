use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

pub const DEFAULT_CONFIG_FILE: &str = "protein-catalog.json";
pub const DEFAULT_SOURCE_DIR: &str = "AdditionalDatasets";
pub const DEFAULT_DATABASE: &str = "sqlite://AdditionalData.db";
pub const DEFAULT_BIND: &str = "127.0.0.1:5000";
pub const DEFAULT_NAME_COLUMN: &str = "Protein.name1";
pub const DEFAULT_ID_COLUMN: &str = "ID";

pub const ENV_SOURCE_DIR: &str = "PROTEIN_CATALOG_SOURCE_DIR";
pub const ENV_DATABASE: &str = "PROTEIN_CATALOG_DATABASE";
pub const ENV_BIND: &str = "BIND_ADDR";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub source_dir: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub bind: Option<String>,
    #[serde(default)]
    pub columns: Option<ColumnConfig>,
    #[serde(default)]
    pub delimiter: Option<char>,
    #[serde(default)]
    pub index_column: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ColumnConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

/// Shape of a dataset file: which source headers map to `name` and `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    pub name_column: String,
    pub id_column: String,
    pub delimiter: u8,
    pub index_column: bool,
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            name_column: DEFAULT_NAME_COLUMN.to_string(),
            id_column: DEFAULT_ID_COLUMN.to_string(),
            delimiter: b',',
            index_column: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    Memory,
    File(Utf8PathBuf),
}

impl FromStr for DatabaseLocation {
    type Err = CatalogError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if matches!(trimmed, "sqlite::memory:" | ":memory:" | "sqlite://:memory:") {
            return Ok(DatabaseLocation::Memory);
        }
        let path = match trimmed.split_once(':') {
            Some(("sqlite", rest)) => rest.strip_prefix("//").unwrap_or(rest),
            // windows drive letters are plain paths
            Some((scheme, _)) if scheme.len() > 1 => {
                return Err(CatalogError::InvalidDatabaseUrl(value.to_string()));
            }
            _ => trimmed,
        };
        if path.is_empty() {
            return Err(CatalogError::InvalidDatabaseUrl(value.to_string()));
        }
        Ok(DatabaseLocation::File(Utf8PathBuf::from(path)))
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub source_dir: Utf8PathBuf,
    pub database: DatabaseLocation,
    pub bind: String,
    pub layout: TableLayout,
}

/// Values that win over the config file, highest priority last.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub source_dir: Option<String>,
    pub database: Option<String>,
    pub bind: Option<String>,
}

impl Overrides {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            source_dir: lookup(ENV_SOURCE_DIR),
            database: lookup(ENV_DATABASE),
            bind: lookup(ENV_BIND),
        }
    }

    /// Fields set in `other` replace fields set in `self`.
    pub fn merge(self, other: Overrides) -> Self {
        Self {
            source_dir: other.source_dir.or(self.source_dir),
            database: other.database.or(self.database),
            bind: other.bind.or(self.bind),
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(
        path: Option<&str>,
        overrides: Overrides,
    ) -> Result<ResolvedConfig, CatalogError> {
        let config = Self::load(path)?;
        Self::resolve_config(config, overrides)
    }

    pub fn load(path: Option<&str>) -> Result<Config, CatalogError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| CatalogError::ConfigRead(config_path.clone()))?;
        serde_json::from_str(&content).map_err(|err| CatalogError::ConfigParse(err.to_string()))
    }

    pub fn resolve_config(
        config: Config,
        overrides: Overrides,
    ) -> Result<ResolvedConfig, CatalogError> {
        let schema_version = config.schema_version.unwrap_or(1);

        let source_dir = overrides
            .source_dir
            .or(config.source_dir)
            .unwrap_or_else(|| DEFAULT_SOURCE_DIR.to_string());
        let database = overrides
            .database
            .or(config.database)
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string())
            .parse()?;
        let bind = overrides
            .bind
            .or(config.bind)
            .unwrap_or_else(|| DEFAULT_BIND.to_string());

        let defaults = TableLayout::default();
        let columns = config.columns.unwrap_or_default();
        let delimiter = match config.delimiter {
            None => defaults.delimiter,
            Some(ch) if ch.is_ascii() => ch as u8,
            Some(ch) => {
                return Err(CatalogError::ConfigParse(format!(
                    "delimiter must be a single ASCII character, got {ch:?}"
                )));
            }
        };
        let layout = TableLayout {
            name_column: columns.name.unwrap_or(defaults.name_column),
            id_column: columns.id.unwrap_or(defaults.id_column),
            delimiter,
            index_column: config.index_column.unwrap_or(defaults.index_column),
        };

        Ok(ResolvedConfig {
            schema_version,
            source_dir: Utf8PathBuf::from(source_dir),
            database,
            bind,
            layout,
        })
    }
}
