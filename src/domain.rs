use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use camino::Utf8Path;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

static ID_NOISE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[()\s]").unwrap());
static NAME_NOISE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s").unwrap());

/// Strips parentheses and whitespace from a protein identifier.
pub fn normalize_id(value: &str) -> String {
    ID_NOISE.replace_all(value, "").into_owned()
}

/// Strips whitespace from a protein name.
pub fn normalize_name(value: &str) -> String {
    NAME_NOISE.replace_all(value, "").into_owned()
}

/// Canonical protein row. `id` is unique, `name` is the ingestion dedup key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProteinEntity {
    pub id: String,
    pub name: String,
}

/// Links a protein (by denormalized id and name) to the dataset it was seen in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceRecord {
    #[serde(skip)]
    pub relation_id: i64,
    pub protein_id: String,
    pub protein_name: String,
    pub dataset_id: String,
}

/// One normalized row read from a dataset file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceRow {
    pub id: String,
    pub name: String,
}

impl SourceRow {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: normalize_id(id),
            name: normalize_name(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetId(String);

impl DatasetId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name with its extension removed.
    pub fn from_path(path: &Utf8Path) -> Result<Self, CatalogError> {
        let stem = path
            .file_stem()
            .ok_or_else(|| CatalogError::Filesystem(format!("no file name in {path}")))?;
        stem.parse()
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DatasetId {
    type Err = CatalogError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.is_empty() {
            return Err(CatalogError::Filesystem(
                "dataset file has an empty name".to_string(),
            ));
        }
        Ok(Self(value.to_string()))
    }
}

/// Body of `PUT /protein/{id}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewProtein {
    pub id: String,
    pub name: String,
}

/// Body of `PATCH /protein/{id}`. Absent and empty fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProteinPatch {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl ProteinPatch {
    /// Normalized patch with empty values dropped.
    pub fn normalized(&self) -> Self {
        Self {
            id: self
                .id
                .as_deref()
                .map(normalize_id)
                .filter(|value| !value.is_empty()),
            name: self
                .name
                .as_deref()
                .map(normalize_name)
                .filter(|value| !value.is_empty()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.name.is_none()
    }
}
