//! Function manifest (`funks`) schema
//!
//! Purely descriptive; nothing here has behaviour beyond loading.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::common::{Error, Result};

/// Top-level manifest document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunkConfig {
    #[serde(rename = "funks", default)]
    pub functions: Vec<FunkFunction>,
}

/// One declared function
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunkFunction {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub source: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(rename = "return-type", default)]
    pub returns: String,
}

impl FunkConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, &e))?;
        Ok(serde_json::from_str(&content)?)
    }
}
