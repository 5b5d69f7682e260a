//! Serializable state snapshots.
//!
//! The same JSON document backs preset files and the host state blob:
//!
//! ```text
//! { "parameters": { "GAIN": 37.5, ... },
//!   "properties": { ... },
//!   "preset": { "name": "INIT", "modified": false } }
//! ```
//!
//! Values are plain (un-normalized) and keyed by parameter name, so files
//! survive reordering of the parameter table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_PRESET_NAME;
use crate::error::StateResult;

/// Preset identity stored with a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetMetadata {
    pub name: String,
    #[serde(default)]
    pub modified: bool,
}

impl Default for PresetMetadata {
    fn default() -> Self {
        Self {
            name: DEFAULT_PRESET_NAME.to_string(),
            modified: false,
        }
    }
}

/// Immutable copy of every parameter, property and the preset metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Automatable parameter values by name.
    #[serde(default)]
    pub parameters: BTreeMap<String, f64>,
    /// Plugin-only property values by name.
    #[serde(default)]
    pub properties: BTreeMap<String, f64>,
    #[serde(default)]
    pub preset: PresetMetadata,
}

impl StateSnapshot {
    /// Look up a value in either section.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.parameters
            .get(name)
            .or_else(|| self.properties.get(name))
            .copied()
    }

    /// Pretty-printed JSON, the preset file format.
    pub fn to_json(&self) -> StateResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> StateResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Compact JSON bytes, the host state blob.
    pub fn to_bytes(&self) -> StateResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> StateResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
