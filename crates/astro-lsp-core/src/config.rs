//! Client settings.
//!
//! Settings arrive as JSON from the client (initialization options or a
//! configuration change). Keys are camelCase and every field has a default,
//! so an empty object is a valid configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid settings: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Options for mapping ranges back to the original document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MappingOptions {
    /// Widen single-line ranges that come back exactly one character shorter
    /// than they went in.
    pub widen_one_short_ranges: bool,
}

impl Default for MappingOptions {
    fn default() -> Self {
        Self {
            widen_one_short_ranges: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompletionSettings {
    /// Offer `class`/`id` values from the component's style blocks.
    pub id_class: bool,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self { id_class: true }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub mapping: MappingOptions,
    pub completions: CompletionSettings,
}

impl Settings {
    /// Read settings from client JSON. `null` yields the defaults.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, ConfigError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        Ok(Self::deserialize(value)?)
    }
}
