//! Two-tier substitution data
//!
//! Loaded once before rendering and read-only afterwards.

use crate::logging::{codes, Code};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("Failed to read substitution data '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid substitution data JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Substitution data tier '{tier}' must be an object, found {found}")]
    InvalidShape { tier: &'static str, found: &'static str },
}

impl DataError {
    pub fn error_code(&self) -> Code {
        match self {
            DataError::Io { .. } => codes::file_processing::IO_ERROR,
            DataError::Parse(_) | DataError::InvalidShape { .. } => {
                codes::file_processing::SUBSTITUTION_DATA_INVALID
            }
        }
    }
}

/// Recipient values shadow global values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstitutionData {
    #[serde(default = "empty_object")]
    pub recipient: Value,
    #[serde(default = "empty_object")]
    pub global: Value,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

impl SubstitutionData {
    pub fn new(recipient: Value, global: Value) -> Self {
        Self { recipient, global }
    }

    /// Parse `{"recipient": {...}, "global": {...}}`; a missing tier is empty
    pub fn from_json_str(content: &str) -> Result<Self, DataError> {
        let data: Self = serde_json::from_str(content)?;
        data.validate()?;
        Ok(data)
    }

    pub fn load(path: &Path) -> Result<Self, DataError> {
        let content = std::fs::read_to_string(path).map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> Result<(), DataError> {
        for (tier, value) in [("recipient", &self.recipient), ("global", &self.global)] {
            if !value.is_object() {
                return Err(DataError::InvalidShape {
                    tier,
                    found: json_type_name(value),
                });
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        let tier_empty = |v: &Value| v.as_object().map_or(true, Map::is_empty);
        tier_empty(&self.recipient) && tier_empty(&self.global)
    }
}

impl Default for SubstitutionData {
    fn default() -> Self {
        Self::new(empty_object(), empty_object())
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn test_missing_tier_is_empty_object() {
        let data = SubstitutionData::from_json_str(r#"{"global": {"subject": "Avocados"}}"#).unwrap();
        assert_eq!(data.recipient, json!({}));
        assert_eq!(data.global["subject"], "Avocados");
        assert!(!data.is_empty());
    }

    #[test]
    fn test_default_is_empty() {
        assert!(SubstitutionData::default().is_empty());
        assert!(SubstitutionData::from_json_str("{}").unwrap().is_empty());
    }

    #[test]
    fn test_non_object_tier_is_rejected() {
        let err = SubstitutionData::from_json_str(r#"{"recipient": [1, 2]}"#).unwrap_err();
        assert_matches!(err, DataError::InvalidShape { tier: "recipient", found: "array" });
        assert_eq!(err.error_code(), codes::file_processing::SUBSTITUTION_DATA_INVALID);
    }

    #[test]
    fn test_malformed_json() {
        assert_matches!(
            SubstitutionData::from_json_str("{not json"),
            Err(DataError::Parse(_))
        );
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, r#"{"recipient": {"name": "billybob"}}"#).unwrap();

        let data = SubstitutionData::load(&path).unwrap();
        assert_eq!(data.recipient["name"], "billybob");

        assert_matches!(
            SubstitutionData::load(&dir.path().join("absent.json")),
            Err(DataError::Io { .. })
        );
    }
}
