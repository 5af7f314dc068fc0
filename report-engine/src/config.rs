//! FILENAME: report-engine/src/config.rs
//! PURPOSE: Runtime settings for the report executor.
//! CONTEXT: Every field has a default, so a partial JSON document (or none)
//! is a valid configuration. The export timestamp pattern is checked on load.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
pub const DEFAULT_VECTOR_RESULT_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Cache lifetime for reports without their own `cache_ttl`.
    pub default_cache_ttl_secs: u64,
    /// Upper bound on rows taken from a semantic search.
    pub vector_result_limit: usize,
    /// Applied when an execute request leaves `use_cache` unset.
    pub use_cache_by_default: bool,
    /// chrono pattern for the timestamp part of export file names.
    pub export_timestamp_format: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            default_cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            vector_result_limit: DEFAULT_VECTOR_RESULT_LIMIT,
            use_cache_by_default: true,
            export_timestamp_format: export::DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        export::validate_timestamp_format(&self.export_timestamp_format)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.default_cache_ttl_secs, 300);
        assert_eq!(config.vector_result_limit, 100);
        assert!(config.use_cache_by_default);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{"defaultCacheTtlSecs": 60}"#).unwrap();
        assert_eq!(config.default_cache_ttl_secs, 60);
        assert_eq!(config.vector_result_limit, 100);
        assert_eq!(config.export_timestamp_format, export::DEFAULT_TIMESTAMP_FORMAT);
    }

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(EngineConfig::from_json("{}").unwrap(), EngineConfig::default());
        assert!(matches!(EngineConfig::from_json("[]"), Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_bad_timestamp_format_is_rejected() {
        let result = EngineConfig::from_json(r#"{"exportTimestampFormat":"%Q"}"#);
        assert!(matches!(result, Err(ConfigError::Export(_))));

        let config = EngineConfig::from_json(r#"{"exportTimestampFormat":"%d.%m.%Y"}"#).unwrap();
        assert_eq!(config.export_timestamp_format, "%d.%m.%Y");
        assert!(config.validate().is_ok());
    }
}
