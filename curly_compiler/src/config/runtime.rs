// RUNTIME PREFERENCES (User Experience)
//
// Defaults come from CURLY_* environment variables. A TOML file can override
// any subset. Values are checked against the compile-time ceilings.

use super::compile_time::directives::{
    FETCH_TIMEOUT_SECONDS, MAX_FETCHES_PER_RENDER, MAX_RESPONSE_SIZE,
};
use crate::logging::codes::{self, Code};
use crate::logging::LogLevel;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProcessorPreferences {
    /// Whether to log read timings and file sizes
    pub enable_performance_logging: bool,

    /// Whether an empty template is reported as a warning
    pub warn_on_empty_template: bool,
}

impl Default for FileProcessorPreferences {
    fn default() -> Self {
        Self {
            enable_performance_logging: env::var(env_vars::ENABLE_PERFORMANCE_LOGGING)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            warn_on_empty_template: env::var(env_vars::WARN_ON_EMPTY_TEMPLATE)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LexicalPreferences {
    /// Whether to count tokens per kind
    pub collect_detailed_metrics: bool,

    /// Whether to log token statistics after tokenization
    pub log_token_statistics: bool,
}

impl Default for LexicalPreferences {
    fn default() -> Self {
        Self {
            collect_detailed_metrics: env::var(env_vars::LEXICAL_DETAILED_METRICS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            log_token_statistics: env::var(env_vars::LEXICAL_LOG_TOKEN_STATS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderPreferences {
    /// Copy plain `{{path}}` references verbatim and only evaluate directives
    pub passthrough_references: bool,

    /// Fetches allowed per render; capped by the build profile
    pub max_fetches_per_render: usize,
}

impl Default for RenderPreferences {
    fn default() -> Self {
        Self {
            passthrough_references: env::var(env_vars::RENDER_PASSTHROUGH_REFERENCES)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            max_fetches_per_render: env::var(env_vars::RENDER_MAX_FETCHES)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(MAX_FETCHES_PER_RENDER),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchPreferences {
    /// Whole-request timeout for one directive fetch
    pub timeout_seconds: u64,

    /// User-Agent header sent with every fetch
    pub user_agent: String,

    /// Largest accepted response body in bytes
    pub max_response_size: usize,
}

impl Default for FetchPreferences {
    fn default() -> Self {
        Self {
            timeout_seconds: env::var(env_vars::FETCH_TIMEOUT_SECONDS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(FETCH_TIMEOUT_SECONDS),
            user_agent: env::var(env_vars::FETCH_USER_AGENT)
                .unwrap_or_else(|_| format!("curlyproc/{}", env!("CARGO_PKG_VERSION"))),
            max_response_size: env::var(env_vars::FETCH_MAX_RESPONSE_SIZE)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(MAX_RESPONSE_SIZE),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingPreferences {
    /// Emit JSON lines instead of human readable events
    pub use_structured_logging: bool,

    /// Preferred minimum level; the build profile may raise it
    pub min_log_level: LogLevel,

    /// Whether to log stage timings
    pub log_performance_events: bool,

    /// Whether to print the cargo-style diagnostic summary
    pub enable_cargo_style_output: bool,
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            use_structured_logging: env::var(env_vars::LOGGING_USE_STRUCTURED)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            min_log_level: env::var(env_vars::LOGGING_MIN_LEVEL)
                .ok()
                .and_then(|v| LogLevel::parse(&v))
                .unwrap_or(LogLevel::Warning),
            log_performance_events: env::var(env_vars::LOGGING_LOG_PERFORMANCE)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            enable_cargo_style_output: env::var(env_vars::LOGGING_CARGO_STYLE)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }
}

/// Errors loading or validating runtime configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration value: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn error_code(&self) -> Code {
        codes::system::CONFIGURATION_INVALID
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub file_processor: FileProcessorPreferences,
    pub lexical: LexicalPreferences,
    pub render: RenderPreferences,
    pub fetch: FetchPreferences,
    pub logging: LoggingPreferences,
}

impl RuntimeConfig {
    /// Parse TOML; sections and keys that are absent keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Check preferences against the compile-time ceilings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.render.max_fetches_per_render > MAX_FETCHES_PER_RENDER {
            return Err(ConfigError::Invalid(format!(
                "render.max_fetches_per_render {} exceeds the build limit {}",
                self.render.max_fetches_per_render, MAX_FETCHES_PER_RENDER
            )));
        }

        if self.fetch.timeout_seconds == 0 || self.fetch.timeout_seconds > FETCH_TIMEOUT_SECONDS {
            return Err(ConfigError::Invalid(format!(
                "fetch.timeout_seconds must be in 1..={}",
                FETCH_TIMEOUT_SECONDS
            )));
        }

        if self.fetch.max_response_size > MAX_RESPONSE_SIZE {
            return Err(ConfigError::Invalid(format!(
                "fetch.max_response_size {} exceeds the build limit {}",
                self.fetch.max_response_size, MAX_RESPONSE_SIZE
            )));
        }

        if self.fetch.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "fetch.user_agent must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Environment variable names for configuration
pub mod env_vars {
    // File Processor
    pub const ENABLE_PERFORMANCE_LOGGING: &str = "CURLY_ENABLE_PERFORMANCE_LOGGING";
    pub const WARN_ON_EMPTY_TEMPLATE: &str = "CURLY_WARN_ON_EMPTY_TEMPLATE";

    // Lexical
    pub const LEXICAL_DETAILED_METRICS: &str = "CURLY_LEXICAL_DETAILED_METRICS";
    pub const LEXICAL_LOG_TOKEN_STATS: &str = "CURLY_LEXICAL_LOG_TOKEN_STATS";

    // Render
    pub const RENDER_PASSTHROUGH_REFERENCES: &str = "CURLY_RENDER_PASSTHROUGH_REFERENCES";
    pub const RENDER_MAX_FETCHES: &str = "CURLY_RENDER_MAX_FETCHES";

    // Fetch
    pub const FETCH_TIMEOUT_SECONDS: &str = "CURLY_FETCH_TIMEOUT_SECONDS";
    pub const FETCH_USER_AGENT: &str = "CURLY_FETCH_USER_AGENT";
    pub const FETCH_MAX_RESPONSE_SIZE: &str = "CURLY_FETCH_MAX_RESPONSE_SIZE";

    // Logging
    pub const LOGGING_USE_STRUCTURED: &str = "CURLY_LOGGING_USE_STRUCTURED";
    pub const LOGGING_MIN_LEVEL: &str = "CURLY_LOGGING_MIN_LEVEL";
    pub const LOGGING_LOG_PERFORMANCE: &str = "CURLY_LOGGING_LOG_PERFORMANCE";
    pub const LOGGING_CARGO_STYLE: &str = "CURLY_LOGGING_CARGO_STYLE";
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = RuntimeConfig::from_toml_str(
            r#"
            [render]
            passthrough_references = true

            [logging]
            min_log_level = "Debug"
            "#,
        )
        .unwrap();

        assert!(config.render.passthrough_references);
        assert_eq!(config.logging.min_log_level, LogLevel::Debug);
        assert!(config.fetch.timeout_seconds >= 1);
    }

    #[test]
    fn test_fetch_budget_above_build_limit_is_rejected() {
        let content = format!(
            "[render]\nmax_fetches_per_render = {}\n",
            MAX_FETCHES_PER_RENDER + 1
        );
        assert_matches!(
            RuntimeConfig::from_toml_str(&content),
            Err(ConfigError::Invalid(_))
        );
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        assert_matches!(
            RuntimeConfig::from_toml_str("[fetch]\ntimeout_seconds = 0\n"),
            Err(ConfigError::Invalid(_))
        );
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = RuntimeConfig::from_toml_str("[render\n").unwrap_err();
        assert_matches!(err, ConfigError::Parse(_));
        assert_eq!(err.error_code(), codes::system::CONFIGURATION_INVALID);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert_matches!(RuntimeConfig::load(&missing), Err(ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curly.toml");
        std::fs::write(&path, "[fetch]\nuser_agent = \"mailer/2\"\n").unwrap();

        let config = RuntimeConfig::load(&path).unwrap();
        assert_eq!(config.fetch.user_agent, "mailer/2");
    }

    #[test]
    fn test_env_var_names_share_prefix() {
        for name in [
            env_vars::RENDER_PASSTHROUGH_REFERENCES,
            env_vars::FETCH_TIMEOUT_SECONDS,
            env_vars::LOGGING_MIN_LEVEL,
        ] {
            assert!(name.starts_with("CURLY_"));
        }
    }
}
