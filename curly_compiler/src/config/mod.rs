//! Configuration for the preprocessor
//!
//! Security ceilings are generated at build time from `config/<profile>.toml`
//! and exposed as `compile_time::*`. User preferences live in [`runtime`].

// Generated by build.rs
include!(concat!(env!("OUT_DIR"), "/constants.rs"));

pub mod runtime;

pub use runtime::{ConfigError, RuntimeConfig};

/// Build information and configuration metadata
pub mod build_info {
    /// Profile the limits were generated from
    pub fn profile() -> &'static str {
        super::compile_time::PROFILE
    }

    pub fn config_dir() -> &'static str {
        option_env!("CURLY_CONFIG_DIR").unwrap_or("config")
    }

    pub fn source_info() -> String {
        format!("Generated from {}/{}.toml", config_dir(), profile())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_info_names_profile() {
        assert!(build_info::source_info().ends_with(&format!("{}.toml", build_info::profile())));
    }

    #[test]
    fn test_generated_limits_are_consistent() {
        assert!(compile_time::syntax::MAX_PARSE_DEPTH >= 1);
        assert!(compile_time::directives::MAX_DIRECTIVE_DEPTH >= 1);
        assert!(compile_time::directives::FETCH_TIMEOUT_SECONDS >= 1);
        assert!(
            compile_time::file_processing::LARGE_FILE_THRESHOLD
                <= compile_time::file_processing::MAX_FILE_SIZE
        );
    }
}
