// build.rs - TOML-driven compile-time limit generation
use std::env;
use std::fs;
use std::path::Path;

#[derive(serde::Deserialize)]
struct CompileTimeConfig {
    file_processing: FileProcessingLimits,
    lexical: LexicalLimits,
    syntax: SyntaxLimits,
    resolution: ResolutionLimits,
    directives: DirectiveLimits,
    logging: LoggingLimits,
}

#[derive(serde::Deserialize)]
struct FileProcessingLimits {
    max_file_size: u64,
    large_file_threshold: u64,
    max_line_count_for_analysis: usize,
}

#[derive(serde::Deserialize)]
struct LexicalLimits {
    max_token_count: usize,
    max_text_token_length: usize,
}

#[derive(serde::Deserialize)]
struct SyntaxLimits {
    max_parse_depth: usize,
    max_error_history: usize,
}

#[derive(serde::Deserialize)]
struct ResolutionLimits {
    max_path_depth: usize,
    max_path_length: usize,
}

#[derive(serde::Deserialize)]
struct DirectiveLimits {
    max_directive_depth: usize,
    max_fetches_per_render: usize,
    fetch_timeout_seconds: u64,
    max_response_size: usize,
}

#[derive(serde::Deserialize)]
struct LoggingLimits {
    max_error_collection: usize,
    log_buffer_size: usize,
    max_log_message_length: usize,
    max_log_events_per_file: usize,
    security_min_log_level: u8,
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=CURLY_BUILD_PROFILE");
    println!("cargo:rerun-if-env-changed=CURLY_CONFIG_DIR");

    let profile = env::var("CURLY_BUILD_PROFILE").unwrap_or_else(|_| "development".to_string());
    let config_dir = env::var("CURLY_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

    // Workspace root is the parent of the crate directory
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let workspace_root = Path::new(&manifest_dir)
        .parent()
        .expect("Could not find workspace root (parent directory)");

    let config_path = workspace_root
        .join(&config_dir)
        .join(format!("{}.toml", profile));

    println!("cargo:rerun-if-changed={}", config_path.display());

    if !config_path.exists() {
        panic!(
            "Configuration file not found: {}\nLooking for: {}/{}/{}.toml",
            config_path.display(),
            workspace_root.display(),
            config_dir,
            profile
        );
    }

    let config_content = fs::read_to_string(&config_path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", config_path.display(), e));

    let config: CompileTimeConfig = toml::from_str(&config_content)
        .unwrap_or_else(|e| panic!("Invalid TOML in {}: {}", config_path.display(), e));

    validate_security_constraints(&config, &profile);
    generate_constants(&config, &profile);
}

fn validate_security_constraints(config: &CompileTimeConfig, profile: &str) {
    const ABSOLUTE_MAX_FILE_SIZE: u64 = 1_000_000_000;
    const ABSOLUTE_MAX_PARSE_DEPTH: usize = 1024;
    const ABSOLUTE_MAX_FETCH_TIMEOUT: u64 = 600;
    const ABSOLUTE_MAX_RESPONSE_SIZE: usize = 100_000_000;

    if config.file_processing.max_file_size > ABSOLUTE_MAX_FILE_SIZE {
        panic!("SECURITY: max_file_size exceeds absolute maximum");
    }

    if config.syntax.max_parse_depth == 0 || config.syntax.max_parse_depth > ABSOLUTE_MAX_PARSE_DEPTH
    {
        panic!("SECURITY: max_parse_depth must be in 1..={}", ABSOLUTE_MAX_PARSE_DEPTH);
    }

    if config.resolution.max_path_depth == 0 {
        panic!("SECURITY: max_path_depth must be at least 1");
    }

    if config.directives.max_directive_depth == 0 {
        panic!("SECURITY: max_directive_depth must be at least 1");
    }

    if config.directives.fetch_timeout_seconds == 0
        || config.directives.fetch_timeout_seconds > ABSOLUTE_MAX_FETCH_TIMEOUT
    {
        panic!("SECURITY: fetch_timeout_seconds must be in 1..={}", ABSOLUTE_MAX_FETCH_TIMEOUT);
    }

    if config.directives.max_response_size > ABSOLUTE_MAX_RESPONSE_SIZE {
        panic!("SECURITY: max_response_size exceeds absolute maximum");
    }

    if config.logging.security_min_log_level > 2 {
        panic!("SECURITY: security_min_log_level too high (max: 2)");
    }

    if profile == "production" {
        if config.file_processing.max_file_size > 50_000_000 {
            panic!("PRODUCTION: max_file_size too high for production");
        }
        if config.directives.fetch_timeout_seconds > 60 {
            panic!("PRODUCTION: fetch_timeout_seconds too high for production");
        }
    }
}

fn generate_constants(config: &CompileTimeConfig, profile: &str) {
    let out_dir = env::var("OUT_DIR").unwrap();
    let output_path = Path::new(&out_dir).join("constants.rs");

    let constants_code = format!(
        r#"
// Generated compile-time constants from TOML configuration
// Profile: {}
// DO NOT EDIT - Generated by build.rs

pub mod compile_time {{
    pub const PROFILE: &str = "{}";

    pub mod file_processing {{
        pub const MAX_FILE_SIZE: u64 = {};
        pub const LARGE_FILE_THRESHOLD: u64 = {};
        pub const MAX_LINE_COUNT_FOR_ANALYSIS: usize = {};
    }}

    pub mod lexical {{
        pub const MAX_TOKEN_COUNT: usize = {};
        pub const MAX_TEXT_TOKEN_LENGTH: usize = {};
    }}

    pub mod syntax {{
        pub const MAX_PARSE_DEPTH: usize = {};
        pub const MAX_ERROR_HISTORY: usize = {};
    }}

    pub mod resolution {{
        pub const MAX_PATH_DEPTH: usize = {};
        pub const MAX_PATH_LENGTH: usize = {};
    }}

    pub mod directives {{
        pub const MAX_DIRECTIVE_DEPTH: usize = {};
        pub const MAX_FETCHES_PER_RENDER: usize = {};
        pub const FETCH_TIMEOUT_SECONDS: u64 = {};
        pub const MAX_RESPONSE_SIZE: usize = {};
    }}

    pub mod logging {{
        pub const MAX_ERROR_COLLECTION: usize = {};
        pub const LOG_BUFFER_SIZE: usize = {};
        pub const MAX_LOG_MESSAGE_LENGTH: usize = {};
        pub const MAX_LOG_EVENTS_PER_FILE: usize = {};
        pub const SECURITY_MIN_LOG_LEVEL: u8 = {};
    }}
}}
"#,
        profile,
        profile,
        // File Processing
        config.file_processing.max_file_size,
        config.file_processing.large_file_threshold,
        config.file_processing.max_line_count_for_analysis,
        // Lexical
        config.lexical.max_token_count,
        config.lexical.max_text_token_length,
        // Syntax
        config.syntax.max_parse_depth,
        config.syntax.max_error_history,
        // Resolution
        config.resolution.max_path_depth,
        config.resolution.max_path_length,
        // Directives
        config.directives.max_directive_depth,
        config.directives.max_fetches_per_render,
        config.directives.fetch_timeout_seconds,
        config.directives.max_response_size,
        // Logging
        config.logging.max_error_collection,
        config.logging.log_buffer_size,
        config.logging.max_log_message_length,
        config.logging.max_log_events_per_file,
        config.logging.security_min_log_level,
    );

    fs::write(output_path, constants_code).unwrap();
}
