//! Error and success codes with their classification metadata
//!
//! Every diagnostic emitted by the preprocessor carries one of these codes.
//! The registry below is the single source of truth for severity,
//! recoverability and the recommended operator action.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Universal code wrapper for both error and success codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// Complete metadata for an error code
#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub recoverable: bool,
    pub requires_halt: bool,
    pub description: &'static str,
    pub recommended_action: &'static str,
}

// ============================================================================
// ERROR CODE CONSTANTS
// ============================================================================

/// System error codes
pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("ERR001");
    pub const INITIALIZATION_FAILURE: Code = Code::new("ERR002");
    pub const CONFIGURATION_INVALID: Code = Code::new("ERR003");
}

/// File processing error codes (templates, substitution data, output)
pub mod file_processing {
    use super::Code;

    pub const FILE_NOT_FOUND: Code = Code::new("E005");
    pub const FILE_TOO_LARGE: Code = Code::new("E007");
    pub const EMPTY_FILE: Code = Code::new("E008");
    pub const PERMISSION_DENIED: Code = Code::new("E009");
    pub const INVALID_ENCODING: Code = Code::new("E010");
    pub const IO_ERROR: Code = Code::new("E011");
    pub const INVALID_PATH: Code = Code::new("E012");
    pub const OUTPUT_WRITE_FAILED: Code = Code::new("E013");
    pub const SUBSTITUTION_DATA_INVALID: Code = Code::new("E014");
}

/// Lexical analysis error codes
pub mod lexical {
    use super::Code;

    pub const END_OF_INPUT: Code = Code::new("E020");
    pub const TOKEN_LIMIT_EXCEEDED: Code = Code::new("E021");
}

/// Group parsing error codes
pub mod syntax {
    use super::Code;

    pub const UNEXPECTED_TOKEN: Code = Code::new("E040");
    pub const UNTERMINATED_GROUP: Code = Code::new("E041");
    pub const UNMATCHED_CLOSE: Code = Code::new("E042");
    pub const MAX_NESTING_EXCEEDED: Code = Code::new("E043");
}

/// Path resolution error codes
pub mod resolution {
    use super::Code;

    pub const REFERENCE_NOT_FOUND: Code = Code::new("E060");
    pub const INVALID_NAME: Code = Code::new("E061");
    pub const RESERVED_NAME: Code = Code::new("E062");
    pub const MALFORMED_INDEX: Code = Code::new("E063");
    pub const PATH_TOO_DEEP: Code = Code::new("E064");
    pub const PATH_TOO_LONG: Code = Code::new("E065");
}

/// Directive evaluation and fetch error codes
pub mod directive {
    use super::Code;

    pub const MALFORMED_DIRECTIVE: Code = Code::new("E080");
    pub const UNSUPPORTED_METHOD: Code = Code::new("E081");
    pub const FETCH_STATUS: Code = Code::new("E082");
    pub const TRANSPORT_FAILURE: Code = Code::new("E083");
    pub const INVALID_URL: Code = Code::new("E084");
    pub const FETCH_BUDGET_EXHAUSTED: Code = Code::new("E085");
    pub const RESPONSE_TOO_LARGE: Code = Code::new("E086");
    pub const MAX_DIRECTIVE_DEPTH: Code = Code::new("E087");
}

/// Success codes
pub mod success {
    use super::Code;

    pub const OPERATION_COMPLETED_SUCCESSFULLY: Code = Code::new("I001");
    pub const SYSTEM_INITIALIZATION_COMPLETED: Code = Code::new("I004");
    pub const FILE_PROCESSING_SUCCESS: Code = Code::new("I006");
    pub const TOKENIZATION_COMPLETE: Code = Code::new("I020");
    pub const PARSE_COMPLETE: Code = Code::new("I040");
    pub const RENDER_COMPLETE: Code = Code::new("I060");
    pub const FETCH_COMPLETE: Code = Code::new("I080");
    pub const OUTPUT_WRITTEN: Code = Code::new("I090");
}

// ============================================================================
// ERROR METADATA REGISTRY
// ============================================================================

type MetadataRow = (
    &'static str,
    &'static str,
    Severity,
    bool,
    bool,
    &'static str,
    &'static str,
);

// (code, category, severity, recoverable, requires_halt, description, action)
#[rustfmt::skip]
const METADATA_TABLE: &[MetadataRow] = &[
    ("ERR001", "System", Severity::Critical, false, true,
        "Critical internal system error",
        "File a bug report with the template that triggered it"),
    ("ERR002", "System", Severity::Critical, false, true,
        "System initialization failure",
        "Check logging and runtime configuration"),
    ("ERR003", "System", Severity::High, false, true,
        "Runtime configuration is invalid",
        "Fix the configuration file or CURLY_* environment variables"),
    ("E005", "FileProcessing", Severity::High, false, true,
        "Input file not found",
        "Verify the path exists"),
    ("E007", "FileProcessing", Severity::High, false, true,
        "File exceeds the configured size limit",
        "Split the template or raise max_file_size in the build profile"),
    ("E008", "FileProcessing", Severity::Low, true, false,
        "Template file is empty",
        "Check that the correct template was supplied"),
    ("E009", "FileProcessing", Severity::High, false, true,
        "Permission denied while accessing file",
        "Check file permissions"),
    ("E010", "FileProcessing", Severity::High, false, true,
        "File is not valid UTF-8",
        "Re-encode the file as UTF-8"),
    ("E011", "FileProcessing", Severity::High, false, true,
        "I/O error while accessing file",
        "Check disk and filesystem health"),
    ("E012", "FileProcessing", Severity::High, false, true,
        "Path is not a regular file",
        "Supply a path to a regular file"),
    ("E013", "FileProcessing", Severity::High, false, true,
        "Rendered output could not be written",
        "Check the output directory exists and is writable"),
    ("E014", "FileProcessing", Severity::High, false, true,
        "Substitution data is not valid JSON of the expected shape",
        "Supply an object with optional 'recipient' and 'global' members"),
    ("E020", "Lexical", Severity::Medium, true, false,
        "Lexer was asked for a token past end of input",
        "Report the template; this indicates a caller bounds error"),
    ("E021", "Lexical", Severity::High, true, false,
        "Token count limit exceeded",
        "Reduce template size or raise max_token_count"),
    ("E040", "Syntax", Severity::Medium, true, false,
        "Unexpected token inside a brace group",
        "Check that '{{' groups are closed with '}}' and '{{{' with '}}}'"),
    ("E041", "Syntax", Severity::Low, true, false,
        "Brace group was not closed before end of input",
        "Add the missing closing braces"),
    ("E042", "Syntax", Severity::Low, true, false,
        "Closing braces without a matching opening group",
        "Remove the stray closing braces or add the opening group"),
    ("E043", "Syntax", Severity::Medium, true, false,
        "Brace groups nested deeper than the configured limit",
        "Flatten the template nesting"),
    ("E060", "Resolution", Severity::Low, true, false,
        "Reference not found in recipient or global scope",
        "Add the value to the substitution data"),
    ("E061", "Resolution", Severity::Medium, true, false,
        "Reference path segment is not a valid name",
        "Use ASCII letters, digits and '_' not starting with a digit"),
    ("E062", "Resolution", Severity::Medium, true, false,
        "Reference path uses a reserved word",
        "Rename the substitution key"),
    ("E063", "Resolution", Severity::Medium, true, false,
        "Malformed index in reference path",
        "Close every '[' and follow ']' with '.' or end of path"),
    ("E064", "Resolution", Severity::Medium, true, false,
        "Reference path nests deeper than the configured limit",
        "Flatten the substitution data"),
    ("E065", "Resolution", Severity::Medium, true, false,
        "Reference path exceeds the configured length limit",
        "Shorten the reference path"),
    ("E080", "Directive", Severity::Medium, true, false,
        "Malformed x-url directive",
        "Use the form {{x-url <method> <url>}}"),
    ("E081", "Directive", Severity::Medium, true, false,
        "Unsupported directive method",
        "Only 'get' is supported"),
    ("E082", "Directive", Severity::Medium, true, false,
        "Fetch returned a non-success status",
        "Check the URL and the remote service"),
    ("E083", "Directive", Severity::Medium, true, false,
        "Fetch transport failure",
        "Check network connectivity and the fetch timeout"),
    ("E084", "Directive", Severity::Medium, true, false,
        "Directive URL is not a valid absolute URL",
        "Check the URL and the values substituted into it"),
    ("E085", "Directive", Severity::Medium, true, false,
        "Per-render fetch budget exhausted",
        "Reduce directives or raise max_fetches_per_render"),
    ("E086", "Directive", Severity::Medium, true, false,
        "Fetched body exceeds the configured size limit",
        "Raise max_response_size or fetch a smaller resource"),
    ("E087", "Directive", Severity::Medium, true, false,
        "Directives nested deeper than the configured limit",
        "Reduce directive nesting"),
];

/// Error metadata registry using OnceLock for thread safety
static ERROR_REGISTRY: OnceLock<HashMap<&'static str, ErrorMetadata>> = OnceLock::new();

fn get_error_registry() -> &'static HashMap<&'static str, ErrorMetadata> {
    ERROR_REGISTRY.get_or_init(|| {
        METADATA_TABLE
            .iter()
            .map(
                |&(code, category, severity, recoverable, requires_halt, description, action)| {
                    (
                        code,
                        ErrorMetadata {
                            code,
                            category,
                            severity,
                            recoverable,
                            requires_halt,
                            description,
                            recommended_action: action,
                        },
                    )
                },
            )
            .collect()
    })
}

// ============================================================================
// CLASSIFICATION FUNCTIONS
// ============================================================================

/// Get error metadata for a specific error code
pub fn get_error_metadata(code: &str) -> Option<&'static ErrorMetadata> {
    get_error_registry().get(code)
}

/// Get error severity from error code
pub fn get_severity(code: &str) -> Severity {
    get_error_metadata(code)
        .map(|metadata| metadata.severity)
        .unwrap_or(Severity::Medium)
}

/// Check if error is recoverable
pub fn is_recoverable(code: &str) -> bool {
    get_error_metadata(code)
        .map(|metadata| metadata.recoverable)
        .unwrap_or(true)
}

/// Check if error requires immediate halt
pub fn requires_halt(code: &str) -> bool {
    get_error_metadata(code)
        .map(|metadata| metadata.requires_halt)
        .unwrap_or(false)
}

/// Get human-readable description for error code
pub fn get_description(code: &str) -> &'static str {
    get_error_metadata(code)
        .map(|metadata| metadata.description)
        .unwrap_or("Unknown error")
}

/// Get recommended action for error code
pub fn get_action(code: &str) -> &'static str {
    get_error_metadata(code)
        .map(|metadata| metadata.recommended_action)
        .unwrap_or("No specific action available")
}

/// Get error category from error code
pub fn get_category(code: &str) -> &'static str {
    get_error_metadata(code)
        .map(|metadata| metadata.category)
        .unwrap_or("Unknown")
}
