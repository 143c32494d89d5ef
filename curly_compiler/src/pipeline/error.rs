use crate::config::ConfigError;
use crate::directives::FetchError;
use crate::file_processor::FileProcessorError;
use crate::logging::{codes, Code};
use crate::substitution::DataError;
use std::path::PathBuf;

/// Failures that stop a run before or after rendering
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Template loading failed: {0}")]
    FileProcessing(#[from] FileProcessorError),

    #[error("Substitution data failed: {0}")]
    Data(#[from] DataError),

    #[error("Fetch setup failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Configuration failed: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to write output '{path}': {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub fn error_code(&self) -> Code {
        match self {
            PipelineError::FileProcessing(e) => e.error_code(),
            PipelineError::Data(e) => e.error_code(),
            PipelineError::Fetch(e) => e.error_code(),
            PipelineError::Config(e) => e.error_code(),
            PipelineError::Output { .. } => codes::file_processing::OUTPUT_WRITE_FAILED,
        }
    }

    pub fn requires_halt(&self) -> bool {
        codes::requires_halt(self.error_code().as_str())
    }
}
