// Internal modules
pub mod config;
pub mod directives;
pub mod file_processor;
pub mod lexical;
#[macro_use]
pub mod logging;
pub mod pipeline;
pub mod render;
pub mod substitution;
pub mod syntax;
pub mod tokens;
pub mod utils;

// Re-export key types for library consumers
pub use directives::{Fetcher, HttpFetcher, StaticFetcher};
pub use pipeline::{PipelineError, PipelineResult};
pub use render::{render, RenderError, RenderOptions, RenderOutput, Renderer};
pub use substitution::SubstitutionData;
