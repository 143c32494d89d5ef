//! Group parsing: raw lexer output to the structural token stream
//!
//! Reference groups fold their inner text into the start token. Directive
//! groups (`{{x-url ...}}`) keep one token per word so the evaluator can split
//! the request.

pub mod error;
pub mod parser;

pub use error::{SyntaxError, SyntaxResult};
pub use parser::{ParseOutput, TemplateParser};

/// Parse template text
pub fn parse(source: &str) -> ParseOutput {
    TemplateParser::new(source).parse()
}
