//! Diagnostics collected over one render

use crate::directives::DirectiveError;
use crate::lexical::LexerError;
use crate::logging::Code;
use crate::substitution::ResolveError;
use crate::syntax::SyntaxError;
use crate::utils::Span;

/// Every recoverable problem met while rendering a template
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Lexical(LexerError),

    #[error(transparent)]
    Syntax(SyntaxError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Directive(#[from] DirectiveError),
}

impl From<LexerError> for RenderError {
    fn from(error: LexerError) -> Self {
        RenderError::Lexical(error)
    }
}

impl From<SyntaxError> for RenderError {
    fn from(error: SyntaxError) -> Self {
        match error {
            SyntaxError::Lexical(inner) => RenderError::Lexical(inner),
            other => RenderError::Syntax(other),
        }
    }
}

impl RenderError {
    pub fn error_code(&self) -> Code {
        match self {
            RenderError::Lexical(e) => e.error_code(),
            RenderError::Syntax(e) => e.error_code(),
            RenderError::Resolve(e) => e.error_code(),
            RenderError::Directive(e) => e.error_code(),
        }
    }

    /// Unterminated groups, stray closes and missing references
    pub fn is_warning(&self) -> bool {
        match self {
            RenderError::Syntax(e) => e.is_warning(),
            RenderError::Resolve(ResolveError::NotFound { .. }) => true,
            _ => false,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            RenderError::Syntax(e) => e.span(),
            RenderError::Directive(e) => Some(e.span()),
            RenderError::Lexical(_) | RenderError::Resolve(_) => None,
        }
    }
}
