//! Group parsing errors
//!
//! None of these abort a render. A failing group is dropped (or, for stray
//! closes, kept as literal text) and parsing carries on.

use crate::lexical::LexerError;
use crate::logging::{codes, Code};
use crate::utils::Span;

pub type SyntaxResult<T> = Result<T, SyntaxError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    #[error("Unexpected token: expected {expected}, found '{found}' at {span}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("Unterminated '{delimiter}' group opened at {span}")]
    Unterminated { delimiter: String, span: Span },

    #[error("Unmatched '{delimiter}' at {span}")]
    UnmatchedClose { delimiter: String, span: Span },

    #[error("Groups nested {depth} deep (max: {max}) at {span}")]
    MaxNestingExceeded { depth: usize, max: usize, span: Span },

    #[error(transparent)]
    Lexical(#[from] LexerError),
}

impl SyntaxError {
    pub fn unexpected_token(expected: &str, found: &str, span: Span) -> Self {
        Self::UnexpectedToken {
            expected: expected.to_string(),
            found: found.to_string(),
            span,
        }
    }

    pub fn unterminated(delimiter: &str, span: Span) -> Self {
        Self::Unterminated {
            delimiter: delimiter.to_string(),
            span,
        }
    }

    pub fn unmatched_close(delimiter: &str, span: Span) -> Self {
        Self::UnmatchedClose {
            delimiter: delimiter.to_string(),
            span,
        }
    }

    pub fn error_code(&self) -> Code {
        match self {
            Self::UnexpectedToken { .. } => codes::syntax::UNEXPECTED_TOKEN,
            Self::Unterminated { .. } => codes::syntax::UNTERMINATED_GROUP,
            Self::UnmatchedClose { .. } => codes::syntax::UNMATCHED_CLOSE,
            Self::MaxNestingExceeded { .. } => codes::syntax::MAX_NESTING_EXCEEDED,
            Self::Lexical(error) => error.error_code(),
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::UnexpectedToken { span, .. }
            | Self::Unterminated { span, .. }
            | Self::UnmatchedClose { span, .. }
            | Self::MaxNestingExceeded { span, .. } => Some(*span),
            Self::Lexical(_) => None,
        }
    }

    /// Reported at warning level
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Unterminated { .. } | Self::UnmatchedClose { .. })
    }

    pub fn severity(&self) -> &'static str {
        codes::get_severity(self.error_code().as_str()).as_str()
    }

    pub fn category(&self) -> &'static str {
        codes::get_category(self.error_code().as_str())
    }

    pub fn recommended_action(&self) -> &'static str {
        codes::get_action(self.error_code().as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_and_classification() {
        let unterminated = SyntaxError::unterminated("{{", Span::dummy());
        assert_eq!(unterminated.error_code(), codes::syntax::UNTERMINATED_GROUP);
        assert!(unterminated.is_warning());

        let unexpected = SyntaxError::unexpected_token("'}}'", "}}}", Span::dummy());
        assert_eq!(unexpected.error_code(), codes::syntax::UNEXPECTED_TOKEN);
        assert!(!unexpected.is_warning());
        assert_eq!(unexpected.category(), "Syntax");
    }

    #[test]
    fn test_lexical_errors_keep_their_code() {
        let error: SyntaxError = LexerError::TooManyTokens { count: 5, max: 5 }.into();
        assert_eq!(error.error_code(), codes::lexical::TOKEN_LIMIT_EXCEEDED);
        assert!(error.span().is_none());
    }

    #[test]
    fn test_display_includes_position() {
        let error = SyntaxError::unmatched_close("}}", Span::dummy());
        assert_eq!(error.to_string(), "Unmatched '}}' at 1:1-1");
    }
}
