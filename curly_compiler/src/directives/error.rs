//! Directive evaluation errors
//!
//! Each one replaces its directive with empty output; the rest of the
//! template still renders.

use crate::directives::fetch::FetchError;
use crate::logging::{codes, Code};
use crate::utils::Span;

#[derive(Debug, thiserror::Error)]
pub enum DirectiveError {
    #[error("Malformed directive at {span}: {reason}")]
    Malformed { reason: String, span: Span },

    #[error("Unsupported method '{method}' in directive at {span}")]
    UnsupportedMethod { method: String, span: Span },

    #[error("Fetch of {url} returned status {status}")]
    FetchStatus { url: String, status: u16, span: Span },

    #[error("Fetch failed for directive at {span}: {source}")]
    Fetch {
        span: Span,
        #[source]
        source: FetchError,
    },

    #[error("Fetch budget of {max} exhausted at {span}")]
    BudgetExhausted { max: usize, span: Span },

    #[error("Directives nested deeper than {max} at {span}")]
    MaxDepthExceeded { max: usize, span: Span },

    #[error("Unexpected {found} inside group at {span}")]
    UnexpectedToken { found: String, span: Span },
}

impl DirectiveError {
    pub fn malformed(reason: impl Into<String>, span: Span) -> Self {
        Self::Malformed {
            reason: reason.into(),
            span,
        }
    }

    pub fn error_code(&self) -> Code {
        match self {
            Self::Malformed { .. } | Self::UnexpectedToken { .. } => {
                codes::directive::MALFORMED_DIRECTIVE
            }
            Self::UnsupportedMethod { .. } => codes::directive::UNSUPPORTED_METHOD,
            Self::FetchStatus { .. } => codes::directive::FETCH_STATUS,
            Self::Fetch { source, .. } => source.error_code(),
            Self::BudgetExhausted { .. } => codes::directive::FETCH_BUDGET_EXHAUSTED,
            Self::MaxDepthExceeded { .. } => codes::directive::MAX_DIRECTIVE_DEPTH,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::Malformed { span, .. }
            | Self::UnsupportedMethod { span, .. }
            | Self::FetchStatus { span, .. }
            | Self::Fetch { span, .. }
            | Self::BudgetExhausted { span, .. }
            | Self::MaxDepthExceeded { span, .. }
            | Self::UnexpectedToken { span, .. } => *span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_errors_keep_transport_code() {
        let error = DirectiveError::Fetch {
            span: Span::dummy(),
            source: FetchError::ResponseTooLarge {
                url: "https://a.test".to_string(),
                max: 10,
            },
        };
        assert_eq!(error.error_code(), codes::directive::RESPONSE_TOO_LARGE);
    }

    #[test]
    fn test_codes() {
        let span = Span::dummy();
        assert_eq!(
            DirectiveError::malformed("empty request", span).error_code(),
            codes::directive::MALFORMED_DIRECTIVE
        );
        assert_eq!(
            DirectiveError::FetchStatus {
                url: "u".to_string(),
                status: 500,
                span
            }
            .error_code(),
            codes::directive::FETCH_STATUS
        );
    }
}
