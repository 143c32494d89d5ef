//! Lexical analysis for curly templates
//!
//! The raw token stream produced here is not what the renderer consumes; the
//! parser drives the lexer token by token and folds brace groups. Full
//! tokenization is used for metrics and for checking the round-trip property.

pub mod analyzer;

use crate::config::compile_time::lexical::{MAX_TEXT_TOKEN_LENGTH, MAX_TOKEN_COUNT};
use crate::tokens::{TokenKind, TokenStream};

pub use analyzer::{next_token, LexState, Lexeme, LexerError, LexicalAnalyzer, LexicalMetrics};

/// Tokenize source text with default preferences
pub fn tokenize_source(source: &str) -> Result<TokenStream, LexerError> {
    LexicalAnalyzer::new().tokenize(source)
}

/// Check that a raw stream concatenates back to its source
pub fn validate_tokenization(tokens: &TokenStream, source: &str) -> Result<(), String> {
    if let Some(token) = tokens.iter().find(|t| t.value.kind.is_structural()) {
        return Err(format!(
            "Raw stream contains structural token {} at {}",
            token.value.kind, token.span
        ));
    }

    let rebuilt = tokens.concat_text();
    if rebuilt != source {
        return Err(format!(
            "Token texts rebuild {} bytes, source has {}",
            rebuilt.len(),
            source.len()
        ));
    }

    Ok(())
}

/// Build-time lexer limits
#[derive(Debug, Clone, Copy)]
pub struct SecurityLimits {
    pub max_token_count: usize,
    pub max_text_token_length: usize,
}

pub fn get_security_limits() -> SecurityLimits {
    SecurityLimits {
        max_token_count: MAX_TOKEN_COUNT,
        max_text_token_length: MAX_TEXT_TOKEN_LENGTH,
    }
}

/// Per-kind token counts of a raw stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenCounts {
    pub text: usize,
    pub whitespace: usize,
    pub open: usize,
    pub close: usize,
}

impl TokenCounts {
    pub fn from_stream(tokens: &TokenStream) -> Self {
        let mut counts = Self::default();
        for token in tokens {
            match token.value.kind {
                TokenKind::Text => counts.text += 1,
                TokenKind::Whitespace => counts.whitespace += 1,
                kind if kind.is_open() => counts.open += 1,
                kind if kind.is_close() => counts.close += 1,
                _ => {}
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.text + self.whitespace + self.open + self.close
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::{SpannedToken, Token};
    use crate::utils::Span;

    #[test]
    fn test_validate_tokenization_accepts_raw_stream() {
        let source = "Dear {{ name }},\n{{x-url get https://example.com/a}}";
        let tokens = tokenize_source(source).unwrap();
        assert!(validate_tokenization(&tokens, source).is_ok());
    }

    #[test]
    fn test_validate_tokenization_rejects_mismatch() {
        let tokens = tokenize_source("abc").unwrap();
        assert!(validate_tokenization(&tokens, "abcd").is_err());

        let mut structural = TokenStream::default();
        structural.push(SpannedToken::new(
            Token::new(TokenKind::ReferenceStart, "{{"),
            Span::dummy(),
        ));
        assert!(validate_tokenization(&structural, "{{").is_err());
    }

    #[test]
    fn test_token_counts() {
        let tokens = tokenize_source("{{a b}} c").unwrap();
        let counts = TokenCounts::from_stream(&tokens);
        assert_eq!(counts.open, 1);
        assert_eq!(counts.close, 1);
        assert_eq!(counts.text, 3);
        assert_eq!(counts.whitespace, 2);
        assert_eq!(counts.total(), tokens.len());
    }

    #[test]
    fn test_security_limits_match_build_profile() {
        let limits = get_security_limits();
        assert_eq!(limits.max_token_count, MAX_TOKEN_COUNT);
        assert!(limits.max_text_token_length > 0);
    }
}
