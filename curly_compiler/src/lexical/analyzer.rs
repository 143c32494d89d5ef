//! Character-level lexer for curly templates
//!
//! [`next_token`] is the pure contract: one token from a cursor and a nesting
//! depth. [`LexicalAnalyzer`] wraps it with the token budget, metrics and
//! logging.

use crate::config::compile_time::lexical::{MAX_TEXT_TOKEN_LENGTH, MAX_TOKEN_COUNT};
use crate::config::runtime::LexicalPreferences;
use crate::logging::{self, codes};
use crate::tokens::{SpannedToken, Token, TokenKind, TokenStream};
use crate::utils::{Position, Span};
use crate::log_error;

/// Lexical analysis errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexerError {
    #[error("Lexer called at byte offset {offset}, past end of input")]
    EndOfInput { offset: usize },

    #[error("Token limit exceeded: {count} tokens (max: {max})")]
    TooManyTokens { count: usize, max: usize },
}

impl LexerError {
    pub fn error_code(&self) -> crate::logging::Code {
        match self {
            LexerError::EndOfInput { .. } => codes::lexical::END_OF_INPUT,
            LexerError::TooManyTokens { .. } => codes::lexical::TOKEN_LIMIT_EXCEEDED,
        }
    }

    pub fn requires_halt(&self) -> bool {
        codes::requires_halt(self.error_code().as_str())
    }
}

/// Cursor threaded through the lexer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexState {
    pub position: Position,
    /// Unmatched open delimiters seen so far
    pub depth: usize,
}

impl LexState {
    pub fn start() -> Self {
        Self {
            position: Position::start(),
            depth: 0,
        }
    }

    pub fn offset(&self) -> usize {
        self.position.offset
    }

    pub fn is_at_end(&self, source: &str) -> bool {
        self.position.offset >= source.len()
    }
}

/// One token plus the cursor after it
#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme {
    pub token: SpannedToken,
    pub state: LexState,
}

/// Produce exactly one token at `state`.
///
/// Rules, first match wins: `{{{`, `{{`, `}}}`, `}}`, a whitespace run, then
/// literal text. Text swallows its first character unconditionally so a lone
/// brace becomes ordinary text. Inside a group (depth > 0) whitespace ends a
/// text run.
pub fn next_token(source: &str, state: LexState) -> Result<Lexeme, LexerError> {
    let offset = state.position.offset;
    let rest = source.get(offset..).unwrap_or("");
    let first = rest
        .chars()
        .next()
        .ok_or(LexerError::EndOfInput { offset })?;

    let (kind, len, depth) = if rest.starts_with("{{{") {
        (TokenKind::OpenTriple, 3, state.depth + 1)
    } else if rest.starts_with("{{") {
        (TokenKind::OpenDouble, 2, state.depth + 1)
    } else if rest.starts_with("}}}") {
        (TokenKind::CloseTriple, 3, state.depth.saturating_sub(1))
    } else if rest.starts_with("}}") {
        (TokenKind::CloseDouble, 2, state.depth.saturating_sub(1))
    } else if first.is_whitespace() {
        let len = rest
            .find(|c: char| !c.is_whitespace())
            .unwrap_or(rest.len());
        (TokenKind::Whitespace, len, state.depth)
    } else {
        (
            TokenKind::Text,
            text_run_length(rest, first, state.depth > 0),
            state.depth,
        )
    };

    let text = &rest[..len];
    let end = state.position.advance_str(text);

    Ok(Lexeme {
        token: SpannedToken::new(Token::new(kind, text), Span::new(state.position, end)),
        state: LexState {
            position: end,
            depth,
        },
    })
}

/// Byte length of the text token starting with `first`.
/// Runs longer than the build limit are cut so the next call continues them.
fn text_run_length(rest: &str, first: char, stop_at_whitespace: bool) -> usize {
    let mut len = first.len_utf8();
    for ch in rest[len..].chars() {
        if ch == '{' || ch == '}' || (stop_at_whitespace && ch.is_whitespace()) {
            break;
        }
        if len + ch.len_utf8() > MAX_TEXT_TOKEN_LENGTH {
            break;
        }
        len += ch.len_utf8();
    }
    len
}

/// Counters collected while lexing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LexicalMetrics {
    pub total_tokens: usize,
    pub text_tokens: usize,
    pub whitespace_tokens: usize,
    pub open_delimiters: usize,
    pub close_delimiters: usize,
    pub max_depth: usize,
    pub max_text_length: usize,
}

impl LexicalMetrics {
    pub(crate) fn record_token(&mut self, lexeme: &Lexeme) {
        let token = &lexeme.token.value;
        self.total_tokens += 1;

        match token.kind {
            TokenKind::Text => {
                self.text_tokens += 1;
                self.max_text_length = self.max_text_length.max(token.text.len());
            }
            TokenKind::Whitespace => self.whitespace_tokens += 1,
            TokenKind::OpenDouble | TokenKind::OpenTriple => self.open_delimiters += 1,
            TokenKind::CloseDouble | TokenKind::CloseTriple => self.close_delimiters += 1,
            _ => {}
        }

        self.max_depth = self.max_depth.max(lexeme.state.depth);
    }

    /// Open delimiters without a close; a cheap hint of unterminated groups
    pub fn unbalanced_delimiters(&self) -> usize {
        self.open_delimiters.saturating_sub(self.close_delimiters)
    }
}

/// Stateful lexer with token budget and metrics
pub struct LexicalAnalyzer {
    metrics: LexicalMetrics,
    preferences: LexicalPreferences,
    token_count: usize,
    max_tokens: usize,
}

impl LexicalAnalyzer {
    pub fn new() -> Self {
        Self::with_preferences(LexicalPreferences::default())
    }

    pub fn with_preferences(preferences: LexicalPreferences) -> Self {
        Self {
            metrics: LexicalMetrics::default(),
            preferences,
            token_count: 0,
            max_tokens: MAX_TOKEN_COUNT,
        }
    }

    /// Lower the token budget; never above the build-time ceiling
    pub fn with_token_budget(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens.min(MAX_TOKEN_COUNT);
        self
    }

    pub fn token_budget(&self) -> usize {
        self.max_tokens
    }

    /// [`next_token`] with the token budget applied
    pub fn next_token(&mut self, source: &str, state: LexState) -> Result<Lexeme, LexerError> {
        if self.token_count >= self.max_tokens {
            let error = LexerError::TooManyTokens {
                count: self.token_count,
                max: self.max_tokens,
            };
            log_error!(error.error_code(), "Token limit exceeded",
                span = Span::new(state.position, state.position),
                "tokens_processed" => self.token_count,
                "max_tokens" => self.max_tokens
            );
            return Err(error);
        }

        let lexeme = next_token(source, state)?;
        self.token_count += 1;

        if self.preferences.collect_detailed_metrics {
            self.metrics.record_token(&lexeme);
        } else {
            self.metrics.total_tokens += 1;
        }

        Ok(lexeme)
    }

    /// Raw token stream for the whole source
    pub fn tokenize(&mut self, source: &str) -> Result<TokenStream, LexerError> {
        self.reset();

        let mut tokens = TokenStream::default();
        let mut state = LexState::start();

        while !state.is_at_end(source) {
            let lexeme = self.next_token(source, state)?;
            state = lexeme.state;
            tokens.push(lexeme.token);
        }

        Ok(tokens)
    }

    /// Fields reported with `TOKENIZATION_COMPLETE`
    ///
    /// Per-kind counts are only included when `log_token_statistics` is set.
    pub fn statistics(&self) -> Vec<(&'static str, usize)> {
        let mut fields = vec![("token_count", self.metrics.total_tokens)];
        if self.preferences.log_token_statistics {
            fields.extend([
                ("text_tokens", self.metrics.text_tokens),
                ("whitespace_tokens", self.metrics.whitespace_tokens),
                ("open_delimiters", self.metrics.open_delimiters),
                ("close_delimiters", self.metrics.close_delimiters),
                ("max_depth", self.metrics.max_depth),
                ("max_tokens", self.max_tokens),
            ]);
        }
        fields
    }

    pub fn log_statistics(&self) {
        let values: Vec<(&str, String)> = self
            .statistics()
            .into_iter()
            .map(|(key, value)| (key, value.to_string()))
            .collect();
        let context = values.iter().map(|(k, v)| (*k, v.as_str())).collect();
        logging::log_success_with_context(
            codes::success::TOKENIZATION_COMPLETE,
            "Lexical analysis completed",
            context,
        );
    }

    pub fn metrics(&self) -> &LexicalMetrics {
        &self.metrics
    }

    pub fn preferences(&self) -> &LexicalPreferences {
        &self.preferences
    }

    pub fn reset(&mut self) {
        self.metrics = LexicalMetrics::default();
        self.token_count = 0;
    }
}

impl Default for LexicalAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
