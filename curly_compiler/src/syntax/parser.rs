//! Recursive group parser
//!
//! Drives the lexer one token at a time and folds every balanced `{{ }}` or
//! `{{{ }}}` group into structural tokens. Text outside groups passes through
//! unchanged.

use crate::config::compile_time::syntax::{MAX_ERROR_HISTORY, MAX_PARSE_DEPTH};
use crate::lexical::{LexState, Lexeme, LexerError, LexicalAnalyzer, LexicalMetrics};
use crate::logging::codes;
use crate::syntax::error::SyntaxError;
use crate::tokens::{SpannedToken, Token, TokenKind, TokenStream};
use crate::utils::Span;
use crate::{log_debug, log_error, log_success, log_warning};

/// Parsed document plus everything reported along the way
#[derive(Debug, Clone, Default)]
pub struct ParseOutput {
    pub tokens: TokenStream,
    pub diagnostics: Vec<SyntaxError>,
}

impl ParseOutput {
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| !d.is_warning()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_warning()).count()
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// A group that could not be closed. `state` is where parsing resumes.
#[derive(Debug)]
struct GroupFailure {
    error: SyntaxError,
    state: LexState,
}

type GroupResult = Result<(Vec<SpannedToken>, LexState), GroupFailure>;

/// Tokens of one group under construction.
///
/// `current` is the token still accepting text; in reference mode text and
/// whitespace are appended to it. `finished` holds everything already sealed.
struct GroupBuilder {
    current: Option<SpannedToken>,
    finished: Vec<SpannedToken>,
    directive: bool,
    inner_count: usize,
}

impl GroupBuilder {
    fn new(open: SpannedToken) -> Self {
        let start = SpannedToken::new(
            Token::new(TokenKind::ReferenceStart, open.value.text),
            open.span,
        );
        Self {
            current: Some(start),
            finished: Vec::new(),
            directive: false,
            inner_count: 0,
        }
    }

    fn accepts_keyword(&self, token: &SpannedToken) -> bool {
        self.inner_count == 0 && token.value.is_directive_keyword()
    }

    /// Relabel the group as a directive; the keyword joins the start token
    fn reclassify(&mut self, keyword: SpannedToken) {
        if let Some(start) = self.current.as_mut() {
            start.value.kind = TokenKind::DirectiveStart;
            start.value.text.push_str(&keyword.value.text);
            start.span = start.span.merge(keyword.span);
        }
        self.directive = true;
    }

    fn push_word(&mut self, token: SpannedToken) {
        if self.directive {
            self.flush();
            self.finished.push(token);
            return;
        }

        match self.current.as_mut() {
            Some(current) => {
                current.value.text.push_str(&token.value.text);
                current.span = current.span.merge(token.span);
            }
            None => {
                self.current = Some(SpannedToken::new(Token::text(token.value.text), token.span));
            }
        }
    }

    fn splice(&mut self, nested: Vec<SpannedToken>) {
        self.flush();
        self.finished.extend(nested);
    }

    fn flush(&mut self) {
        if let Some(token) = self.current.take() {
            self.finished.push(token);
        }
    }

    fn finish(mut self, close: SpannedToken) -> Vec<SpannedToken> {
        self.flush();
        let kind = if self.directive {
            TokenKind::DirectiveEnd
        } else {
            TokenKind::ReferenceEnd
        };
        self.finished
            .push(SpannedToken::new(Token::new(kind, close.value.text), close.span));
        self.finished
    }
}

pub struct TemplateParser<'a> {
    source: &'a str,
    lexer: LexicalAnalyzer,
    diagnostics: Vec<SyntaxError>,
    dropped_diagnostics: usize,
}

impl<'a> TemplateParser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self::with_analyzer(source, LexicalAnalyzer::new())
    }

    pub fn with_analyzer(source: &'a str, lexer: LexicalAnalyzer) -> Self {
        log_debug!("Creating template parser", "bytes" => source.len());

        Self {
            source,
            lexer,
            diagnostics: Vec::new(),
            dropped_diagnostics: 0,
        }
    }

    /// Parse the whole source. Never fails; problems land in `diagnostics`.
    pub fn parse(&mut self) -> ParseOutput {
        self.lexer.reset();
        self.diagnostics.clear();
        self.dropped_diagnostics = 0;

        let mut tokens = TokenStream::default();
        let mut state = LexState::start();

        while !state.is_at_end(self.source) {
            let group_start = state;
            let lexeme = match self.lexer.next_token(self.source, state) {
                Ok(lexeme) => lexeme,
                Err(error) => {
                    self.record(error.into());
                    tokens.extend(self.remainder(state));
                    break;
                }
            };
            state = lexeme.state;
            let kind = lexeme.token.value.kind;

            match kind {
                TokenKind::Text | TokenKind::Whitespace => tokens.push(lexeme.token),
                kind if kind.is_open() => match self.parse_group(lexeme, 1) {
                    Ok((group, after)) => {
                        tokens.extend(group);
                        state = after;
                    }
                    Err(failure @ GroupFailure {
                        error: SyntaxError::Lexical(_),
                        ..
                    }) => {
                        // Out of tokens: the unfinished group and the rest stay literal
                        self.record(failure.error);
                        tokens.extend(self.remainder(group_start));
                        break;
                    }
                    Err(failure) => {
                        let stop = matches!(failure.error, SyntaxError::Unterminated { .. });
                        self.record(failure.error);
                        state = failure.state;
                        if stop {
                            break;
                        }
                    }
                },
                _ => {
                    let close = lexeme.token;
                    self.record(SyntaxError::unmatched_close(&close.value.text, close.span));
                    tokens.push(SpannedToken::new(Token::text(close.value.text), close.span));
                }
            }
        }

        if self.dropped_diagnostics > 0 {
            log_warning!("Syntax diagnostics beyond the history limit were not kept",
                "dropped" => self.dropped_diagnostics,
                "max_error_history" => MAX_ERROR_HISTORY
            );
        }

        self.lexer.log_statistics();

        let output = ParseOutput {
            tokens,
            diagnostics: std::mem::take(&mut self.diagnostics),
        };

        log_success!(codes::success::PARSE_COMPLETE,
            "Template parsing completed",
            "tokens" => output.tokens.len(),
            "references" => output.tokens.count_kind(TokenKind::ReferenceStart),
            "directives" => output.tokens.count_kind(TokenKind::DirectiveStart),
            "errors" => output.error_count(),
            "warnings" => output.warning_count()
        );

        output
    }

    /// Metrics of the lexer run behind the last parse
    pub fn lexical_metrics(&self) -> &LexicalMetrics {
        self.lexer.metrics()
    }

    /// Unlexed source from `state` on, as one literal text token
    fn remainder(&self, state: LexState) -> Option<SpannedToken> {
        let rest = self.source.get(state.offset()..).filter(|rest| !rest.is_empty())?;
        let span = Span::new(state.position, state.position.advance_str(rest));
        Some(SpannedToken::new(Token::text(rest), span))
    }

    /// Parse one group whose open delimiter was just lexed
    fn parse_group(&mut self, open: Lexeme, nesting: usize) -> GroupResult {
        let open_token = open.token;
        let entry_depth = open.state.depth;
        let mut state = open.state;

        if nesting > MAX_PARSE_DEPTH {
            self.record(SyntaxError::MaxNestingExceeded {
                depth: nesting,
                max: MAX_PARSE_DEPTH,
                span: open_token.span,
            });
            return self.skip_group(&open_token, state, entry_depth);
        }

        let close_kind = match open_token.value.kind {
            TokenKind::OpenTriple => TokenKind::CloseTriple,
            _ => TokenKind::CloseDouble,
        };
        let mut builder = GroupBuilder::new(open_token.clone());

        loop {
            let lexeme = match self.lexer.next_token(self.source, state) {
                Ok(lexeme) => lexeme,
                Err(LexerError::EndOfInput { .. }) => {
                    return Err(GroupFailure {
                        error: SyntaxError::unterminated(&open_token.value.text, open_token.span),
                        state,
                    });
                }
                Err(error) => {
                    return Err(GroupFailure {
                        error: error.into(),
                        state,
                    });
                }
            };
            state = lexeme.state;
            let kind = lexeme.token.value.kind;

            match kind {
                TokenKind::Text if builder.accepts_keyword(&lexeme.token) => {
                    builder.reclassify(lexeme.token);
                }
                TokenKind::Text | TokenKind::Whitespace => builder.push_word(lexeme.token),
                kind if kind.is_open() => match self.parse_group(lexeme, nesting + 1) {
                    Ok((nested, after)) => {
                        builder.splice(nested);
                        state = after;
                    }
                    Err(GroupFailure {
                        error: SyntaxError::Unterminated { .. },
                        state,
                    }) => {
                        // Report the outermost open group
                        return Err(GroupFailure {
                            error: SyntaxError::unterminated(
                                &open_token.value.text,
                                open_token.span,
                            ),
                            state,
                        });
                    }
                    Err(failure @ GroupFailure {
                        error: SyntaxError::Lexical(_),
                        ..
                    }) => return Err(failure),
                    Err(failure) => {
                        self.record(failure.error);
                        state = failure.state;
                    }
                },
                kind if kind == close_kind => {
                    return Ok((builder.finish(lexeme.token), state));
                }
                _ => {
                    return Err(GroupFailure {
                        error: SyntaxError::unexpected_token(
                            close_kind.as_str(),
                            &lexeme.token.value.text,
                            lexeme.token.span,
                        ),
                        state,
                    });
                }
            }

            builder.inner_count += 1;
        }
    }

    /// Consume a too-deep group without building tokens
    fn skip_group(
        &mut self,
        open_token: &SpannedToken,
        mut state: LexState,
        entry_depth: usize,
    ) -> GroupResult {
        loop {
            match self.lexer.next_token(self.source, state) {
                Ok(lexeme) => {
                    state = lexeme.state;
                    if state.depth < entry_depth {
                        return Ok((Vec::new(), state));
                    }
                }
                Err(LexerError::EndOfInput { .. }) => {
                    return Err(GroupFailure {
                        error: SyntaxError::unterminated(&open_token.value.text, open_token.span),
                        state,
                    });
                }
                Err(error) => {
                    return Err(GroupFailure {
                        error: error.into(),
                        state,
                    });
                }
            }
        }
    }

    fn record(&mut self, error: SyntaxError) {
        let span = error.span().unwrap_or_default();
        let message = error.to_string();

        match &error {
            // Already logged by the lexer
            SyntaxError::Lexical(_) => {}
            e if e.is_warning() => {
                log_warning!(code = e.error_code(), &message, span = span);
            }
            e => {
                log_error!(e.error_code(), &message, span = span,
                    "action" => e.recommended_action()
                );
            }
        }

        if self.diagnostics.len() < MAX_ERROR_HISTORY {
            self.diagnostics.push(error);
        } else {
            self.dropped_diagnostics += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn parse(source: &str) -> ParseOutput {
        TemplateParser::new(source).parse()
    }

    fn shape(output: &ParseOutput) -> Vec<(TokenKind, &str)> {
        output
            .tokens
            .iter()
            .map(|t| (t.value.kind, t.value.text.as_str()))
            .collect()
    }

    #[test]
    fn test_plain_reference() {
        let output = parse("Hello {{name}}!");
        assert!(output.is_clean());
        assert_eq!(
            shape(&output),
            vec![
                (TokenKind::Text, "Hello "),
                (TokenKind::ReferenceStart, "{{name"),
                (TokenKind::ReferenceEnd, "}}"),
                (TokenKind::Text, "!"),
            ]
        );
    }

    #[test]
    fn test_reference_accumulates_whitespace() {
        let output = parse("{{{ a.b }}}");
        assert_eq!(
            shape(&output),
            vec![
                (TokenKind::ReferenceStart, "{{{ a.b "),
                (TokenKind::ReferenceEnd, "}}}"),
            ]
        );
    }

    #[test]
    fn test_directive_keeps_words_separate() {
        let output = parse("{{x-url get https://h?id={{id}} }}");
        assert!(output.is_clean());
        assert_eq!(
            shape(&output),
            vec![
                (TokenKind::DirectiveStart, "{{x-url"),
                (TokenKind::Whitespace, " "),
                (TokenKind::Text, "get"),
                (TokenKind::Whitespace, " "),
                (TokenKind::Text, "https://h?id="),
                (TokenKind::ReferenceStart, "{{id"),
                (TokenKind::ReferenceEnd, "}}"),
                (TokenKind::Whitespace, " "),
                (TokenKind::DirectiveEnd, "}}"),
            ]
        );
    }

    #[test]
    fn test_keyword_must_come_first() {
        let output = parse("{{ x-url get u}}");
        assert_eq!(
            shape(&output),
            vec![
                (TokenKind::ReferenceStart, "{{ x-url get u"),
                (TokenKind::ReferenceEnd, "}}"),
            ]
        );
    }

    #[test]
    fn test_keyword_prefix_is_not_a_directive() {
        let output = parse("{{x-urls}}");
        assert_eq!(output.tokens.count_kind(TokenKind::DirectiveStart), 0);
        assert_eq!(output.tokens[0].value.text, "{{x-urls");
    }

    #[test]
    fn test_nested_directives() {
        let output = parse("{{x-url {{x-url {{foo}} }} }}");
        assert!(output.is_clean());
        let kinds: Vec<TokenKind> = output.tokens.iter().map(|t| t.value.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::DirectiveStart,
                TokenKind::Whitespace,
                TokenKind::DirectiveStart,
                TokenKind::Whitespace,
                TokenKind::ReferenceStart,
                TokenKind::ReferenceEnd,
                TokenKind::Whitespace,
                TokenKind::DirectiveEnd,
                TokenKind::Whitespace,
                TokenKind::DirectiveEnd,
            ]
        );
    }

    #[test]
    fn test_text_after_nested_group_is_its_own_token() {
        let output = parse("{{a{{b}}c}}");
        assert_eq!(
            shape(&output),
            vec![
                (TokenKind::ReferenceStart, "{{a"),
                (TokenKind::ReferenceStart, "{{b"),
                (TokenKind::ReferenceEnd, "}}"),
                (TokenKind::Text, "c"),
                (TokenKind::ReferenceEnd, "}}"),
            ]
        );
    }

    #[test]
    fn test_unterminated_keeps_prefix() {
        let output = parse("ok {{ open");
        assert_eq!(shape(&output), vec![(TokenKind::Text, "ok ")]);
        assert_eq!(output.diagnostics.len(), 1);
        assert_matches!(
            &output.diagnostics[0],
            SyntaxError::Unterminated { span, .. } if span.start.offset == 3
        );
        assert_eq!(output.warning_count(), 1);
        assert_eq!(output.error_count(), 0);
    }

    #[test]
    fn test_unterminated_nested_reports_outermost_group() {
        let output = parse("a {{b {{c");
        assert_eq!(shape(&output), vec![(TokenKind::Text, "a ")]);
        assert_eq!(output.diagnostics.len(), 1);
        assert_matches!(
            &output.diagnostics[0],
            SyntaxError::Unterminated { span, .. } if span.start.offset == 2
        );
    }

    #[test]
    fn test_stray_close_stays_literal() {
        let source = "a }} b";
        let output = parse(source);
        assert_eq!(output.tokens.concat_text(), source);
        assert_matches!(&output.diagnostics[..], [SyntaxError::UnmatchedClose { .. }]);
    }

    #[test]
    fn test_mismatched_close_drops_group() {
        let output = parse("x{{{a}}y");
        assert_eq!(shape(&output), vec![(TokenKind::Text, "x"), (TokenKind::Text, "y")]);
        assert_matches!(
            &output.diagnostics[..],
            [SyntaxError::UnexpectedToken { found, .. }] if found == "}}"
        );
    }

    #[test]
    fn test_nested_failure_keeps_enclosing_group() {
        let output = parse("{{a{{{b}}c}}");
        assert_eq!(
            shape(&output),
            vec![
                (TokenKind::ReferenceStart, "{{ac"),
                (TokenKind::ReferenceEnd, "}}"),
            ]
        );
        assert_eq!(output.error_count(), 1);
    }

    #[test]
    fn test_nesting_limit() {
        let levels = MAX_PARSE_DEPTH + 1;
        let source = format!("{}{} tail", "{{a".repeat(levels), "}}b".repeat(levels));

        let output = parse(&source);

        assert_matches!(
            &output.diagnostics[..],
            [SyntaxError::MaxNestingExceeded { depth, .. }] if *depth == levels
        );
        let last = output.tokens.tokens().last().unwrap();
        assert_eq!(last.value.text, "b tail");
    }

    #[test]
    fn test_plain_text_round_trips() {
        let source = "no groups here\n { single } braces";
        let output = parse(source);
        assert!(output.is_clean());
        assert_eq!(output.tokens.concat_text(), source);
    }

    #[test]
    fn test_lexical_metrics_available_after_parse() {
        let mut parser = TemplateParser::new("{{a}} {{b}}");
        parser.parse();
        assert_eq!(parser.lexical_metrics().open_delimiters, 2);
    }

    fn parse_with_budget(source: &str, max_tokens: usize) -> ParseOutput {
        let analyzer = LexicalAnalyzer::new().with_token_budget(max_tokens);
        TemplateParser::with_analyzer(source, analyzer).parse()
    }

    #[test]
    fn test_token_budget_keeps_remaining_text() {
        let source = "a}}b}}c}}";
        let output = parse_with_budget(source, 3);

        assert_matches!(
            &output.diagnostics[..],
            [SyntaxError::UnmatchedClose { .. }, SyntaxError::Lexical(LexerError::TooManyTokens { max: 3, .. })]
        );
        assert_eq!(output.tokens.concat_text(), source);
        let last = output.tokens.tokens().last().unwrap();
        assert_eq!(last.value.text, "}}c}}");
        assert_eq!(last.span.start.offset, 4);
        assert_eq!(last.span.end.offset, source.len());
    }

    #[test]
    fn test_token_budget_inside_group_keeps_group_literal() {
        let source = "ab {{name}} {{other}} tail";
        let output = parse_with_budget(source, 7);

        assert_eq!(output.error_count(), 1);
        assert_matches!(
            &output.diagnostics[..],
            [SyntaxError::Lexical(LexerError::TooManyTokens { .. })]
        );
        assert_eq!(output.tokens.concat_text(), source);
        assert_eq!(output.tokens.count_kind(TokenKind::ReferenceStart), 1);
        let last = output.tokens.tokens().last().unwrap();
        assert_eq!(last.value.kind, TokenKind::Text);
        assert_eq!(last.value.text, "{{other}} tail");
    }

    #[test]
    fn test_repeated_groups_survive_small_budget() {
        let source = "x{{y}}".repeat(20);
        let output = parse_with_budget(&source, 10);
        assert_eq!(output.tokens.concat_text(), source);
        assert_eq!(output.tokens.count_kind(TokenKind::ReferenceStart), 2);
    }
}
