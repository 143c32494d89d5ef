//! Index-based evaluation of structural groups
//!
//! Every `resolve_*` method takes the index of its first token and returns the
//! produced text plus the index just past what it consumed. Nested groups can
//! span any number of tokens, so callers always continue from the returned
//! index.

use crate::config::compile_time::directives::{MAX_DIRECTIVE_DEPTH, MAX_FETCHES_PER_RENDER};
use crate::directives::error::DirectiveError;
use crate::directives::fetch::Fetcher;
use crate::logging::codes;
use crate::render::RenderError;
use crate::substitution::{lookup, value_to_string, SubstitutionData};
use crate::tokens::{TokenKind, TokenStream};
use crate::utils::Span;
use crate::{log_debug, log_error, log_success, log_warning};

/// Counters for one render
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationStats {
    pub references_resolved: usize,
    pub references_missing: usize,
    pub directives_evaluated: usize,
    pub fetches_dispatched: usize,
    pub fetches_failed: usize,
}

pub struct Evaluator<'a> {
    data: &'a SubstitutionData,
    fetcher: &'a dyn Fetcher,
    max_fetches: usize,
    directive_depth: usize,
    diagnostics: Vec<RenderError>,
    stats: EvaluationStats,
}

impl<'a> Evaluator<'a> {
    pub fn new(data: &'a SubstitutionData, fetcher: &'a dyn Fetcher) -> Self {
        Self {
            data,
            fetcher,
            max_fetches: MAX_FETCHES_PER_RENDER,
            directive_depth: 0,
            diagnostics: Vec::new(),
            stats: EvaluationStats::default(),
        }
    }

    /// Lower the per-render fetch budget; the build ceiling still applies
    pub fn with_fetch_budget(mut self, max_fetches: usize) -> Self {
        self.max_fetches = max_fetches.min(MAX_FETCHES_PER_RENDER);
        self
    }

    pub fn stats(&self) -> EvaluationStats {
        self.stats
    }

    pub fn diagnostics(&self) -> &[RenderError] {
        &self.diagnostics
    }

    pub fn into_parts(self) -> (Vec<RenderError>, EvaluationStats) {
        (self.diagnostics, self.stats)
    }

    /// Resolve a reference group starting at `index`.
    ///
    /// Inner text is concatenated, whitespace dropped and nested groups
    /// resolved in place; the result is looked up in the substitution data.
    pub fn resolve_reference(&mut self, tokens: &TokenStream, index: usize) -> (String, usize) {
        let Some(start) = tokens.get(index) else {
            return (String::new(), index);
        };
        let span = start.span;
        let mut path = start.value.text.trim_start_matches('{').to_string();
        let mut cursor = index + 1;

        loop {
            let Some(token) = tokens.get(cursor) else {
                self.record(DirectiveError::malformed("reference is never closed", span));
                return (String::new(), cursor);
            };

            match token.value.kind {
                TokenKind::Text => {
                    path.push_str(&token.value.text);
                    cursor += 1;
                }
                TokenKind::Whitespace => cursor += 1,
                TokenKind::ReferenceStart | TokenKind::DirectiveStart => {
                    let (nested, next) = self.resolve_group(tokens, cursor);
                    path.push_str(&nested);
                    cursor = next;
                }
                TokenKind::ReferenceEnd => {
                    cursor += 1;
                    break;
                }
                _ => {
                    self.record(DirectiveError::UnexpectedToken {
                        found: token.value.kind.to_string(),
                        span: token.span,
                    });
                    return (String::new(), tokens.group_end(index));
                }
            }
        }

        match lookup(self.data, &path) {
            Ok(value) => {
                self.stats.references_resolved += 1;
                log_debug!("Resolved reference", "path" => path.trim());
                (value_to_string(value), cursor)
            }
            Err(error) => {
                self.stats.references_missing += 1;
                self.record_at(error.into(), span);
                (String::new(), cursor)
            }
        }
    }

    /// Gather one word of a directive request.
    ///
    /// Stops after a whitespace token (consumed) or before a directive end
    /// (left for the caller).
    pub fn resolve_word(&mut self, tokens: &TokenStream, index: usize) -> (String, usize) {
        let mut word = String::new();
        let mut cursor = index;

        while let Some(token) = tokens.get(cursor) {
            match token.value.kind {
                TokenKind::Text => {
                    word.push_str(&token.value.text);
                    cursor += 1;
                }
                TokenKind::Whitespace => {
                    cursor += 1;
                    break;
                }
                TokenKind::DirectiveEnd => break,
                TokenKind::ReferenceStart | TokenKind::DirectiveStart => {
                    let (nested, next) = self.resolve_group(tokens, cursor);
                    word.push_str(&nested);
                    cursor = next;
                }
                _ => {
                    self.record(DirectiveError::UnexpectedToken {
                        found: token.value.kind.to_string(),
                        span: token.span,
                    });
                    cursor += 1;
                }
            }
        }

        (word, cursor)
    }

    /// Evaluate an `x-url` directive starting at `index` and return the
    /// fetched body, or empty text when anything goes wrong.
    pub fn resolve_directive(&mut self, tokens: &TokenStream, index: usize) -> (String, usize) {
        let Some(start) = tokens.get(index) else {
            return (String::new(), index);
        };
        let span = start.span;

        if self.directive_depth >= MAX_DIRECTIVE_DEPTH {
            self.record(DirectiveError::MaxDepthExceeded {
                max: MAX_DIRECTIVE_DEPTH,
                span,
            });
            return (String::new(), tokens.group_end(index));
        }

        self.directive_depth += 1;
        let result = self.evaluate_directive(tokens, index, span);
        self.directive_depth -= 1;
        result
    }

    fn evaluate_directive(&mut self, tokens: &TokenStream, index: usize, span: Span) -> (String, usize) {
        self.stats.directives_evaluated += 1;

        let mut words = Vec::new();
        let mut cursor = index + 1;

        loop {
            match tokens.kind_at(cursor) {
                Some(TokenKind::DirectiveEnd) => break,
                None => {
                    self.record(DirectiveError::malformed("missing closing braces", span));
                    return (String::new(), cursor);
                }
                Some(_) => {
                    let (word, next) = self.resolve_word(tokens, cursor);
                    if !word.is_empty() {
                        words.push(word);
                    }
                    cursor = next;
                }
            }
        }
        let end = cursor + 1;

        // Substituted values may themselves contain spaces, so split after joining
        let request = words.join(" ");
        let parts: Vec<&str> = request.split_whitespace().collect();

        let (method, url) = match parts.as_slice() {
            [] => {
                self.record(DirectiveError::malformed("empty request", span));
                return (String::new(), end);
            }
            [url] => ("get".to_string(), *url),
            [method, url] => (method.to_lowercase(), *url),
            _ => {
                self.record(DirectiveError::malformed(
                    format!("expected '<method> <url>', found '{}'", request),
                    span,
                ));
                return (String::new(), end);
            }
        };

        if method != "get" {
            self.record(DirectiveError::UnsupportedMethod { method, span });
            return (String::new(), end);
        }

        (self.dispatch(&method, url, span), end)
    }

    fn dispatch(&mut self, method: &str, url: &str, span: Span) -> String {
        if self.stats.fetches_dispatched >= self.max_fetches {
            self.record(DirectiveError::BudgetExhausted {
                max: self.max_fetches,
                span,
            });
            return String::new();
        }

        self.stats.fetches_dispatched += 1;

        match self.fetcher.fetch(method, url) {
            Ok(response) if response.is_success() => {
                log_success!(codes::success::FETCH_COMPLETE,
                    "Directive fetch completed",
                    "url" => url,
                    "status" => response.status,
                    "bytes" => response.body.len()
                );
                response.body
            }
            Ok(response) => {
                self.stats.fetches_failed += 1;
                self.record(DirectiveError::FetchStatus {
                    url: url.to_string(),
                    status: response.status,
                    span,
                });
                String::new()
            }
            Err(source) => {
                self.stats.fetches_failed += 1;
                self.record(DirectiveError::Fetch { span, source });
                String::new()
            }
        }
    }

    fn resolve_group(&mut self, tokens: &TokenStream, index: usize) -> (String, usize) {
        match tokens.kind_at(index) {
            Some(TokenKind::DirectiveStart) => self.resolve_directive(tokens, index),
            Some(TokenKind::ReferenceStart) => self.resolve_reference(tokens, index),
            _ => (String::new(), index + 1),
        }
    }

    fn record(&mut self, error: DirectiveError) {
        let span = error.span();
        self.record_at(error.into(), span);
    }

    fn record_at(&mut self, error: RenderError, span: Span) {
        let message = error.to_string();
        if error.is_warning() {
            log_warning!(code = error.error_code(), &message, span = span);
        } else {
            log_error!(error.error_code(), &message, span = span);
        }
        self.diagnostics.push(error);
    }
}
