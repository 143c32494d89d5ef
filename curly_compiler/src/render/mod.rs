//! Template rendering
//!
//! Walks the structured token stream in document order. Literal tokens are
//! copied through, groups are handed to the [`Evaluator`], and every problem
//! met on the way ends up in [`RenderOutput::diagnostics`] instead of
//! aborting the render.

pub mod error;

pub use error::RenderError;

use crate::config::runtime::RenderPreferences;
use crate::directives::{EvaluationStats, Evaluator, Fetcher};
use crate::logging::codes;
use crate::substitution::SubstitutionData;
use crate::tokens::{TokenKind, TokenStream};
use crate::log_success;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Copy reference groups verbatim instead of resolving them
    pub passthrough_references: bool,
    pub max_fetches: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            passthrough_references: false,
            max_fetches: crate::config::compile_time::directives::MAX_FETCHES_PER_RENDER,
        }
    }
}

impl From<&RenderPreferences> for RenderOptions {
    fn from(preferences: &RenderPreferences) -> Self {
        Self {
            passthrough_references: preferences.passthrough_references,
            max_fetches: preferences.max_fetches_per_render,
        }
    }
}

#[derive(Debug, Default)]
pub struct RenderOutput {
    pub text: String,
    pub diagnostics: Vec<RenderError>,
    pub stats: EvaluationStats,
}

impl RenderOutput {
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| !d.is_warning()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_warning()).count()
    }
}

pub struct Renderer<'a> {
    data: &'a SubstitutionData,
    fetcher: &'a dyn Fetcher,
    options: RenderOptions,
}

impl<'a> Renderer<'a> {
    pub fn new(data: &'a SubstitutionData, fetcher: &'a dyn Fetcher) -> Self {
        Self {
            data,
            fetcher,
            options: RenderOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> RenderOptions {
        self.options
    }

    pub fn render(&self, tokens: &TokenStream) -> RenderOutput {
        let mut evaluator =
            Evaluator::new(self.data, self.fetcher).with_fetch_budget(self.options.max_fetches);
        let mut text = String::new();
        let mut index = 0;

        while let Some(token) = tokens.get(index) {
            match token.value.kind {
                TokenKind::DirectiveStart => {
                    let (fetched, next) = evaluator.resolve_directive(tokens, index);
                    text.push_str(&fetched);
                    index = next;
                }
                TokenKind::ReferenceStart if self.options.passthrough_references => {
                    let next = tokens.group_end(index);
                    text.push_str(&tokens.text_between(index, next));
                    index = next;
                }
                TokenKind::ReferenceStart => {
                    let (value, next) = evaluator.resolve_reference(tokens, index);
                    text.push_str(&value);
                    index = next;
                }
                _ => {
                    text.push_str(&token.value.text);
                    index += 1;
                }
            }
        }

        let (diagnostics, stats) = evaluator.into_parts();

        log_success!(codes::success::RENDER_COMPLETE,
            "Template rendered",
            "bytes" => text.len(),
            "directives" => stats.directives_evaluated,
            "fetches" => stats.fetches_dispatched,
            "diagnostics" => diagnostics.len()
        );

        RenderOutput {
            text,
            diagnostics,
            stats,
        }
    }
}

/// Render a token stream in one call
pub fn render(
    tokens: &TokenStream,
    data: &SubstitutionData,
    fetcher: &dyn Fetcher,
    options: RenderOptions,
) -> RenderOutput {
    Renderer::new(data, fetcher).with_options(options).render(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directives::{DirectiveError, StaticFetcher};
    use crate::syntax::{parse, SyntaxError};
    use assert_matches::assert_matches;
    use serde_json::json;

    fn render_str(source: &str, data: &SubstitutionData, options: RenderOptions) -> RenderOutput {
        let fetcher = StaticFetcher::new()
            .with_response("https://api.test/user?id=125", 200, "Jane")
            .with_response("https://api.test/down", 503, "");
        let parsed = parse(source);
        let mut output = render(&parsed.tokens, data, &fetcher, options);
        let mut diagnostics: Vec<RenderError> =
            parsed.diagnostics.into_iter().map(RenderError::from).collect();
        diagnostics.append(&mut output.diagnostics);
        output.diagnostics = diagnostics;
        output
    }

    fn sample_data() -> SubstitutionData {
        SubstitutionData::new(
            json!({"name": "Sam", "id": "125", "items": ["x", "y"]}),
            json!({"company": "Acme", "name": "Global"}),
        )
    }

    #[test]
    fn test_plain_text_is_unchanged() {
        let source = "Hello,\n  world! { not a group } }";
        let output = render_str(source, &sample_data(), RenderOptions::default());
        assert_eq!(output.text, source);
    }

    #[test]
    fn test_references_and_directives() {
        let output = render_str(
            "Hi {{name}} from {{{company}}}: {{x-url get https://api.test/user?id={{id}} }}, {{items[1]}}.",
            &sample_data(),
            RenderOptions::default(),
        );

        assert_eq!(output.text, "Hi Sam from Acme: Jane, y.");
        assert!(output.diagnostics.is_empty());
        assert_eq!(output.stats.fetches_dispatched, 1);
        assert_eq!(output.stats.references_resolved, 4);
    }

    #[test]
    fn test_failed_directive_leaves_surroundings() {
        let output = render_str(
            "a{{x-url post https://api.test/}}b{{x-url https://api.test/down}}c",
            &sample_data(),
            RenderOptions::default(),
        );

        assert_eq!(output.text, "abc");
        assert_eq!(output.error_count(), 2);
        assert_matches!(
            &output.diagnostics[..],
            [
                RenderError::Directive(DirectiveError::UnsupportedMethod { .. }),
                RenderError::Directive(DirectiveError::FetchStatus { status: 503, .. })
            ]
        );
    }

    #[test]
    fn test_missing_reference_renders_empty() {
        let output = render_str("[{{nobody}}]", &sample_data(), RenderOptions::default());
        assert_eq!(output.text, "[]");
        assert_eq!(output.warning_count(), 1);
        assert_eq!(output.error_count(), 0);
    }

    #[test]
    fn test_passthrough_keeps_references_verbatim() {
        let options = RenderOptions {
            passthrough_references: true,
            ..RenderOptions::default()
        };
        let output = render_str(
            "Dear {{ name }}, {{x-url https://api.test/user?id={{id}} }}",
            &sample_data(),
            options,
        );

        // The reference inside the directive is still resolved
        assert_eq!(output.text, "Dear {{ name }}, Jane");
        assert_eq!(output.stats.references_resolved, 1);
    }

    #[test]
    fn test_unbalanced_input_keeps_prefix() {
        let output = render_str("start {{name", &sample_data(), RenderOptions::default());
        assert_eq!(output.text, "start ");
        assert_matches!(
            &output.diagnostics[..],
            [RenderError::Syntax(SyntaxError::Unterminated { .. })]
        );

        let output = render_str("x}}y {{name}}", &sample_data(), RenderOptions::default());
        assert_eq!(output.text, "x}}y Sam");
        assert_eq!(output.warning_count(), 1);
    }

    #[test]
    fn test_options_from_preferences() {
        let preferences = RenderPreferences {
            passthrough_references: true,
            max_fetches_per_render: 3,
        };
        let options = RenderOptions::from(&preferences);
        assert!(options.passthrough_references);
        assert_eq!(options.max_fetches, 3);
    }
}
