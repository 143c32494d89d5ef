//! End-to-end rendering: template file → lexer metrics → parse → render

mod error;
mod result;
mod stats;

pub use error::PipelineError;
pub use result::PipelineResult;
pub use stats::PipelineStats;

use crate::config::RuntimeConfig;
use crate::directives::Fetcher;
use crate::file_processor::FileProcessor;
use crate::lexical::LexicalAnalyzer;
use crate::logging::{self, codes};
use crate::render::{RenderError, RenderOptions, Renderer};
use crate::substitution::SubstitutionData;
use crate::syntax::TemplateParser;
use crate::{log_error, log_info, log_success};
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

/// Render template text that is already in memory
pub fn render_source(
    source: &str,
    data: &SubstitutionData,
    fetcher: &dyn Fetcher,
    config: &RuntimeConfig,
) -> PipelineResult {
    let start_time = Instant::now();
    let mut result = run_stages(source, data, fetcher, config);
    result.elapsed = start_time.elapsed();
    result.log_success("<memory>");
    result
}

/// Load, parse and render a template file
///
/// Only failing to read the template is fatal; everything met while parsing
/// or rendering is returned in [`PipelineResult::diagnostics`].
pub fn render_file(
    template: &Path,
    data: &SubstitutionData,
    fetcher: &dyn Fetcher,
    config: &RuntimeConfig,
) -> Result<PipelineResult, PipelineError> {
    let start_time = Instant::now();
    let display = template.display().to_string();

    logging::with_file_context(template.to_path_buf(), 0, || {
        log_info!("Starting template pipeline", "file" => display.as_str());

        let file_result =
            FileProcessor::from_preferences(&config.file_processor).process_file(template)?;

        let mut result = run_stages(&file_result.source, data, fetcher, config);
        result.stats.read_duration = file_result.processing_duration;
        result.file_metadata = Some(file_result.metadata);
        result.elapsed = start_time.elapsed();

        result.log_success(&display);
        Ok(result)
    })
}

/// Write rendered text to `path`
pub fn write_output(path: &Path, text: &str) -> Result<(), PipelineError> {
    fs::write(path, text).map_err(|source| {
        let error = PipelineError::Output {
            path: path.to_path_buf(),
            source,
        };
        log_error!(error.error_code(), "Failed to write rendered output",
            "path" => path.display(),
            "reason" => &error
        );
        error
    })?;

    log_success!(codes::success::OUTPUT_WRITTEN,
        "Rendered output written",
        "path" => path.display(),
        "bytes" => text.len()
    );
    Ok(())
}

fn run_stages(
    source: &str,
    data: &SubstitutionData,
    fetcher: &dyn Fetcher,
    config: &RuntimeConfig,
) -> PipelineResult {
    let mut stats = PipelineStats::default();

    let parse_start = Instant::now();
    let analyzer = LexicalAnalyzer::with_preferences(config.lexical.clone());
    let mut parser = TemplateParser::with_analyzer(source, analyzer);
    let parsed = parser.parse();
    stats.lexical = parser.lexical_metrics().clone();
    stats.structural_tokens = parsed.tokens.len();
    stats.parse_duration = parse_start.elapsed();

    let render_start = Instant::now();
    let rendered = Renderer::new(data, fetcher)
        .with_options(RenderOptions::from(&config.render))
        .render(&parsed.tokens);
    stats.evaluation = rendered.stats;
    stats.render_duration = render_start.elapsed();

    let mut diagnostics: Vec<RenderError> =
        parsed.diagnostics.into_iter().map(RenderError::from).collect();
    diagnostics.extend(rendered.diagnostics);

    PipelineResult {
        output: rendered.text,
        diagnostics,
        stats,
        file_metadata: None,
        elapsed: Duration::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directives::StaticFetcher;
    use assert_matches::assert_matches;
    use serde_json::json;
    use tempfile::tempdir;

    fn data() -> SubstitutionData {
        SubstitutionData::new(
            json!({"name": "Ada", "id": 7}),
            json!({"company": "Acme", "name": "Everyone"}),
        )
    }

    #[test]
    fn test_render_source_collects_stats() {
        let fetcher = StaticFetcher::new().with_response("https://api.test/7", 200, "seven");
        let result = render_source(
            "Hi {{name}} of {{{company}}}: {{x-url get https://api.test/{{id}} }}",
            &data(),
            &fetcher,
            &RuntimeConfig::default(),
        );

        assert_eq!(result.output, "Hi Ada of Acme: seven");
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.stats.directives(), 1);
        assert_eq!(result.stats.fetches(), 1);
        assert_eq!(result.stats.references(), 3);
        assert!(result.stats.raw_tokens() > result.stats.structural_tokens);
        assert!(result.file_metadata.is_none());
    }

    #[test]
    fn test_parse_and_render_diagnostics_are_merged() {
        let fetcher = StaticFetcher::new();
        let result = render_source(
            "}} {{missing}} {{x-url put https://api.test/}}",
            &data(),
            &fetcher,
            &RuntimeConfig::default(),
        );

        assert_eq!(result.output, "}}  ");
        assert_eq!(result.diagnostics.len(), 3);
        assert_eq!(result.warning_count(), 2);
        assert!(result.has_errors());
        assert_matches!(result.diagnostics[0], RenderError::Syntax(_));
    }

    #[test]
    fn test_lexical_preferences_reach_the_lexer() {
        let mut config = RuntimeConfig::default();
        config.lexical.collect_detailed_metrics = false;
        config.lexical.log_token_statistics = true;

        let result = render_source("{{name}} and {{id}}", &data(), &StaticFetcher::new(), &config);
        assert_eq!(result.output, "Ada and 7");
        assert!(result.stats.raw_tokens() > 0);
        assert_eq!(result.stats.lexical.open_delimiters, 0);
    }

    #[test]
    fn test_token_budget_exhaustion_keeps_document_text() {
        let source = "x{{y}}".repeat(20);
        let parsed = TemplateParser::with_analyzer(
            &source,
            LexicalAnalyzer::new().with_token_budget(10),
        )
        .parse();
        let rendered = Renderer::new(&SubstitutionData::default(), &StaticFetcher::new())
            .with_options(RenderOptions::from(&RuntimeConfig::default().render))
            .render(&parsed.tokens);

        assert!(rendered.text.starts_with("xxx{{y}}x"));
        assert!(rendered.text.ends_with("x{{y}}x{{y}}"));
        assert_eq!(rendered.text.len(), source.len() - 2 * "{{y}}".len());
    }

    #[test]
    fn test_render_file_and_write_output() {
        let dir = tempdir().unwrap();
        let template = dir.path().join("letter.txt");
        let output = dir.path().join("letter.out");
        fs::write(&template, "Dear {{name}},\n").unwrap();

        let result =
            render_file(&template, &data(), &StaticFetcher::new(), &RuntimeConfig::default())
                .unwrap();
        assert_eq!(result.output, "Dear Ada,\n");
        assert_eq!(result.file_metadata.as_ref().map(|m| m.line_count), Some(1));

        write_output(&output, &result.output).unwrap();
        assert_eq!(fs::read_to_string(&output).unwrap(), "Dear Ada,\n");
    }

    #[test]
    fn test_missing_template_is_fatal() {
        let dir = tempdir().unwrap();
        let result = render_file(
            &dir.path().join("absent.txt"),
            &data(),
            &StaticFetcher::new(),
            &RuntimeConfig::default(),
        );
        assert_matches!(result, Err(PipelineError::FileProcessing(_)));
    }

    #[test]
    fn test_unwritable_output() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("no_such_dir").join("out.txt");
        assert_matches!(
            write_output(&target, "x"),
            Err(PipelineError::Output { .. })
        );
    }
}
