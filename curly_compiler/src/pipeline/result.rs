use crate::file_processor::FileMetadata;
use crate::logging::codes;
use crate::pipeline::stats::PipelineStats;
use crate::render::RenderError;
use std::time::Duration;

/// Rendered text plus every diagnostic and statistic of the run
#[derive(Debug)]
pub struct PipelineResult {
    pub output: String,
    /// Parser diagnostics first, then render diagnostics, each in document order
    pub diagnostics: Vec<RenderError>,
    pub stats: PipelineStats,
    pub file_metadata: Option<FileMetadata>,
    pub elapsed: Duration,
}

impl PipelineResult {
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| !d.is_warning()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_warning()).count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn log_success(&self, source_name: &str) {
        crate::log_success!(
            codes::success::OPERATION_COMPLETED_SUCCESSFULLY,
            "Template pipeline finished",
            "file" => source_name,
            "duration_ms" => format!("{:.2}", self.elapsed.as_secs_f64() * 1000.0),
            "output_bytes" => self.output.len(),
            "tokens" => self.stats.raw_tokens(),
            "tokens_per_sec" => format!("{:.0}", self.stats.parse_rate()),
            "directives" => self.stats.directives(),
            "fetches" => self.stats.fetches(),
            "errors" => self.error_count(),
            "warnings" => self.warning_count()
        );
    }
}
