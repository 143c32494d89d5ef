use crate::directives::EvaluationStats;
use crate::lexical::LexicalMetrics;
use std::time::Duration;

/// Counters and timings for one pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    pub lexical: LexicalMetrics,
    /// Tokens after grouping
    pub structural_tokens: usize,
    pub evaluation: EvaluationStats,
    pub read_duration: Duration,
    pub parse_duration: Duration,
    pub render_duration: Duration,
}

impl PipelineStats {
    pub fn raw_tokens(&self) -> usize {
        self.lexical.total_tokens
    }

    pub fn directives(&self) -> usize {
        self.evaluation.directives_evaluated
    }

    pub fn fetches(&self) -> usize {
        self.evaluation.fetches_dispatched
    }

    pub fn references(&self) -> usize {
        self.evaluation.references_resolved + self.evaluation.references_missing
    }

    /// Raw tokens per second over the parse stage
    pub fn parse_rate(&self) -> f64 {
        let seconds = self.parse_duration.as_secs_f64();
        if seconds > 0.0 {
            self.raw_tokens() as f64 / seconds
        } else {
            0.0
        }
    }
}
