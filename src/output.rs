//! Output types: per-unit results, the assembled summary, and run stats.
//!
//! A unit that failed summarization is not silently dropped — it stays in
//! [`DocumentSummary::units`] with `error: Some(_)` and an empty summary,
//! so callers can detect and report degraded output. The number of
//! [`UnitResult`] entries always equals the number of units extracted
//! from the document, in document order.

use crate::error::{SummarizeError, UnitError};
use serde::{Deserialize, Serialize};

/// Result of summarizing a single page or slide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitResult {
    /// 1-indexed page or slide number.
    pub unit_num: usize,
    /// The generated summary; empty when the unit was skipped.
    pub summary: String,
    /// Characters of extracted text (including inlined image descriptions).
    pub source_chars: usize,
    /// Number of images that were described for this unit.
    pub described_images: usize,
    /// Input tokens reported by the provider.
    pub input_tokens: usize,
    /// Output tokens reported by the provider.
    pub output_tokens: usize,
    /// Wall-clock duration of the summarization call in milliseconds.
    pub duration_ms: u64,
    /// Retries spent before success or giving up.
    pub retries: u8,
    /// Set when the unit was skipped instead of summarized.
    pub error: Option<UnitError>,
}

impl UnitResult {
    /// True when this unit was skipped rather than summarized.
    pub fn is_skipped(&self) -> bool {
        self.error.is_some()
    }
}

/// The complete output of summarizing one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// The aggregate summary, condensed if it exceeded the length budget.
    pub summary: String,
    /// Whether the condenser rewrote the aggregate.
    pub condensed: bool,
    /// Per-unit results in document order, one entry per extracted unit.
    pub units: Vec<UnitResult>,
    /// Run statistics.
    pub stats: SummaryStats,
}

impl DocumentSummary {
    /// Treat any skipped unit as an error.
    ///
    /// The default contract tolerates skipped units (degraded output);
    /// strict callers use this to fail instead.
    pub fn into_result(self) -> Result<DocumentSummary, SummarizeError> {
        if self.stats.skipped_units > 0 {
            return Err(SummarizeError::PartialFailure {
                summarized: self.stats.summarized_units,
                skipped: self.stats.skipped_units,
                total: self.stats.total_units,
            });
        }
        Ok(self)
    }
}

/// Statistics for a summarization run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryStats {
    /// Units extracted from the document.
    pub total_units: usize,
    /// Units that produced a summary.
    pub summarized_units: usize,
    /// Units recorded as skipped.
    pub skipped_units: usize,
    /// Images sent through the vision describe step.
    pub described_images: usize,
    /// Image descriptions that failed and were omitted.
    pub failed_images: usize,
    /// Total input tokens across all calls.
    pub total_input_tokens: u64,
    /// Total output tokens across all calls.
    pub total_output_tokens: u64,
    /// End-to-end wall-clock time in milliseconds.
    pub total_duration_ms: u64,
    /// Time spent extracting units in milliseconds.
    pub extract_duration_ms: u64,
    /// Time spent in LLM calls in milliseconds.
    pub llm_duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(num: usize, error: Option<UnitError>) -> UnitResult {
        UnitResult {
            unit_num: num,
            summary: if error.is_some() {
                String::new()
            } else {
                format!("summary {num}")
            },
            source_chars: 100,
            described_images: 0,
            input_tokens: 0,
            output_tokens: 0,
            duration_ms: 10,
            retries: 0,
            error,
        }
    }

    #[test]
    fn into_result_passes_clean_runs() {
        let doc = DocumentSummary {
            summary: "ok".into(),
            condensed: false,
            units: vec![unit(1, None), unit(2, None)],
            stats: SummaryStats {
                total_units: 2,
                summarized_units: 2,
                ..Default::default()
            },
        };
        assert!(doc.into_result().is_ok());
    }

    #[test]
    fn into_result_rejects_skipped_units() {
        let doc = DocumentSummary {
            summary: "ok".into(),
            condensed: false,
            units: vec![
                unit(1, None),
                unit(
                    2,
                    Some(UnitError::LlmFailed {
                        unit: 2,
                        retries: 3,
                        detail: "timeout".into(),
                    }),
                ),
            ],
            stats: SummaryStats {
                total_units: 2,
                summarized_units: 1,
                skipped_units: 1,
                ..Default::default()
            },
        };
        match doc.into_result() {
            Err(SummarizeError::PartialFailure {
                skipped, total, ..
            }) => {
                assert_eq!(skipped, 1);
                assert_eq!(total, 2);
            }
            other => panic!("expected PartialFailure, got {other:?}"),
        }
    }

    #[test]
    fn skipped_unit_has_empty_summary() {
        let u = unit(
            3,
            Some(UnitError::ExtractFailed {
                unit: 3,
                detail: "bad image".into(),
            }),
        );
        assert!(u.is_skipped());
        assert!(u.summary.is_empty());
    }
}
