//! Error types for the doc2quiz library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`SummarizeError`] — **Fatal**: the operation cannot proceed at all
//!   (unsupported file type, unreadable input, provider not configured,
//!   malformed quiz JSON). Returned as `Err(SummarizeError)` from the
//!   top-level entry points.
//!
//! * [`UnitError`] — **Non-fatal**: a single page or slide failed
//!   (extraction glitch, transient API error) but all other units are
//!   fine. Stored inside [`crate::output::UnitResult`] so callers can
//!   inspect degraded output instead of silently losing content.
//!
//! The separation lets callers decide their own tolerance: abort on the
//! first skipped unit, log and continue, or collect all errors for a
//! post-run report.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the doc2quiz library.
///
/// Unit-level failures use [`UnitError`] and are stored in
/// [`crate::output::UnitResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum SummarizeError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The file suffix is not one of the supported document types.
    #[error("Unsupported file type '{suffix}' for '{path}'\nSupported: .pdf, .pptx")]
    UnsupportedFileType { path: PathBuf, suffix: String },

    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but its content does not match its suffix.
    #[error("File is not a valid {expected} document: '{path}': {detail}")]
    CorruptDocument {
        path: PathBuf,
        expected: &'static str,
        detail: String,
    },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API returned a non-retryable error.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// Every unit failed after all retries; the summary would be empty.
    #[error("All {total} units failed after {retries} retries each.\nFirst error: {first_error}")]
    AllUnitsFailed {
        total: usize,
        retries: u32,
        first_error: String,
    },

    /// Some units were summarized but at least one was skipped.
    ///
    /// Returned by [`crate::output::DocumentSummary::into_result`] when
    /// the caller wants to treat any skipped unit as an error.
    #[error("{skipped}/{total} units were skipped during summarization")]
    PartialFailure {
        summarized: usize,
        skipped: usize,
        total: usize,
    },

    // ── Quiz / transcript errors ──────────────────────────────────────────
    /// The transcript is too short to generate questions from.
    #[error("Transcript is too short to generate questions ({len} chars, minimum {min})")]
    TranscriptTooShort { len: usize, min: usize },

    /// The model returned something that is not the expected quiz JSON.
    #[error("Quiz response is not valid JSON: {detail}")]
    QuizParseFailed { detail: String },

    /// The caption track for a video could not be fetched or parsed.
    #[error("Transcript unavailable for video '{video_id}': {reason}")]
    TranscriptUnavailable { video_id: String, reason: String },

    /// The input string does not contain a recognisable video id.
    #[error("Not a valid YouTube URL or video id: '{input}'")]
    InvalidVideoUrl { input: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page or slide.
///
/// Stored inside [`crate::output::UnitResult`] when a unit is skipped.
/// The overall summarization continues unless ALL units fail or
/// `halt_on_unit_failure` is set.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum UnitError {
    /// Text or image extraction failed for this unit.
    #[error("Unit {unit}: extraction failed: {detail}")]
    ExtractFailed { unit: usize, detail: String },

    /// The summarization call failed after all retries.
    #[error("Unit {unit}: LLM call failed after {retries} retries: {detail}")]
    LlmFailed {
        unit: usize,
        retries: u8,
        detail: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_type_display() {
        let e = SummarizeError::UnsupportedFileType {
            path: PathBuf::from("notes.docx"),
            suffix: ".docx".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains(".docx"), "got: {msg}");
        assert!(msg.contains(".pptx"));
    }

    #[test]
    fn partial_failure_display() {
        let e = SummarizeError::PartialFailure {
            summarized: 9,
            skipped: 1,
            total: 10,
        };
        assert!(e.to_string().contains("1/10"));
    }

    #[test]
    fn transcript_too_short_display() {
        let e = SummarizeError::TranscriptTooShort { len: 40, min: 50 };
        let msg = e.to_string();
        assert!(msg.contains("40"));
        assert!(msg.contains("50"));
    }

    #[test]
    fn unit_error_display() {
        let e = UnitError::LlmFailed {
            unit: 3,
            retries: 3,
            detail: "HTTP 429".into(),
        };
        assert!(e.to_string().contains("Unit 3"));
        assert!(e.to_string().contains("429"));
    }
}
