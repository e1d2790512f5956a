//! Pipeline stages for document summarization.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. a new document format) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! file ──▶ pdf/pptx ──▶ encode ──▶ llm ──▶ condense
//! (path)   (units)      (base64)   (VLM)   (length budget)
//! ```
//!
//! 1. [`pdf`] / [`pptx`] — extract one [`Unit`] per page or slide; runs
//!    in `spawn_blocking` because pdfium and zip decompression are
//!    CPU-bound
//! 2. [`encode`] — PNG-encode and base64-wrap each embedded image for
//!    the multimodal API request body
//! 3. [`llm`] — describe images and summarize units with retry/backoff;
//!    the only stage with network I/O
//! 4. [`condense`] — re-chunk and re-summarize an overlong aggregate to
//!    fit the configured length budget

pub mod condense;
pub mod encode;
pub mod llm;
pub mod pdf;
pub mod pptx;

use crate::error::UnitError;
use image::DynamicImage;

/// One page (PDF) or slide (PPTX) — the smallest independently
/// summarized chunk of a document.
pub struct Unit {
    /// 1-indexed page or slide number.
    pub unit_num: usize,
    /// Raw text extracted from the unit.
    pub text: String,
    /// Embedded images in document order.
    pub images: Vec<DynamicImage>,
    /// Set when extraction failed outright for this unit.
    ///
    /// A unit carrying an error is never summarized; it flows straight
    /// into a skipped result so callers can tell a broken slide apart
    /// from a genuinely blank one.
    pub error: Option<UnitError>,
}

/// Repair the broken umlaut encoding some PDF text layers produce.
///
/// LaTeX-generated slides frequently encode `ä` as the two-character
/// sequence `¨a`; the model then summarizes around garbage tokens.
pub(crate) fn repair_umlauts(text: &str) -> String {
    text.replace("¨a", "ä")
        .replace("¨o", "ö")
        .replace("¨u", "ü")
        .replace("¨A", "Ä")
        .replace("¨O", "Ö")
        .replace("¨U", "Ü")
}
