//! Configuration types for document summarization.
//!
//! All summarization behaviour is controlled through [`SummaryConfig`],
//! built via its [`SummaryConfigBuilder`]. The repository this crate grew
//! out of carried several near-identical describe-PDF/describe-PPTX
//! routines that differed only in prompt text and length handling; one
//! config struct replaces all of those variants with a single surface.
//!
//! # Design choice: explicit config over ambient state
//! The provider (and hence the API key) is part of the config, passed
//! into each entry point at call time. There is no module-level client or
//! environment lookup hidden inside the pipeline stages.

use crate::error::SummarizeError;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for summarizing a document and generating quizzes.
///
/// Built via [`SummaryConfig::builder()`] or using
/// [`SummaryConfig::default()`].
///
/// # Example
/// ```rust
/// use doc2quiz::SummaryConfig;
///
/// let config = SummaryConfig::builder()
///     .condense(true)
///     .max_summary_chars(2000)
///     .model("gpt-4.1-nano")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct SummaryConfig {
    /// Maximum length of the aggregate summary in characters. Default: 3000.
    ///
    /// When the concatenation of all unit summaries exceeds this and
    /// [`condense`](Self::condense) is set, the aggregate is re-chunked
    /// and re-summarized to bound output size.
    pub max_summary_chars: usize,

    /// Enable re-summarization of an overlong aggregate. Default: false.
    ///
    /// Off by default because condensation costs one extra model call per
    /// chunk and loses detail; callers that feed the summary into a
    /// context-limited downstream prompt (quiz generation) switch it on.
    pub condense: bool,

    /// Chunk size in characters used when condensing. Default: 3000.
    ///
    /// Chunks are split at character boundaries with no sentence
    /// awareness; concatenating the chunks in order reconstructs the
    /// input exactly.
    pub chunk_chars: usize,

    /// How to obtain images from PDF pages. Default: [`PdfImageMode::Embedded`].
    pub pdf_images: PdfImageMode,

    /// Maximum rendered page dimension in pixels (page-render mode only). Default: 2000.
    ///
    /// A safety cap independent of DPI: an A0 poster rendered at 300 DPI
    /// would otherwise exhaust memory before the vision call ever sees it.
    pub max_rendered_pixels: u32,

    /// LLM model identifier, e.g. "gpt-4.1-nano", "claude-sonnet-4-20250514".
    /// If None, uses provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, uses `ProviderFactory::from_env()`.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for summarization calls. Default: 0.3.
    ///
    /// Low enough to stay faithful to the source material; the quiz path
    /// uses [`quiz_temperature`](Self::quiz_temperature) instead.
    pub temperature: f32,

    /// Sampling temperature for quiz generation. Default: 0.6.
    pub quiz_temperature: f32,

    /// Maximum tokens the model may generate per call. Default: 1024.
    pub max_tokens: usize,

    /// Maximum retry attempts on a transient API failure. Default: 3.
    ///
    /// Replaces the unbounded sleep-and-retry loop the original quiz path
    /// used. Permanent errors (bad API key, malformed request) still
    /// surface after the final attempt.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff). Default: 500.
    ///
    /// Doubles after each attempt: 500 ms → 1 s → 2 s.
    pub retry_backoff_ms: u64,

    /// Abort the whole document when a unit fails. Default: false.
    ///
    /// The default records the failed unit as explicitly skipped and
    /// continues with degraded output; setting this makes the first
    /// skipped unit fatal.
    pub halt_on_unit_failure: bool,

    /// Write the raw extracted text of each unit into this directory. Default: None.
    ///
    /// One file per document, named after the input file with a `.txt`
    /// suffix. The directory must already exist; files are appended to in
    /// unit order.
    pub content_dump_dir: Option<PathBuf>,

    /// Custom image-description prompt. If None, uses the built-in default.
    pub image_prompt: Option<String>,

    /// Custom unit-summary instruction. If None, uses the built-in default.
    pub summary_prompt: Option<String>,

    /// Per-LLM-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// HTTP timeout for caption downloads in seconds. Default: 30.
    pub download_timeout_secs: u64,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            max_summary_chars: 3000,
            condense: false,
            chunk_chars: 3000,
            pdf_images: PdfImageMode::default(),
            max_rendered_pixels: 2000,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.3,
            quiz_temperature: 0.6,
            max_tokens: 1024,
            max_retries: 3,
            retry_backoff_ms: 500,
            halt_on_unit_failure: false,
            content_dump_dir: None,
            image_prompt: None,
            summary_prompt: None,
            api_timeout_secs: 60,
            download_timeout_secs: 30,
        }
    }
}

impl fmt::Debug for SummaryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummaryConfig")
            .field("max_summary_chars", &self.max_summary_chars)
            .field("condense", &self.condense)
            .field("chunk_chars", &self.chunk_chars)
            .field("pdf_images", &self.pdf_images)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_retries", &self.max_retries)
            .field("halt_on_unit_failure", &self.halt_on_unit_failure)
            .field("content_dump_dir", &self.content_dump_dir)
            .finish()
    }
}

impl SummaryConfig {
    /// Create a new builder for `SummaryConfig`.
    pub fn builder() -> SummaryConfigBuilder {
        SummaryConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`SummaryConfig`].
#[derive(Debug)]
pub struct SummaryConfigBuilder {
    config: SummaryConfig,
}

impl SummaryConfigBuilder {
    pub fn max_summary_chars(mut self, n: usize) -> Self {
        self.config.max_summary_chars = n;
        self
    }

    pub fn condense(mut self, v: bool) -> Self {
        self.config.condense = v;
        self
    }

    pub fn chunk_chars(mut self, n: usize) -> Self {
        self.config.chunk_chars = n.max(1);
        self
    }

    pub fn pdf_images(mut self, mode: PdfImageMode) -> Self {
        self.config.pdf_images = mode;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn quiz_temperature(mut self, t: f32) -> Self {
        self.config.quiz_temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn halt_on_unit_failure(mut self, v: bool) -> Self {
        self.config.halt_on_unit_failure = v;
        self
    }

    pub fn content_dump_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.content_dump_dir = Some(dir.into());
        self
    }

    pub fn image_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.image_prompt = Some(prompt.into());
        self
    }

    pub fn summary_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.summary_prompt = Some(prompt.into());
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SummaryConfig, SummarizeError> {
        let c = &self.config;
        if c.chunk_chars == 0 {
            return Err(SummarizeError::InvalidConfig(
                "Chunk size must be ≥ 1".into(),
            ));
        }
        if c.max_summary_chars == 0 {
            return Err(SummarizeError::InvalidConfig(
                "Maximum summary length must be ≥ 1".into(),
            ));
        }
        if let PdfImageMode::PageRender { dpi } = c.pdf_images {
            if !(72..=400).contains(&dpi) {
                return Err(SummarizeError::InvalidConfig(format!(
                    "Render DPI must be 72–400, got {dpi}"
                )));
            }
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How images are obtained from a PDF page before being described.
///
/// Two modes exist because the source material varies: slide-deck PDFs
/// carry their figures as embedded raster objects that can be pulled out
/// losslessly, while scanned or vector-heavy documents only give up their
/// content when the whole page is rasterised and shown to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PdfImageMode {
    /// Extract embedded raster images from each page (default).
    ///
    /// Page text is read separately via the PDF text layer.
    #[default]
    Embedded,
    /// Rasterise the full page at the given DPI and describe the render.
    ///
    /// Page text is still read from the text layer; the render carries
    /// layout, figures, and anything the text layer misses.
    PageRender { dpi: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_documented_values() {
        let c = SummaryConfig::default();
        assert_eq!(c.max_summary_chars, 3000);
        assert!(!c.condense);
        assert_eq!(c.max_retries, 3);
        assert_eq!(c.pdf_images, PdfImageMode::Embedded);
    }

    #[test]
    fn builder_rejects_zero_chunk() {
        // chunk_chars setter clamps, but a hand-built config is caught at build
        let r = SummaryConfig::builder().chunk_chars(0).build();
        assert!(r.is_ok(), "setter clamps to 1");

        let r = SummaryConfig::builder().max_summary_chars(0).build();
        assert!(r.is_err());
    }

    #[test]
    fn builder_rejects_out_of_range_dpi() {
        let r = SummaryConfig::builder()
            .pdf_images(PdfImageMode::PageRender { dpi: 30 })
            .build();
        assert!(r.is_err());

        let r = SummaryConfig::builder()
            .pdf_images(PdfImageMode::PageRender { dpi: 300 })
            .build();
        assert!(r.is_ok());
    }
}
