//! # doc2quiz
//!
//! Summarize lecture material (PDF and PPTX) with vision-language models
//! and generate German study quizzes from the result.
//!
//! ## Why this crate?
//!
//! Lecture slides carry much of their content in figures: architecture
//! diagrams, annotated screenshots, plotted data. Text-only extraction
//! loses all of it. This crate extracts both the text and the images of
//! each page or slide, has a VLM describe every image, folds the
//! descriptions back into the unit text, and summarizes the combined
//! content unit by unit. The per-unit summaries feed a quiz generator
//! that produces question/answer pairs sized to the material.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF / PPTX
//!  │
//!  ├─ 1. Dispatch   suffix check (.pdf / .pptx), fail fast otherwise
//!  ├─ 2. Extract    pages via pdfium / slides via zip + quick-xml
//!  ├─ 3. Describe   each image → base64 PNG → VLM description
//!  ├─ 4. Summarize  text + descriptions per unit, retries + backoff
//!  ├─ 5. Condense   re-summarize in chunks when over the length budget
//!  └─ 6. Quiz       N questions (words/100, clamped 3..=10) as JSON
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use doc2quiz::{describe_file, quiz_for_transcript, SummaryConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     let config = SummaryConfig::default();
//!     let output = describe_file("vorlesung_03.pdf", &config).await?;
//!     println!("{}", output.summary);
//!
//!     let quiz = quiz_for_transcript(&output.summary, &config).await?;
//!     for item in &quiz.questions {
//!         println!("F: {}\nA: {}\n", item.question, item.answer);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doc2quiz` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! doc2quiz = { version = "0.3", default-features = false }
//! ```
//!
//! ## Failure Model
//!
//! A failed image description degrades its unit; a failed unit is
//! recorded as skipped in [`UnitResult::error`] and the run continues.
//! Only an unusable input, a missing provider, or a run where every
//! unit failed returns `Err`. Callers that want strict behaviour set
//! `halt_on_unit_failure` or call [`DocumentSummary::into_result`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod describe;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod quiz;
pub mod transcript;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PdfImageMode, SummaryConfig, SummaryConfigBuilder};
pub use describe::{describe_bytes, describe_file, DocumentKind};
pub use error::{SummarizeError, UnitError};
pub use output::{DocumentSummary, SummaryStats, UnitResult};
pub use quiz::{
    format_markdown, generate_quiz, quiz_for_transcript, Quiz, QuizItem, MIN_TRANSCRIPT_CHARS,
};
pub use transcript::{extract_video_id, fetch_transcript};
