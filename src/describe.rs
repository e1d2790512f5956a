//! File dispatch and the summarization pipeline entry points.
//!
//! [`describe_file`] is the primary entry point: it inspects the file
//! suffix, hands the file to the matching extractor, drives the per-unit
//! summarization, and condenses the aggregate when it exceeds the
//! configured budget. Unsupported suffixes fail before any content I/O.
//!
//! Units are processed sequentially in document order. One
//! [`UnitResult`] is produced per extracted unit; a unit whose
//! summarization failed is recorded as explicitly skipped rather than
//! silently dropped, and the run only aborts if every unit failed (or
//! the caller set `halt_on_unit_failure`).

use crate::config::SummaryConfig;
use crate::error::SummarizeError;
use crate::output::{DocumentSummary, SummaryStats, UnitResult};
use crate::pipeline::{condense, encode, llm, pdf, pptx, Unit};
use edgequake_llm::{LLMProvider, ProviderFactory};
use futures::future::join_all;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Supported document types, keyed by file suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// `.pdf` — units are pages.
    Pdf,
    /// `.pptx` — units are slides.
    Pptx,
}

impl DocumentKind {
    /// Map a file path to a document kind by its suffix (case-insensitive).
    ///
    /// This is the fail-fast gate: it looks only at the name, never at
    /// the content, so unsupported types are rejected before any
    /// extraction work starts.
    pub fn from_path(path: &Path) -> Result<DocumentKind, SummarizeError> {
        let suffix = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match suffix.as_str() {
            "pdf" => Ok(DocumentKind::Pdf),
            "pptx" => Ok(DocumentKind::Pptx),
            _ => Err(SummarizeError::UnsupportedFileType {
                path: path.to_path_buf(),
                suffix: if suffix.is_empty() {
                    "(none)".to_string()
                } else {
                    format!(".{suffix}")
                },
            }),
        }
    }
}

/// Summarize a PDF or PPTX document.
///
/// # Arguments
/// * `path`   — Local file with a `.pdf` or `.pptx` suffix
/// * `config` — Summarization configuration
///
/// # Returns
/// `Ok(DocumentSummary)` on success, even if some units were skipped
/// (check `output.stats.skipped_units`, or call
/// [`DocumentSummary::into_result`] for strict handling).
///
/// # Errors
/// Returns `Err(SummarizeError)` only for fatal errors:
/// - Unsupported file suffix (checked first, before any file I/O)
/// - File not found / permission denied / not the claimed format
/// - Provider not configured
/// - All units failed and no summary was produced
pub async fn describe_file(
    path: impl AsRef<Path>,
    config: &SummaryConfig,
) -> Result<DocumentSummary, SummarizeError> {
    let path = path.as_ref();
    let kind = DocumentKind::from_path(path)?;
    validate_file(path, kind)?;
    describe_inner(path, kind, config).await
}

/// Summarize in-memory document bytes.
///
/// `file_name` carries the suffix for dispatch; the bytes are written to
/// a managed [`tempfile`] that is cleaned up automatically on return or
/// panic. This is the right API for uploads that never touch disk under
/// a caller-controlled name — each call gets its own scoped temp path,
/// so concurrent executions cannot clobber each other's intermediates.
pub async fn describe_bytes(
    bytes: &[u8],
    file_name: &str,
    config: &SummaryConfig,
) -> Result<DocumentSummary, SummarizeError> {
    let name_path = PathBuf::from(file_name);
    let kind = DocumentKind::from_path(&name_path)?;

    let suffix = match kind {
        DocumentKind::Pdf => ".pdf",
        DocumentKind::Pptx => ".pptx",
    };
    let mut tmp = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .map_err(|e| SummarizeError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| SummarizeError::Internal(format!("tempfile write: {e}")))?;

    validate_file(tmp.path(), kind)?;
    // `tmp` is dropped (and the file deleted) when describe_inner returns
    describe_inner(tmp.path(), kind, config).await
}

async fn describe_inner(
    path: &Path,
    kind: DocumentKind,
    config: &SummaryConfig,
) -> Result<DocumentSummary, SummarizeError> {
    let total_start = Instant::now();
    info!("Summarizing {:?} document: {}", kind, path.display());

    let provider = resolve_provider(config)?;

    // ── Extract units ────────────────────────────────────────────────────
    let extract_start = Instant::now();
    let units = match kind {
        DocumentKind::Pdf => pdf::extract_units(path, config).await?,
        DocumentKind::Pptx => pptx::extract_units(path).await?,
    };
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;
    info!("Extracted {} units in {}ms", units.len(), extract_duration_ms);

    // ── Summarize each unit in document order ────────────────────────────
    let llm_start = Instant::now();
    let mut results: Vec<UnitResult> = Vec::with_capacity(units.len());
    let mut failed_images = 0usize;

    for unit in &units {
        let result = if unit.error.is_some() {
            // Extraction already failed; no point spending an LLM call
            // on an empty blob.
            extract_failed_result(unit)
        } else {
            if let Some(ref dir) = config.content_dump_dir {
                dump_unit_text(dir, path, &unit.text).await?;
            }

            let (blob, described) =
                build_unit_blob(&provider, unit, config, &mut failed_images).await;
            llm::summarize_unit(&provider, unit.unit_num, &blob, described, config).await
        };

        if result.is_skipped() && config.halt_on_unit_failure {
            let summarized = results.iter().filter(|r| !r.is_skipped()).count();
            warn!("Unit {} failed and halt_on_unit_failure is set", unit.unit_num);
            return Err(SummarizeError::PartialFailure {
                summarized,
                skipped: 1,
                total: units.len(),
            });
        }

        results.push(result);
    }
    let llm_duration_ms = llm_start.elapsed().as_millis() as u64;

    // ── Aggregate ────────────────────────────────────────────────────────
    let summarized = results.iter().filter(|r| !r.is_skipped()).count();
    let skipped = results.len() - summarized;

    if summarized == 0 && !results.is_empty() {
        let first_error = results
            .iter()
            .find_map(|r| r.error.as_ref())
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(SummarizeError::AllUnitsFailed {
            total: results.len(),
            retries: config.max_retries,
            first_error,
        });
    }
    if skipped > 0 {
        warn!("{} of {} units were skipped", skipped, results.len());
    }

    let aggregate = results
        .iter()
        .filter(|r| !r.is_skipped())
        .map(|r| r.summary.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    // ── Condense when over budget ────────────────────────────────────────
    let (summary, condensed) = condense::condense(&provider, aggregate, config).await;

    let described_images: usize = results.iter().map(|r| r.described_images).sum();
    let stats = SummaryStats {
        total_units: results.len(),
        summarized_units: summarized,
        skipped_units: skipped,
        described_images,
        failed_images,
        total_input_tokens: results.iter().map(|r| r.input_tokens as u64).sum(),
        total_output_tokens: results.iter().map(|r| r.output_tokens as u64).sum(),
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        extract_duration_ms,
        llm_duration_ms,
    };

    info!(
        "Summarization complete: {}/{} units, {}ms total",
        summarized, stats.total_units, stats.total_duration_ms
    );

    Ok(DocumentSummary {
        summary,
        condensed,
        units: results,
        stats,
    })
}

/// Turn a unit whose extraction failed into a skipped result.
///
/// No tokens were spent and no summary exists; the extractor's error
/// marker is carried through so the caller sees why the unit is empty.
fn extract_failed_result(unit: &Unit) -> UnitResult {
    UnitResult {
        unit_num: unit.unit_num,
        summary: String::new(),
        source_chars: 0,
        described_images: 0,
        input_tokens: 0,
        output_tokens: 0,
        duration_ms: 0,
        retries: 0,
        error: unit.error.clone(),
    }
}

/// Build the text blob for one unit: raw text plus inlined image
/// descriptions, in image order.
///
/// Descriptions run concurrently (a slide with four figures takes one
/// round trip, not four) but are appended in image order. A failed
/// description is counted and omitted; the unit continues with degraded
/// content.
async fn build_unit_blob(
    provider: &Arc<dyn LLMProvider>,
    unit: &Unit,
    config: &SummaryConfig,
    failed_images: &mut usize,
) -> (String, usize) {
    let mut blob = unit.text.clone();
    let mut described = 0usize;

    let calls = unit.images.iter().enumerate().map(|(i, img)| async move {
        match encode::encode_image(img) {
            Ok(encoded) => llm::describe_image(provider, unit.unit_num, encoded, config).await,
            Err(e) => Err(format!("image unencodable: {e}")),
        }
        .map_err(|e| (i, e))
    });

    for result in join_all(calls).await {
        match result {
            Ok(description) => {
                if !blob.is_empty() && !blob.ends_with('\n') {
                    blob.push('\n');
                }
                blob.push_str(&description);
                described += 1;
            }
            Err((i, e)) => {
                warn!(
                    "Unit {}: image {} description failed ({}); continuing without it",
                    unit.unit_num,
                    i + 1,
                    e
                );
                *failed_images += 1;
            }
        }
    }

    (blob, described)
}

/// Append one unit's raw text to `<dump_dir>/<input stem>.txt`.
async fn dump_unit_text(
    dump_dir: &Path,
    input: &Path,
    text: &str,
) -> Result<(), SummarizeError> {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string());
    let out_path = dump_dir.join(format!("{stem}.txt"));

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&out_path)
        .await
        .map_err(|e| SummarizeError::OutputWriteFailed {
            path: out_path.clone(),
            source: e,
        })?;
    tokio::io::AsyncWriteExt::write_all(&mut file, text.as_bytes())
        .await
        .map_err(|e| SummarizeError::OutputWriteFailed {
            path: out_path.clone(),
            source: e,
        })?;
    tokio::io::AsyncWriteExt::write_all(&mut file, b"\n")
        .await
        .map_err(|e| SummarizeError::OutputWriteFailed {
            path: out_path,
            source: e,
        })?;
    Ok(())
}

/// Check existence, readability, and the leading magic bytes.
fn validate_file(path: &Path, kind: DocumentKind) -> Result<(), SummarizeError> {
    if !path.exists() {
        return Err(SummarizeError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(mut f) => {
            use std::io::Read;
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() {
                let (expected, label): (&[u8], &'static str) = match kind {
                    DocumentKind::Pdf => (b"%PDF", "PDF"),
                    // PPTX is an OOXML ZIP container
                    DocumentKind::Pptx => (b"PK", "PPTX"),
                };
                if !magic.starts_with(expected) {
                    return Err(SummarizeError::CorruptDocument {
                        path: path.to_path_buf(),
                        expected: label,
                        detail: format!("unexpected leading bytes {magic:?}"),
                    });
                }
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(SummarizeError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(SummarizeError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    }

    debug!("Validated {:?} input: {}", kind, path.display());
    Ok(())
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// The four-level fallback chain lets library users and CLI users each
/// set exactly as much or as little as they need:
///
/// 1. **Pre-built provider** (`config.provider`) — the caller
///    constructed and configured the provider entirely; we use it
///    as-is. Useful in tests or for custom middleware.
///
/// 2. **Named provider + model** (`config.provider_name`) — reads the
///    corresponding API key (`OPENAI_API_KEY`, etc.) from the
///    environment via [`ProviderFactory::create_llm_provider`].
///
/// 3. **Environment pair** (`DOC2QUIZ_LLM_PROVIDER` + `DOC2QUIZ_MODEL`)
///    — both set means the execution environment chose; checked before
///    auto-detection so the model choice is honoured even when multiple
///    API keys are present.
///
/// 4. **Full auto-detection** (`ProviderFactory::from_env`) — scans all
///    known API key variables and picks the first available provider.
pub(crate) fn resolve_provider(
    config: &SummaryConfig,
) -> Result<Arc<dyn LLMProvider>, SummarizeError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or("gpt-4.1-nano");
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("DOC2QUIZ_LLM_PROVIDER"),
        std::env::var("DOC2QUIZ_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    // Prefer OpenAI explicitly when an OpenAI API key is present, so
    // users with multiple provider keys get a deterministic default.
    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or("gpt-4.1-nano");
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| SummarizeError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {e}"
            ),
        })?;

    Ok(llm_provider)
}

/// Instantiate a named provider with the given model.
fn create_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, SummarizeError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        SummarizeError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_selects_by_suffix() {
        assert_eq!(
            DocumentKind::from_path(Path::new("deck.pptx")).unwrap(),
            DocumentKind::Pptx
        );
        assert_eq!(
            DocumentKind::from_path(Path::new("script.PDF")).unwrap(),
            DocumentKind::Pdf
        );
    }

    #[test]
    fn dispatch_rejects_unsupported_suffix() {
        for name in ["notes.docx", "audio.wav", "archive.tar.gz", "README"] {
            match DocumentKind::from_path(Path::new(name)) {
                Err(SummarizeError::UnsupportedFileType { .. }) => {}
                other => panic!("{name}: expected UnsupportedFileType, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn unsupported_suffix_fails_before_file_io() {
        // The file does not exist; the suffix gate must fire first.
        let config = SummaryConfig::default();
        match describe_file("/no/such/file.docx", &config).await {
            Err(SummarizeError::UnsupportedFileType { suffix, .. }) => {
                assert_eq!(suffix, ".docx");
            }
            other => panic!("expected UnsupportedFileType, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_supported_file_reports_not_found() {
        let config = SummaryConfig::default();
        match describe_file("/no/such/file.pdf", &config).await {
            Err(SummarizeError::FileNotFound { .. }) => {}
            other => panic!("expected FileNotFound, got {other:?}"),
        }
    }

    #[test]
    fn extract_failed_unit_becomes_skipped_result_without_tokens() {
        let unit = Unit {
            unit_num: 4,
            text: String::new(),
            images: Vec::new(),
            error: Some(crate::error::UnitError::ExtractFailed {
                unit: 4,
                detail: "slide XML unparseable".into(),
            }),
        };

        let result = extract_failed_result(&unit);
        assert!(result.is_skipped());
        assert_eq!(result.unit_num, 4);
        assert_eq!(result.input_tokens, 0);
        assert_eq!(result.output_tokens, 0);
        assert!(result.summary.is_empty());
    }

    #[tokio::test]
    async fn wrong_magic_reports_corrupt_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::write(&path, b"this is not a pdf at all").unwrap();

        let config = SummaryConfig::default();
        match describe_file(&path, &config).await {
            Err(SummarizeError::CorruptDocument { expected, .. }) => {
                assert_eq!(expected, "PDF");
            }
            other => panic!("expected CorruptDocument, got {other:?}"),
        }
    }
}
