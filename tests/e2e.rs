//! End-to-end integration tests for doc2quiz.
//!
//! Tests that need live LLM API calls or real lecture files are gated
//! behind the `E2E_ENABLED` environment variable so they do not run in
//! CI unless explicitly requested. The ungated tests exercise the parts
//! of the public API that work without a provider: dispatch, input
//! validation, transcript parsing, and quiz response parsing.
//!
//! Run the gated tests with:
//!   E2E_ENABLED=1 OPENAI_API_KEY=sk-... cargo test --test e2e -- --nocapture

use doc2quiz::{
    describe_bytes, describe_file, fetch_transcript, quiz_for_transcript, DocumentKind,
    SummarizeError, SummaryConfig,
};
use std::io::Write;
use std::path::{Path, PathBuf};

// ── Test helpers ─────────────────────────────────────────────────────────────

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

/// Skip this test if E2E_ENABLED is not set *or* no file at `path`.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP — test file not found: {}", p.display());
            return;
        }
        p
    }};
}

/// Minimal valid ZIP archive with one slide part, built by hand so the
/// test needs no fixture file. The slide carries one text run.
fn tiny_pptx() -> Vec<u8> {
    let slide_xml = br#"<?xml version="1.0"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"
       xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
  <p:cSld><p:spTree><p:sp><p:txBody>
    <a:p><a:r><a:t>Ownership und Borrowing</a:t></a:r></a:p>
  </p:txBody></p:sp></p:spTree></p:cSld>
</p:sld>"#;

    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        let opts = zip::write::SimpleFileOptions::default();
        zip.start_file("ppt/slides/slide1.xml", opts).unwrap();
        zip.write_all(slide_xml).unwrap();
        zip.finish().unwrap();
    }
    buf
}

// ── Dispatch and validation (no LLM, no fixtures) ────────────────────────────

#[test]
fn dispatch_covers_both_supported_types() {
    assert_eq!(
        DocumentKind::from_path(Path::new("a.pdf")).unwrap(),
        DocumentKind::Pdf
    );
    assert_eq!(
        DocumentKind::from_path(Path::new("b.PPTX")).unwrap(),
        DocumentKind::Pptx
    );
}

#[tokio::test]
async fn unsupported_suffix_rejected_without_touching_disk() {
    let config = SummaryConfig::default();
    // Path intentionally does not exist; the suffix check must fire first.
    let err = describe_file("/definitely/not/here.docx", &config)
        .await
        .unwrap_err();
    assert!(matches!(err, SummarizeError::UnsupportedFileType { .. }));
}

#[tokio::test]
async fn bytes_entry_point_rejects_unsupported_name() {
    let config = SummaryConfig::default();
    let err = describe_bytes(b"irrelevant", "notes.txt", &config)
        .await
        .unwrap_err();
    assert!(matches!(err, SummarizeError::UnsupportedFileType { .. }));
}

#[tokio::test]
async fn truncated_pdf_is_reported_as_corrupt() {
    let config = SummaryConfig::default();
    let err = describe_bytes(b"not a pdf", "lecture.pdf", &config)
        .await
        .unwrap_err();
    assert!(matches!(err, SummarizeError::CorruptDocument { .. }));
}

#[tokio::test]
async fn short_transcript_rejected_without_provider() {
    let config = SummaryConfig::default();
    let err = quiz_for_transcript("viel zu kurz", &config).await.unwrap_err();
    match err {
        SummarizeError::TranscriptTooShort { len, min } => {
            assert!(len < min);
            assert_eq!(min, 50);
        }
        other => panic!("expected TranscriptTooShort, got {other:?}"),
    }
}

#[tokio::test]
async fn garbage_video_url_rejected_without_network() {
    let config = SummaryConfig::default();
    let err = fetch_transcript("not a url at all", "de", &config)
        .await
        .unwrap_err();
    assert!(matches!(err, SummarizeError::InvalidVideoUrl { .. }));
}

// ── PPTX extraction via the public bytes API (no LLM needed to fail late) ───

#[tokio::test]
async fn pptx_with_valid_container_passes_magic_check() {
    // Without an API key the run must fail at provider resolution or in
    // the LLM calls — NOT at the container/magic validation stage.
    // Clear the env-derived paths so the test is deterministic.
    let provider_vars = [
        "OPENAI_API_KEY",
        "ANTHROPIC_API_KEY",
        "GEMINI_API_KEY",
        "DOC2QUIZ_LLM_PROVIDER",
    ];
    if provider_vars.iter().any(|v| std::env::var(v).is_ok()) {
        println!("SKIP — provider env present, validation-only test is ambiguous");
        return;
    }

    let config = SummaryConfig::default();
    let err = describe_bytes(&tiny_pptx(), "deck.pptx", &config)
        .await
        .unwrap_err();
    assert!(
        matches!(err, SummarizeError::ProviderNotConfigured { .. }),
        "expected ProviderNotConfigured, got {err:?}"
    );
}

// ── Gated end-to-end runs (live API, real files) ─────────────────────────────

#[tokio::test]
async fn e2e_summarize_pdf() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("vorlesung.pdf"));

    let config = SummaryConfig::builder()
        .condense(true)
        .max_summary_chars(3000)
        .build()
        .unwrap();

    let output = describe_file(&path, &config)
        .await
        .expect("summarization should succeed");

    assert!(!output.summary.trim().is_empty());
    assert_eq!(output.units.len(), output.stats.total_units);
    assert_eq!(
        output.stats.summarized_units + output.stats.skipped_units,
        output.stats.total_units
    );
    if output.condensed {
        // Post-condensation length should be near the budget; allow slack
        // for model variance.
        assert!(output.summary.chars().count() <= 2 * config.max_summary_chars);
    }

    println!(
        "✓ {} units, {} chars, {} tokens in / {} out",
        output.stats.total_units,
        output.summary.chars().count(),
        output.stats.total_input_tokens,
        output.stats.total_output_tokens,
    );
}

#[tokio::test]
async fn e2e_summarize_pptx_and_quiz() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("folien.pptx"));

    let config = SummaryConfig::default();
    let output = describe_file(&path, &config)
        .await
        .expect("summarization should succeed");
    assert!(!output.summary.trim().is_empty());

    let quiz = quiz_for_transcript(&output.summary, &config)
        .await
        .expect("quiz generation should succeed");

    assert!((3..=10).contains(&quiz.questions.len()));
    for item in &quiz.questions {
        assert!(!item.question.trim().is_empty());
        assert!(!item.answer.trim().is_empty());
    }

    println!("✓ {} questions generated", quiz.questions.len());
}

#[tokio::test]
async fn e2e_transcript_fetch() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
        return;
    }
    let video = match std::env::var("E2E_VIDEO_URL") {
        Ok(v) => v,
        Err(_) => {
            println!("SKIP — set E2E_VIDEO_URL to a captioned video");
            return;
        }
    };

    let config = SummaryConfig::default();
    let transcript = fetch_transcript(&video, "de", &config)
        .await
        .expect("transcript fetch should succeed");
    assert!(transcript.chars().count() >= 50);
    println!("✓ transcript: {} chars", transcript.chars().count());
}
