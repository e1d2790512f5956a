//! Aggregate condensation: bound the length of an overlong summary.
//!
//! The concatenation of per-unit summaries grows linearly with document
//! size, but downstream consumers (quiz prompts, UI panes) have a fixed
//! budget. When the aggregate exceeds `max_summary_chars` and the
//! `condense` flag is set, it is split into fixed-size character chunks
//! and each chunk is re-summarized independently with the same
//! instruction.
//!
//! Chunking is deliberately dumb: splits land mid-sentence. The
//! invariant that matters is structural — every chunk is at most
//! `chunk_chars` characters and concatenating the chunks in order
//! reconstructs the input exactly. Already-short input is returned
//! unchanged without any model call.

use crate::config::SummaryConfig;
use crate::pipeline::llm;
use crate::prompts::DEFAULT_SUMMARY_PROMPT;
use edgequake_llm::{ChatMessage, LLMProvider};
use std::sync::Arc;
use tokio::time::{timeout, Duration};
use tracing::{info, warn};

/// True when the aggregate exceeds the configured budget and the caller
/// asked for condensation.
pub fn needs_condensing(aggregate: &str, config: &SummaryConfig) -> bool {
    config.condense && aggregate.chars().count() > config.max_summary_chars
}

/// Split a string into chunks of at most `chunk_chars` characters.
///
/// Splits at character boundaries (never inside a UTF-8 sequence);
/// concatenating the returned slices in order yields the input exactly.
pub fn split_chunks(s: &str, chunk_chars: usize) -> Vec<&str> {
    assert!(chunk_chars > 0, "chunk size must be positive");

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in s.char_indices() {
        if count == chunk_chars {
            chunks.push(&s[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < s.len() {
        chunks.push(&s[start..]);
    }

    chunks
}

/// Condense an overlong aggregate summary to fit the length budget.
///
/// Returns the (possibly rewritten) summary and whether condensation
/// ran. Each chunk is re-summarized sequentially; a failed chunk falls
/// back to its raw text so no content is lost, only left uncompressed.
pub async fn condense(
    provider: &Arc<dyn LLMProvider>,
    aggregate: String,
    config: &SummaryConfig,
) -> (String, bool) {
    if !needs_condensing(&aggregate, config) {
        return (aggregate, false);
    }

    warn!(
        "Aggregate summary is {} chars (budget {}); re-summarizing in chunks",
        aggregate.chars().count(),
        config.max_summary_chars
    );

    let instruction = config
        .summary_prompt
        .as_deref()
        .unwrap_or(DEFAULT_SUMMARY_PROMPT);
    let options = llm::build_options(config, config.temperature);

    let chunks = split_chunks(&aggregate, config.chunk_chars);
    let mut parts: Vec<(String, bool)> = Vec::with_capacity(chunks.len());

    for (i, chunk) in chunks.iter().enumerate() {
        let messages = vec![ChatMessage::system(instruction), ChatMessage::user(*chunk)];
        let call = provider.chat(&messages, Some(&options));
        match timeout(Duration::from_secs(config.api_timeout_secs), call).await {
            Ok(Ok(response)) => parts.push((response.content, true)),
            Ok(Err(e)) => {
                warn!("Condense chunk {}/{} failed ({}); keeping raw text", i + 1, chunks.len(), e);
                parts.push((chunk.to_string(), false));
            }
            Err(_) => {
                warn!(
                    "Condense chunk {}/{} timed out after {}s; keeping raw text",
                    i + 1,
                    chunks.len(),
                    config.api_timeout_secs
                );
                parts.push((chunk.to_string(), false));
            }
        }
    }

    let (condensed, rewrote_any) = join_condensed(parts);

    if rewrote_any {
        info!(
            "Condensed summary: {} → {} chars",
            aggregate.chars().count(),
            condensed.chars().count()
        );
    } else {
        warn!("No chunk was rewritten; returning the aggregate unchanged");
    }

    (condensed, rewrote_any)
}

/// Join per-chunk outputs, separating rewritten chunks with newlines.
///
/// Raw-fallback chunks are appended exactly as they came out of
/// [`split_chunks`], so a run where every chunk call failed returns the
/// input byte-identical — and is reported as not condensed.
pub(crate) fn join_condensed(parts: Vec<(String, bool)>) -> (String, bool) {
    let mut out = String::new();
    let mut rewrote_any = false;

    for (text, rewritten) in parts {
        out.push_str(&text);
        if rewritten {
            rewrote_any = true;
            if !out.ends_with('\n') {
                out.push('\n');
            }
        }
    }

    (out, rewrote_any)
}
