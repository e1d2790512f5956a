//! Model interaction: image description and unit summarization.
//!
//! This module converts extracted content into chat/vision API calls.
//! It is intentionally thin — all prompt text lives in
//! [`crate::prompts`] so it can be changed without touching retry or
//! error-handling logic here.
//!
//! ## Failure policy
//!
//! The two call sites degrade differently, matching how the output is
//! consumed:
//!
//! * **Image description** is attempted once. A failed description is
//!   logged and omitted from the unit text — the unit still gets
//!   summarized from its remaining content.
//! * **Unit summarization** retries with exponential backoff
//!   (`retry_backoff_ms * 2^attempt`); once retries are exhausted the
//!   unit is recorded as explicitly skipped, never silently dropped.

use crate::config::SummaryConfig;
use crate::error::UnitError;
use crate::output::UnitResult;
use crate::prompts::{DEFAULT_IMAGE_PROMPT, DEFAULT_SUMMARY_PROMPT};
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// Describe one image via the vision model.
///
/// Single attempt; the caller treats `Err` as a degraded (missing)
/// description for this image.
pub async fn describe_image(
    provider: &Arc<dyn LLMProvider>,
    unit_num: usize,
    image: ImageData,
    config: &SummaryConfig,
) -> Result<String, String> {
    let prompt = config.image_prompt.as_deref().unwrap_or(DEFAULT_IMAGE_PROMPT);
    let messages = vec![ChatMessage::user_with_images(prompt, vec![image])];
    let options = build_options(config, config.temperature);

    let call = provider.chat(&messages, Some(&options));
    match timeout(Duration::from_secs(config.api_timeout_secs), call).await {
        Ok(Ok(response)) => {
            debug!(
                "Unit {}: image described, {} output tokens",
                unit_num, response.completion_tokens
            );
            Ok(response.content)
        }
        Ok(Err(e)) => Err(format!("{e}")),
        Err(_) => Err(format!(
            "vision call timed out after {}s",
            config.api_timeout_secs
        )),
    }
}

/// Summarize one unit's text blob (image descriptions already inlined).
///
/// ## Message Layout
///
/// 1. **System message** — the summary instruction (or caller override)
/// 2. **User message** — the unit text blob, verbatim
///
/// ## Return Value
///
/// Always returns a `UnitResult` — never propagates the error upward so
/// a single bad unit doesn't abort the document. Callers check
/// `result.error` to decide whether to include or skip the unit.
pub async fn summarize_unit(
    provider: &Arc<dyn LLMProvider>,
    unit_num: usize,
    text: &str,
    described_images: usize,
    config: &SummaryConfig,
) -> UnitResult {
    let start = Instant::now();
    let instruction = config
        .summary_prompt
        .as_deref()
        .unwrap_or(DEFAULT_SUMMARY_PROMPT);

    let messages = vec![ChatMessage::system(instruction), ChatMessage::user(text)];
    let options = build_options(config, config.temperature);

    let mut last_err: Option<String> = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = config.retry_backoff_ms * 2u64.pow(attempt - 1);
            warn!(
                "Unit {}: retry {}/{} after {}ms",
                unit_num, attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        let call = provider.chat(&messages, Some(&options));
        match timeout(Duration::from_secs(config.api_timeout_secs), call).await {
            Ok(Ok(response)) => {
                let duration = start.elapsed();
                debug!(
                    "Unit {}: {} input tokens, {} output tokens, {:?}",
                    unit_num, response.prompt_tokens, response.completion_tokens, duration
                );

                return UnitResult {
                    unit_num,
                    summary: response.content,
                    source_chars: text.chars().count(),
                    described_images,
                    input_tokens: response.prompt_tokens,
                    output_tokens: response.completion_tokens,
                    duration_ms: duration.as_millis() as u64,
                    retries: attempt as u8,
                    error: None,
                };
            }
            Ok(Err(e)) => {
                let err_msg = format!("{e}");
                warn!("Unit {}: attempt {} failed — {}", unit_num, attempt + 1, err_msg);
                last_err = Some(err_msg);
            }
            Err(_) => {
                let err_msg = format!("call timed out after {}s", config.api_timeout_secs);
                warn!("Unit {}: attempt {} failed — {}", unit_num, attempt + 1, err_msg);
                last_err = Some(err_msg);
            }
        }
    }

    // All retries exhausted — record the unit as skipped.
    let duration = start.elapsed();
    let err_msg = last_err.unwrap_or_else(|| "Unknown error".to_string());

    UnitResult {
        unit_num,
        summary: String::new(),
        source_chars: text.chars().count(),
        described_images,
        input_tokens: 0,
        output_tokens: 0,
        duration_ms: duration.as_millis() as u64,
        retries: config.max_retries as u8,
        error: Some(UnitError::LlmFailed {
            unit: unit_num,
            retries: config.max_retries as u8,
            detail: err_msg,
        }),
    }
}

/// Build `CompletionOptions` from the config with the given temperature.
pub(crate) fn build_options(config: &SummaryConfig, temperature: f32) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}
