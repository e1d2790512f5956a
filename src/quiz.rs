//! Quiz generation: transcript → German question/answer pairs.
//!
//! The question count scales with transcript length (one question per
//! hundred words, clamped to 3..=10) so short clips don't get padded
//! with filler questions and long lectures don't produce an unusable
//! wall of them. The model is instructed to answer with a bare JSON
//! object; common deviations (markdown code fences around the JSON) are
//! stripped before parsing, and a response that still fails to parse is
//! a fatal [`SummarizeError::QuizParseFailed`] — it is not retried,
//! because a model that returned prose once will usually do it again
//! and the caller should see the malformed payload instead of burning
//! retries.

use crate::config::SummaryConfig;
use crate::describe::resolve_provider;
use crate::error::SummarizeError;
use crate::prompts::{
    markdown_user_prompt, quiz_user_prompt, MARKDOWN_SYSTEM_PROMPT, QUIZ_SYSTEM_PROMPT,
};
use edgequake_llm::{ChatMessage, LLMProvider};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, info, warn};

/// Transcripts shorter than this are rejected before any model call.
pub const MIN_TRANSCRIPT_CHARS: usize = 50;

/// A generated quiz. The wire format uses the German field names the
/// prompt pins (`fragen`/`frage`/`antwort`); the Rust fields are English.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Quiz {
    #[serde(rename = "fragen")]
    pub questions: Vec<QuizItem>,
}

/// One question/answer pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuizItem {
    #[serde(rename = "frage")]
    pub question: String,
    #[serde(rename = "antwort")]
    pub answer: String,
}

/// Markdown code fence around a JSON payload, e.g. ```` ```json … ``` ````.
static RE_CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^\s*```(?:json)?\s*(.*?)\s*```\s*$").unwrap());

/// How many questions to ask for a transcript of this length.
///
/// One question per hundred words, clamped to 3..=10.
pub fn question_count(transcript: &str) -> usize {
    let words = transcript.split_whitespace().count();
    (words / 100).max(1).clamp(3, 10)
}

/// Reject transcripts too short to carry any questions.
pub fn validate_transcript(transcript: &str) -> Result<(), SummarizeError> {
    let len = transcript.chars().count();
    if len < MIN_TRANSCRIPT_CHARS {
        return Err(SummarizeError::TranscriptTooShort {
            len,
            min: MIN_TRANSCRIPT_CHARS,
        });
    }
    Ok(())
}

/// Parse a model response into a [`Quiz`], tolerating a code fence.
pub fn parse_quiz_response(response: &str) -> Result<Quiz, SummarizeError> {
    let body = match RE_CODE_FENCE.captures(response) {
        Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or(response),
        None => response.trim(),
    };

    serde_json::from_str::<Quiz>(body).map_err(|e| SummarizeError::QuizParseFailed {
        detail: format!("{e}; response started with: {:.80}", body),
    })
}

/// Generate a quiz from a transcript using an already-resolved provider.
///
/// Transport errors and timeouts are retried with exponential backoff
/// (`retry_backoff_ms * 2^attempt`, `max_retries` attempts); a response
/// that arrives but fails to parse is returned as
/// [`SummarizeError::QuizParseFailed`] immediately.
pub async fn generate_quiz(
    provider: &Arc<dyn LLMProvider>,
    transcript: &str,
    config: &SummaryConfig,
) -> Result<Quiz, SummarizeError> {
    validate_transcript(transcript)?;

    let num_questions = question_count(transcript);
    info!(
        "Generating quiz: {} questions for {} words",
        num_questions,
        transcript.split_whitespace().count()
    );

    let messages = vec![
        ChatMessage::system(QUIZ_SYSTEM_PROMPT),
        ChatMessage::user(&quiz_user_prompt(num_questions, transcript)),
    ];
    let options = crate::pipeline::llm::build_options(config, config.quiz_temperature);

    let mut last_err: Option<String> = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = config.retry_backoff_ms * 2u64.pow(attempt - 1);
            warn!(
                "Quiz generation: retry {}/{} after {}ms",
                attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        let call = provider.chat(&messages, Some(&options));
        match timeout(Duration::from_secs(config.api_timeout_secs), call).await {
            Ok(Ok(response)) => {
                debug!(
                    "Quiz response: {} output tokens",
                    response.completion_tokens
                );
                let quiz = parse_quiz_response(&response.content)?;
                if quiz.questions.is_empty() {
                    return Err(SummarizeError::QuizParseFailed {
                        detail: "response parsed but contained zero questions".to_string(),
                    });
                }
                info!("Quiz generated: {} questions", quiz.questions.len());
                return Ok(quiz);
            }
            Ok(Err(e)) => {
                let msg = format!("{e}");
                warn!("Quiz attempt {} failed — {}", attempt + 1, msg);
                last_err = Some(msg);
            }
            Err(_) => {
                let msg = format!("call timed out after {}s", config.api_timeout_secs);
                warn!("Quiz attempt {} failed — {}", attempt + 1, msg);
                last_err = Some(msg);
            }
        }
    }

    Err(SummarizeError::LlmApiError {
        message: format!(
            "quiz generation failed after {} retries: {}",
            config.max_retries,
            last_err.unwrap_or_else(|| "Unknown error".to_string())
        ),
    })
}

/// Generate a quiz from a transcript, resolving the provider from config.
///
/// The transcript is validated first, so a too-short transcript is
/// rejected even when no provider is configured.
pub async fn quiz_for_transcript(
    transcript: &str,
    config: &SummaryConfig,
) -> Result<Quiz, SummarizeError> {
    validate_transcript(transcript)?;
    let provider = resolve_provider(config)?;
    generate_quiz(&provider, transcript, config).await
}

/// Reformat a transcript as Markdown with headings.
///
/// One attempt, no retry: formatting is cosmetic and the caller can
/// fall back to the raw transcript.
pub async fn format_markdown(
    provider: &Arc<dyn LLMProvider>,
    transcript: &str,
    config: &SummaryConfig,
) -> Result<String, SummarizeError> {
    let messages = vec![
        ChatMessage::system(MARKDOWN_SYSTEM_PROMPT),
        ChatMessage::user(&markdown_user_prompt(transcript)),
    ];
    let options = crate::pipeline::llm::build_options(config, config.temperature);

    let call = provider.chat(&messages, Some(&options));
    match timeout(Duration::from_secs(config.api_timeout_secs), call).await {
        Ok(Ok(response)) => Ok(response.content),
        Ok(Err(e)) => Err(SummarizeError::LlmApiError {
            message: format!("markdown formatting failed: {e}"),
        }),
        Err(_) => Err(SummarizeError::LlmApiError {
            message: format!(
                "markdown formatting timed out after {}s",
                config.api_timeout_secs
            ),
        }),
    }
}
