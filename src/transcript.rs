//! YouTube transcript acquisition.
//!
//! Accepts full watch URLs, short links, embed URLs, or a bare 11-char
//! video id, fetches the caption track from YouTube's timedtext
//! endpoint, and flattens the caption XML into one plain-text
//! transcript suitable for [`crate::quiz::generate_quiz`].
//!
//! Only videos with an available caption track in the requested
//! language work; everything else surfaces as
//! [`SummarizeError::TranscriptUnavailable`].

use crate::config::SummaryConfig;
use crate::error::SummarizeError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use tracing::{debug, info};

/// YouTube video ids are exactly 11 URL-safe base64 characters.
static RE_VIDEO_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/)([A-Za-z0-9_-]{11})",
    )
    .unwrap()
});

static RE_BARE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").unwrap());

/// Extract the 11-character video id from a URL or bare id.
pub fn extract_video_id(input: &str) -> Result<String, SummarizeError> {
    let input = input.trim();

    if let Some(caps) = RE_VIDEO_ID.captures(input) {
        if let Some(id) = caps.get(1) {
            return Ok(id.as_str().to_string());
        }
    }
    if RE_BARE_ID.is_match(input) {
        return Ok(input.to_string());
    }

    Err(SummarizeError::InvalidVideoUrl {
        input: input.to_string(),
    })
}

/// Fetch and flatten the caption track for a video.
///
/// `lang` is a BCP-47 language code like `"de"` or `"en"`.
pub async fn fetch_transcript(
    video_url_or_id: &str,
    lang: &str,
    config: &SummaryConfig,
) -> Result<String, SummarizeError> {
    let video_id = extract_video_id(video_url_or_id)?;
    info!("Fetching {} transcript for video {}", lang, video_id);

    let url = format!(
        "https://www.youtube.com/api/timedtext?v={video_id}&lang={lang}&fmt=srv1"
    );

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.download_timeout_secs))
        .build()
        .map_err(|e| SummarizeError::Internal(format!("http client: {e}")))?;

    let response = client.get(&url).send().await.map_err(|e| {
        SummarizeError::TranscriptUnavailable {
            video_id: video_id.clone(),
            reason: format!("request failed: {e}"),
        }
    })?;

    if !response.status().is_success() {
        return Err(SummarizeError::TranscriptUnavailable {
            video_id,
            reason: format!("HTTP {}", response.status()),
        });
    }

    let xml = response
        .text()
        .await
        .map_err(|e| SummarizeError::TranscriptUnavailable {
            video_id: video_id.clone(),
            reason: format!("body read failed: {e}"),
        })?;

    let transcript = parse_caption_xml(&xml);
    if transcript.is_empty() {
        // An empty 200 body is how YouTube answers for a missing track.
        return Err(SummarizeError::TranscriptUnavailable {
            video_id,
            reason: format!("no '{lang}' caption track"),
        });
    }

    debug!("Transcript: {} chars", transcript.chars().count());
    Ok(transcript)
}

/// Flatten timedtext XML (`<transcript><text ...>…</text>…`) into one
/// space-joined string, with entities unescaped.
pub(crate) fn parse_caption_xml(xml: &str) -> String {
    use quick_xml::events::Event;
    use quick_xml::Reader;

    let mut reader = Reader::from_str(xml);
    let mut parts: Vec<String> = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"text" => in_text = true,
            Ok(Event::End(ref e)) if e.name().as_ref() == b"text" => in_text = false,
            Ok(Event::Text(t)) if in_text => {
                if let Ok(s) = t.unescape() {
                    let s = s.trim();
                    if !s.is_empty() {
                        parts.push(s.to_string());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_id_from_watch_url() {
        let id = extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap();
        assert_eq!(id, "dQw4w9WgXcQ");
    }

    #[test]
    fn extracts_id_from_short_url() {
        let id = extract_video_id("https://youtu.be/dQw4w9WgXcQ?t=42").unwrap();
        assert_eq!(id, "dQw4w9WgXcQ");
    }

    #[test]
    fn extracts_id_from_embed_url() {
        let id = extract_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ").unwrap();
        assert_eq!(id, "dQw4w9WgXcQ");
    }

    #[test]
    fn accepts_bare_id() {
        let id = extract_video_id("dQw4w9WgXcQ").unwrap();
        assert_eq!(id, "dQw4w9WgXcQ");
    }

    #[test]
    fn rejects_garbage() {
        for input in ["", "not a url", "https://example.com/watch?v=abc", "short"] {
            match extract_video_id(input) {
                Err(SummarizeError::InvalidVideoUrl { .. }) => {}
                other => panic!("{input:?}: expected InvalidVideoUrl, got {other:?}"),
            }
        }
    }

    #[test]
    fn caption_xml_flattens_and_unescapes() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<transcript>
  <text start="0.0" dur="2.5">Willkommen zur Vorlesung</text>
  <text start="2.5" dur="3.0">heute geht es um &amp;-Referenzen</text>
</transcript>"#;
        let out = parse_caption_xml(xml);
        assert_eq!(out, "Willkommen zur Vorlesung heute geht es um &-Referenzen");
    }

    #[test]
    fn empty_body_yields_empty_transcript() {
        assert!(parse_caption_xml("").is_empty());
        assert!(parse_caption_xml("<transcript></transcript>").is_empty());
    }
}
