//! Prompt constants for summarization, image description, and quizzes.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — the original app carried three
//!    slightly different copies of the same German summary instruction;
//!    changing behaviour now means editing exactly one place.
//!
//! 2. **Testability** — unit tests can inspect prompts directly without
//!    a live model, making prompt regressions easy to catch.
//!
//! Callers override the defaults via [`crate::config::SummaryConfig`];
//! the constants here are used only when no override is provided. The
//! product language is German, so the prompts are too.

/// Default prompt for describing one embedded image or page render.
pub const DEFAULT_IMAGE_PROMPT: &str = "Das folgende Bild ist Teil einer Präsentation. \
Fasse zentrale Inhalte des Bildes in maximal 100 Worten zusammen, ohne Informationen hinzuzufügen. \
Wenn keine Informationen erkennbar sind, gib nichts zurück.";

/// Default instruction for summarizing one unit's text blob.
///
/// Sent as the system message; the extracted unit text is the user turn.
pub const DEFAULT_SUMMARY_PROMPT: &str = "Du fasst die wichtigsten Informationen eines Textes \
auf Deutsch in ganzen Sätzen zusammen. Füge keine Informationen hinzu. \
Gib nur die Zusammenfassung zurück. Füge keine Textformatierung hinzu.";

/// System message for quiz generation.
pub const QUIZ_SYSTEM_PROMPT: &str = "Du bist ein hilfreicher Assistent, der Fragen und \
Antworten zu einem gegebenen Transkript generiert.";

/// System message for the Markdown formatting step.
pub const MARKDOWN_SYSTEM_PROMPT: &str = "Du formatierst Texte in schönem Markdown.";

/// Build the quiz user prompt for a transcript and a target question count.
///
/// The prompt pins the exact number of questions and the JSON shape; the
/// response is parsed as [`crate::quiz::Quiz`], so any deviation from the
/// shape surfaces as a parse error.
pub fn quiz_user_prompt(num_questions: usize, transcript: &str) -> String {
    format!(
        r#"Du bist ein Professor, der inhaltliche Fragen stellt. Hier erhältst du das Transkript einer Vorlesung. Generiere {num_questions} Fragen auf Deutsch, die testen, dass der Zuhörer aufgepasst hat. Die Fragen sollen sich ausschließlich auf den Inhalt des Transkripts beziehen und innerhalb des Vortrags beantwortet werden können, die Antworten ebenso. Frage und Antwort sollten mindestens 10 Wörter lang sein.

Transkript: {transcript}

Antworte nur mit einem JSON-Objekt im folgenden Format:
{{
    "fragen": [
        {{"frage": "Frage 1", "antwort": "Antwort 1"}},
        ...
        {{"frage": "Frage {num_questions}", "antwort": "Antwort {num_questions}"}}
    ]
}}"#
    )
}

/// Build the user prompt for formatting a transcript as Markdown.
pub fn markdown_user_prompt(transcript: &str) -> String {
    format!(
        "Formatiere das folgende Transkript in schön formatiertem Markdown \
mit passenden Überschriften. Behalte den Inhalt auf Deutsch:\n\n{transcript}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiz_prompt_pins_question_count() {
        let p = quiz_user_prompt(7, "ein transkript");
        assert!(p.contains("Generiere 7 Fragen"));
        assert!(p.contains("ein transkript"));
        assert!(p.contains("\"fragen\""));
    }

    #[test]
    fn markdown_prompt_embeds_transcript() {
        let p = markdown_user_prompt("hallo welt");
        assert!(p.ends_with("hallo welt"));
    }
}
