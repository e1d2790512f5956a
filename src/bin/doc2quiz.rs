//! CLI binary for doc2quiz.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `SummaryConfig` and prints results.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use doc2quiz::{
    describe_file, fetch_transcript, quiz_for_transcript, PdfImageMode, SummaryConfig,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Summarize a PDF (stdout)
  doc2quiz summarize vorlesung_03.pdf

  # Summarize slides, condensed to at most 3000 characters
  doc2quiz summarize --condense --max-length 3000 folien.pptx

  # Render whole PDF pages instead of extracting embedded images
  doc2quiz summarize --image-mode render --dpi 150 skript.pdf

  # Summarize, then generate a quiz from the summary
  doc2quiz quiz --from-file vorlesung_03.pdf

  # Quiz from a YouTube lecture's caption track
  doc2quiz quiz --from-video "https://youtu.be/dQw4w9WgXcQ" --lang de

  # Quiz from a transcript on stdin
  cat transkript.txt | doc2quiz quiz

  # Fetch a caption track as plain text (no API key needed)
  doc2quiz transcript "https://www.youtube.com/watch?v=dQw4w9WgXcQ"

  # Structured JSON output
  doc2quiz summarize --json vorlesung_03.pdf > summary.json

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY        OpenAI API key
  ANTHROPIC_API_KEY     Anthropic API key
  GEMINI_API_KEY        Google Gemini API key
  DOC2QUIZ_LLM_PROVIDER Override provider (openai, anthropic, gemini, ollama)
  DOC2QUIZ_MODEL        Override model ID
  PDFIUM_LIB_PATH       Path to an existing libpdfium shared library

SETUP:
  1. Set API key:     export OPENAI_API_KEY=sk-...
  2. Summarize:       doc2quiz summarize vorlesung_03.pdf
"#;

/// Summarize lecture PDFs/slides and generate German study quizzes.
#[derive(Parser, Debug)]
#[command(
    name = "doc2quiz",
    version,
    about = "Summarize lecture PDFs/PPTX with Vision LLMs and generate study quizzes",
    arg_required_else_help = true,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1, claude-sonnet-4-20250514).
    #[arg(long, global = true, env = "DOC2QUIZ_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama.
    #[arg(long, global = true, env = "DOC2QUIZ_LLM_PROVIDER")]
    provider: Option<String>,

    /// Output structured JSON instead of plain text.
    #[arg(long, global = true)]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors and results.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize a PDF or PPTX document.
    Summarize {
        /// Local .pdf or .pptx file.
        input: PathBuf,

        /// Write the summary to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Re-summarize when the aggregate exceeds --max-length.
        #[arg(long)]
        condense: bool,

        /// Target maximum summary length in characters.
        #[arg(long, default_value_t = 3000)]
        max_length: usize,

        /// PDF image handling: embedded (extract images) or render (rasterise pages).
        #[arg(long, value_enum, default_value = "embedded")]
        image_mode: ImageModeArg,

        /// Rendering DPI for --image-mode render (72–400).
        #[arg(long, default_value_t = 150,
              value_parser = clap::value_parser!(u32).range(72..=400))]
        dpi: u32,

        /// Append each unit's extracted text to <stem>.txt in this directory.
        #[arg(long)]
        dump_content: Option<PathBuf>,

        /// Treat any skipped unit as an error.
        #[arg(long)]
        strict: bool,
    },

    /// Generate a quiz from a document, video, or transcript on stdin.
    Quiz {
        /// Summarize this PDF/PPTX first, then quiz the summary.
        #[arg(long, conflicts_with = "from_video")]
        from_file: Option<PathBuf>,

        /// Fetch this video's caption track, then quiz the transcript.
        #[arg(long)]
        from_video: Option<String>,

        /// Caption language for --from-video.
        #[arg(long, default_value = "de")]
        lang: String,
    },

    /// Fetch a YouTube caption track as plain text.
    Transcript {
        /// Video URL or bare 11-character video id.
        video: String,

        /// Caption language code.
        #[arg(long, default_value = "de")]
        lang: String,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ImageModeArg {
    Embedded,
    Render,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Summarize {
            ref input,
            ref output,
            condense,
            max_length,
            image_mode,
            dpi,
            ref dump_content,
            strict,
        } => {
            let mut builder = base_config(&cli)
                .condense(condense)
                .max_summary_chars(max_length)
                .pdf_images(match image_mode {
                    ImageModeArg::Embedded => PdfImageMode::Embedded,
                    ImageModeArg::Render => PdfImageMode::PageRender { dpi },
                });
            if let Some(dir) = dump_content {
                builder = builder.content_dump_dir(dir.clone());
            }
            let config = builder.build().context("Invalid configuration")?;

            let spinner = spinner(&cli, &format!("Summarizing {}", input.display()));
            let result = describe_file(input, &config).await;
            if let Some(s) = spinner {
                s.finish_and_clear();
            }
            let summary = result.context("Summarization failed")?;

            let summary = if strict {
                summary.into_result().context("Summarization incomplete")?
            } else {
                summary
            };

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else if let Some(path) = output {
                tokio::fs::write(path, &summary.summary)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                if !cli.quiet {
                    eprintln!(
                        "{}  {}/{} units  {}ms  →  {}",
                        green("✔"),
                        summary.stats.summarized_units,
                        summary.stats.total_units,
                        summary.stats.total_duration_ms,
                        bold(&path.display().to_string()),
                    );
                }
            } else {
                let stdout = io::stdout();
                let mut handle = stdout.lock();
                handle.write_all(summary.summary.as_bytes())?;
                if !summary.summary.ends_with('\n') {
                    handle.write_all(b"\n").ok();
                }
                if !cli.quiet {
                    eprintln!(
                        "   {} tokens in  /  {} tokens out  —  {}ms total",
                        dim(&summary.stats.total_input_tokens.to_string()),
                        dim(&summary.stats.total_output_tokens.to_string()),
                        summary.stats.total_duration_ms,
                    );
                    if summary.stats.skipped_units > 0 {
                        eprintln!(
                            "{}  {} units skipped",
                            cyan("⚠"),
                            summary.stats.skipped_units
                        );
                    }
                }
            }
        }

        Command::Quiz {
            ref from_file,
            ref from_video,
            ref lang,
        } => {
            let config = base_config(&cli).build().context("Invalid configuration")?;

            let transcript = if let Some(path) = from_file {
                let spinner = spinner(&cli, &format!("Summarizing {}", path.display()));
                let result = describe_file(path, &config).await;
                if let Some(s) = spinner {
                    s.finish_and_clear();
                }
                result.context("Summarization failed")?.summary
            } else if let Some(video) = from_video {
                fetch_transcript(video, lang, &config)
                    .await
                    .context("Transcript fetch failed")?
            } else {
                let mut buf = String::new();
                io::Read::read_to_string(&mut io::stdin(), &mut buf)
                    .context("Failed to read transcript from stdin")?;
                buf
            };

            let spinner = spinner(&cli, "Generating quiz");
            let result = quiz_for_transcript(&transcript, &config).await;
            if let Some(s) = spinner {
                s.finish_and_clear();
            }
            let quiz = result.context("Quiz generation failed")?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&quiz)?);
            } else {
                for (i, item) in quiz.questions.iter().enumerate() {
                    println!("{} {}", bold(&format!("Frage {}:", i + 1)), item.question);
                    println!("{} {}\n", green("Antwort:"), item.answer);
                }
            }
        }

        Command::Transcript { ref video, ref lang } => {
            let config = base_config(&cli).build().context("Invalid configuration")?;
            let transcript = fetch_transcript(video, lang, &config)
                .await
                .context("Transcript fetch failed")?;
            println!("{transcript}");
        }
    }

    Ok(())
}

/// Builder seeded with the global model/provider flags.
fn base_config(cli: &Cli) -> doc2quiz::SummaryConfigBuilder {
    let mut builder = SummaryConfig::builder();
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    builder
}

/// Stderr spinner for long-running calls, unless quiet/json output.
fn spinner(cli: &Cli, msg: &str) -> Option<ProgressBar> {
    if cli.quiet || cli.json {
        return None;
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_message(msg.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    Some(bar)
}
