//! CLI binary for ats-checker.
//!
//! A thin shell over the library crate: collects the job description and the
//! resume, maps flags to `AnalyzerConfig`, runs one action (or a menu loop
//! with `--interactive`) and prints the model's answer.

use anyhow::{Context, Result};
use ats_checker::{
    Action, Analysis, AnalysisProgressCallback, Analyzer, AnalyzerConfig, AnalyzerConfigBuilder,
    ProgressCallback, ResumeDocument,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tracing::warn;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal spinner: one per analysis, cleared when the answer arrives.
struct CliProgressCallback {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            bar: Mutex::new(None),
        })
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(bar) = guard.as_ref() {
                f(bar);
            }
        }
    }

    fn clear(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(bar) = guard.take() {
                bar.finish_and_clear();
            }
        }
    }
}

impl AnalysisProgressCallback for CliProgressCallback {
    fn on_analysis_start(&self, action: Action) {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix(action.label());
        bar.set_message("Rendering resume…");
        bar.enable_steady_tick(Duration::from_millis(80));

        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.replace(bar) {
                old.finish_and_clear();
            }
        }
    }

    fn on_page_rendered(&self, width: u32, height: u32, jpeg_len: usize) {
        self.with_bar(|bar| {
            bar.println(format!(
                "  {} Page 1 rendered  {}",
                green("✓"),
                dim(&format!("{width}x{height} px, {} KiB", jpeg_len / 1024)),
            ));
        });
    }

    fn on_dispatch_start(&self, _action: Action, model: &str) {
        self.with_bar(|bar| bar.set_message(format!("Asking {model}…")));
    }

    fn on_analysis_complete(&self, _action: Action, _text_len: usize) {
        self.clear();
    }

    fn on_analysis_error(&self, _action: Action, _error: &str) {
        self.clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Percentage match
  ats-check --resume cv.pdf --job-description "Senior Data Analyst, SQL, Python required" \
            --action percentage-match

  # Job description from a file, JSON output
  ats-check -r cv.pdf --job-description-file job.txt -a missing-keywords --json

  # Menu loop: run several analyses against the same inputs
  ats-check -r cv.pdf --job-description-file job.txt --interactive

  # Use another provider through edgequake-llm
  ats-check --provider openai --model gpt-4.1-mini -r cv.pdf -j "..." -a improve-skills

ACTIONS:
  about-resume       Tell me about my resume
  improve-skills     How can I improve my skills?
  missing-keywords   What are the keywords that are missing?
  percentage-match   Percentage match

ENVIRONMENT VARIABLES (also read from .env):
  GOOGLE_API_KEY       Gemini API key (fallback: GEMINI_API_KEY)
  ATS_MODEL            Model ID (default: gemini-2.5-flash)
  ATS_PROVIDER         gemini (default), openai, anthropic, ollama, …
  ATS_GEMINI_ENDPOINT  Override the Gemini base URL
  ATS_API_TIMEOUT      Model call timeout in seconds (default: 60)
  PDFIUM_LIB_PATH      Directory containing libpdfium

Only the first page of the resume is sent to the model."#;

/// Check a PDF resume against a job description using a multimodal LLM.
#[derive(Parser, Debug)]
#[command(
    name = "ats-check",
    version,
    about = "Check a PDF resume against a job description using a multimodal LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Resume PDF (only the first page is analysed).
    #[arg(short, long, env = "ATS_RESUME")]
    resume: Option<PathBuf>,

    /// Job description text.
    #[arg(short, long, conflicts_with = "job_description_file")]
    job_description: Option<String>,

    /// Read the job description from a file (`-` for stdin).
    #[arg(long)]
    job_description_file: Option<PathBuf>,

    /// Analysis to run.
    #[arg(short, long, value_enum, required_unless_present = "interactive")]
    action: Option<ActionArg>,

    /// Show a menu and run analyses until `q`.
    #[arg(short, long)]
    interactive: bool,

    /// Model ID (e.g. gemini-2.5-flash, gemini-2.5-pro, gpt-4.1-mini).
    #[arg(long, env = "ATS_MODEL")]
    model: Option<String>,

    /// Backend: gemini (default) or an edgequake-llm provider name.
    #[arg(long, env = "ATS_PROVIDER")]
    provider: Option<String>,

    /// Rendering DPI (72–400).
    #[arg(long, env = "ATS_DPI", default_value_t = 200,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// JPEG quality (1–100).
    #[arg(long, env = "ATS_JPEG_QUALITY", default_value_t = 75,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    jpeg_quality: u8,

    /// Password for an encrypted resume.
    #[arg(long, env = "ATS_PDF_PASSWORD")]
    password: Option<String>,

    /// Sampling temperature (0.0–2.0). Provider default if unset.
    #[arg(long, env = "ATS_TEMPERATURE")]
    temperature: Option<f32>,

    /// Max output tokens. Provider default if unset.
    #[arg(long, env = "ATS_MAX_TOKENS")]
    max_tokens: Option<usize>,

    /// Model call timeout in seconds.
    #[arg(long, env = "ATS_API_TIMEOUT", default_value_t = 60,
          value_parser = clap::value_parser!(u64).range(1..))]
    api_timeout: u64,

    /// Print the analysis as JSON.
    #[arg(long)]
    json: bool,

    /// Disable the spinner.
    #[arg(long, env = "ATS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "ATS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except the answer and errors.
    #[arg(short, long, env = "ATS_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ActionArg {
    AboutResume,
    PercentageMatch,
    ImproveSkills,
    MissingKeywords,
}

impl From<ActionArg> for Action {
    fn from(v: ActionArg) -> Self {
        match v {
            ActionArg::AboutResume => Action::AboutResume,
            ActionArg::PercentageMatch => Action::PercentageMatch,
            ActionArg::ImproveSkills => Action::ImproveSkills,
            ActionArg::MissingKeywords => Action::MissingKeywords,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // The original tool read its key from .env; keep that working.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    check_inputs(&cli)?;

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback a user needs; library INFO logs
    // would only tear it.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build analyzer (fails fast on a missing key) ─────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn AnalysisProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;
    let analyzer = Analyzer::new(config).context("Could not initialise the model backend")?;

    // ── Inputs ───────────────────────────────────────────────────────────
    let mut resume = match cli.resume {
        Some(ref path) => Some(load_resume(path).await?),
        None => None,
    };
    let job_description = read_job_description(&cli).await?;
    if job_description.trim().is_empty() {
        warn!("Job description is empty");
    }

    if cli.interactive {
        run_session(&analyzer, &cli, &job_description, &mut resume).await?;
        return Ok(ExitCode::SUCCESS);
    }

    let action: Action = match cli.action {
        Some(a) => a.into(),
        None => anyhow::bail!("--action is required without --interactive"),
    };

    match analyzer.analyze(&job_description, resume.as_ref(), action).await {
        Ok(analysis) => {
            print_analysis(&analysis, &cli)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("{} {}", red("✘"), e);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Map CLI args onto the environment-derived `AnalyzerConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<AnalyzerConfig> {
    let builder = AnalyzerConfig::env_builder().context("Invalid configuration")?;
    apply_flags(builder, cli, progress)
        .build()
        .context("Invalid configuration")
}

/// Layer command-line flags over `builder`; validation happens in `build()`.
fn apply_flags(
    mut builder: AnalyzerConfigBuilder,
    cli: &Cli,
    progress: Option<ProgressCallback>,
) -> AnalyzerConfigBuilder {
    builder = builder
        .dpi(cli.dpi)
        .jpeg_quality(cli.jpeg_quality)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(t) = cli.temperature {
        builder = builder.temperature(t);
    }
    if let Some(n) = cli.max_tokens {
        builder = builder.max_output_tokens(n);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    builder
}

/// Reject flag combinations clap cannot express.
fn check_inputs(cli: &Cli) -> Result<()> {
    let jd_from_stdin = cli
        .job_description_file
        .as_deref()
        .is_some_and(|p| p.as_os_str() == "-");
    if cli.interactive && jd_from_stdin {
        anyhow::bail!(
            "--job-description-file - cannot be combined with --interactive: \
             the menu reads its choices from stdin"
        );
    }
    Ok(())
}

async fn load_resume(path: &Path) -> Result<ResumeDocument> {
    ResumeDocument::from_path(path)
        .await
        .with_context(|| format!("Failed to read resume {:?}", path))
}

/// Job description from `--job-description`, `--job-description-file`, or empty.
async fn read_job_description(cli: &Cli) -> Result<String> {
    if let Some(ref text) = cli.job_description {
        return Ok(text.clone());
    }
    match cli.job_description_file {
        Some(ref path) if path.as_os_str() == "-" => {
            let mut text = String::new();
            tokio::io::stdin()
                .read_to_string(&mut text)
                .await
                .context("Failed to read job description from stdin")?;
            Ok(text)
        }
        Some(ref path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read job description from {:?}", path)),
        None => Ok(String::new()),
    }
}

/// Menu loop. Every error is shown and the loop continues; only `q` or EOF
/// ends the session.
async fn run_session(
    analyzer: &Analyzer,
    cli: &Cli,
    job_description: &str,
    resume: &mut Option<ResumeDocument>,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print_menu(resume.as_ref());
        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            break;
        };
        let line = line.trim();

        match line {
            "" => continue,
            "q" | "quit" | "exit" => break,
            _ => {}
        }

        if let Some(path) = line.strip_prefix("u ") {
            match load_resume(Path::new(path.trim())).await {
                Ok(doc) => {
                    eprintln!("{} PDF uploaded successfully!", green("✔"));
                    *resume = Some(doc);
                }
                Err(e) => eprintln!("{} {:#}", red("✘"), e),
            }
            continue;
        }

        let action = match line.parse::<Action>() {
            Ok(a) => a,
            Err(e) => {
                eprintln!("{} {}", red("✘"), e);
                continue;
            }
        };

        match analyzer.analyze(job_description, resume.as_ref(), action).await {
            Ok(analysis) => print_analysis(&analysis, cli)?,
            Err(e) => eprintln!("{} {}", red("✘"), e),
        }
    }

    Ok(())
}

fn print_menu(resume: Option<&ResumeDocument>) {
    let status = match resume {
        Some(doc) => green(&format!("resume: {}", doc.name().unwrap_or("uploaded"))),
        None => red("no resume uploaded"),
    };
    eprintln!();
    eprintln!("{} {}", cyan("◆"), status);
    for (i, action) in Action::ALL.iter().enumerate() {
        eprintln!("  {}  {}", bold(&(i + 1).to_string()), action.label());
    }
    eprintln!("  {}  upload a resume   {}  quit", bold("u <path>"), bold("q"));
    eprint!("> ");
    io::stderr().flush().ok();
}

fn print_analysis(analysis: &Analysis, cli: &Cli) -> Result<()> {
    if cli.json {
        let json = serde_json::to_string_pretty(analysis).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    if !cli.quiet {
        eprintln!("{} {}", green("✔"), bold(analysis.action.label()));
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(analysis.text.as_bytes())
        .context("Failed to write to stdout")?;
    if !analysis.text.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    handle.flush().ok();

    if !cli.quiet {
        let s = &analysis.stats;
        eprintln!(
            "   {}",
            dim(&format!(
                "{} · page 1 of {} · {} tokens in / {} tokens out · {}ms",
                analysis.model,
                s.page_count,
                s.prompt_tokens,
                s.completion_tokens,
                s.total_duration_ms
            ))
        );
    }

    Ok(())
}
