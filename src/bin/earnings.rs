//! CLI binary for edgequake-earnings.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `AnalysisConfig`, keeps one `AnalystSession`, and prints the dashboard.

use anyhow::{Context, Result};
use clap::builder::FalseyValueParser;
use clap::Parser;
use edgequake_earnings::{
    AnalysisConfig, AnalysisProgressCallback, AnalystSession, ApiCredential, ErrorStage,
    FileState, ProgressCallback, RenderStyle,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── Terminal colour ───────────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

const SPINNER_TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── Spinner ───────────────────────────────────────────────────────────────────

/// Busy indicator shown while a run is in flight. A fresh spinner is created
/// for each run so interactive sessions can reuse the callback.
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
            if let Some(ref bar) = *guard {
                f(bar);
            }
        }
    }

    fn finish(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(bar) = guard.take() {
                bar.finish_and_clear();
            }
        }
    }
}

impl AnalysisProgressCallback for CliProgressCallback {
    fn on_upload_start(&self, bytes: u64) {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(SPINNER_TICKS),
        );
        bar.set_prefix("Uploading");
        bar.set_message(format!("{:.1} KB to Gemini…", bytes as f64 / 1024.0));
        bar.enable_steady_tick(Duration::from_millis(80));
        if let Ok(mut guard) = self.bar.lock() {
            *guard = Some(bar);
        }
    }

    fn on_upload_complete(&self, name: &str) {
        self.with_bar(|bar| {
            bar.println(format!("  {} Uploaded as {}", green("✓"), dim(name)));
            bar.set_prefix("Reading");
            bar.set_message("Gemini is reading the scanned text…");
        });
    }

    fn on_poll(&self, attempt: u32, state: FileState) {
        self.with_bar(|bar| bar.set_message(format!("file {state} (check {attempt})")));
    }

    fn on_generate_start(&self, model: &str) {
        self.with_bar(|bar| {
            bar.set_prefix("Analysing");
            bar.set_message(format!("asking {model}…"));
        });
    }

    fn on_analysis_complete(&self) {
        self.finish();
        eprintln!("{} Analysis Complete!", green("✔"));
    }

    fn on_analysis_error(&self, _stage: ErrorStage, _message: &str) {
        // The error itself is printed by the caller.
        self.finish();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Analyse a scanned earnings report
  earnings q2-results.pdf

  # Analyse a report straight from an investor-relations site
  earnings https://ir.example.com/q2-2026-results.pdf

  # Preview the dashboard layout without an API key
  earnings --demo

  # Keep a session open and analyse several reports one after another
  earnings --interactive

  # Use a different Gemini model
  earnings --model gemini-2.5-pro q2-results.pdf

INTERACTIVE COMMANDS:
  <path or URL>   analyse the report; a failed run keeps the previous dashboard
  :show           re-render the current dashboard
  :demo           load the demo result
  :quit           leave the session

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY           Google Gemini API key (https://aistudio.google.com/app/apikey)
  EARNINGS_MODEL           Override model ID
  EARNINGS_BASE_URL        Override the API root (proxies, local stubs)
  RUST_LOG                 Override log filtering

The key is only held in memory for the session; it is never written to disk.
"#;

/// Summarise scanned earnings-report PDFs with Gemini vision.
#[derive(Parser, Debug)]
#[command(
    name = "earnings",
    version,
    about = "Summarise scanned earnings-report PDFs into a management-commentary dashboard",
    long_about = "Upload a scanned financial-report PDF to Google Gemini, ask it for the \
company, period, sentiment, key takeaways, guidance and operational notes, and render the \
answer as a five-tile dashboard in the terminal.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: Option<String>,

    /// Gemini API key. Prompted for when missing and stdin is a terminal.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Gemini model ID.
    #[arg(long, env = "EARNINGS_MODEL", default_value = edgequake_earnings::config::DEFAULT_MODEL)]
    model: String,

    /// API root URL.
    #[arg(long, env = "EARNINGS_BASE_URL", default_value = edgequake_earnings::config::DEFAULT_BASE_URL)]
    base_url: String,

    /// Delay between file-state checks, in milliseconds.
    #[arg(long, env = "EARNINGS_POLL_INTERVAL_MS", default_value_t = 1000)]
    poll_interval_ms: u64,

    /// Maximum number of file-state checks before giving up.
    #[arg(long, env = "EARNINGS_MAX_POLL_ATTEMPTS", default_value_t = 120)]
    max_poll_attempts: u32,

    /// Per-request API timeout in seconds.
    #[arg(long, env = "EARNINGS_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// HTTP download timeout in seconds (URL inputs).
    #[arg(long, env = "EARNINGS_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Sampling temperature (0.0–2.0). Service default when unset.
    #[arg(long, env = "EARNINGS_TEMPERATURE")]
    temperature: Option<f32>,

    /// Path to a text file containing a custom analysis prompt.
    #[arg(long, env = "EARNINGS_PROMPT")]
    prompt_file: Option<PathBuf>,

    /// Render the built-in demo result; no API call is made.
    #[arg(long, conflicts_with = "input")]
    demo: bool,

    /// Keep a session open and read paths/URLs from stdin.
    #[arg(short, long, conflicts_with = "demo")]
    interactive: bool,

    /// Dashboard width in columns.
    #[arg(long, env = "EARNINGS_WIDTH", default_value_t = 80)]
    width: usize,

    /// Disable ANSI colours in the dashboard.
    #[arg(long, env = "NO_COLOR", value_parser = FalseyValueParser::new())]
    no_color: bool,

    /// Disable the busy spinner.
    #[arg(long, env = "EARNINGS_NO_PROGRESS", value_parser = FalseyValueParser::new())]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "EARNINGS_VERBOSE", value_parser = FalseyValueParser::new())]
    verbose: bool,

    /// Suppress everything except the dashboard and errors.
    #[arg(short, long, env = "EARNINGS_QUIET", value_parser = FalseyValueParser::new())]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner provides all the feedback that matters; library INFO logs
    // would only tear it.
    let show_progress = !cli.quiet && !cli.no_progress && io::stderr().is_terminal();
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

    let style = RenderStyle {
        color: !cli.no_color && io::stdout().is_terminal(),
        width: cli.width,
    };

    // ── Demo mode ────────────────────────────────────────────────────────
    if cli.demo {
        let mut session = AnalystSession::new(ApiCredential::new(""), AnalysisConfig::default());
        session.load_sample();
        print!("{}", session.dashboard().render(style));
        return Ok(());
    }

    if cli.input.is_none() && !cli.interactive {
        anyhow::bail!("No input given. Pass a PDF path or URL, --interactive, or --demo.");
    }

    // ── Build config and session ─────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn AnalysisProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb).await?;
    let credential = resolve_credential(&cli)?;
    let mut session = AnalystSession::new(credential, config);

    if cli.interactive {
        return run_interactive(&mut session, cli.input.as_deref(), style, cli.quiet).await;
    }

    // ── One-shot run ─────────────────────────────────────────────────────
    let input = cli.input.as_deref().unwrap_or_default();
    session
        .run_file(input)
        .await
        .with_context(|| format!("Could not analyse '{input}'"))?;
    print!("{}", session.dashboard().render(style));
    Ok(())
}

/// Read paths/URLs from stdin and analyse them one at a time.
async fn run_interactive(
    session: &mut AnalystSession,
    first: Option<&str>,
    style: RenderStyle,
    quiet: bool,
) -> Result<()> {
    if let Some(input) = first {
        run_one(session, input, style).await;
    } else {
        print!("{}", session.dashboard().render(style));
    }

    let stdin = io::stdin();
    loop {
        if !quiet {
            eprint!("{} ", dim("report>"));
            io::stderr().flush().ok();
        }
        let mut line = String::new();
        if stdin.lock().read_line(&mut line).context("Failed to read stdin")? == 0 {
            break;
        }
        match line.trim() {
            "" => continue,
            ":quit" | ":q" | ":exit" => break,
            ":show" => print!("{}", session.dashboard().render(style)),
            ":demo" => {
                session.load_sample();
                print!("{}", session.dashboard().render(style));
            }
            input => run_one(session, input, style).await,
        }
    }
    Ok(())
}

/// One analysis in an interactive session. Errors are printed and the
/// previous dashboard is shown again.
async fn run_one(session: &mut AnalystSession, input: &str, style: RenderStyle) {
    if let Err(e) = session.run_file(input).await {
        // Upload and analysis messages already carry their stage prefix.
        let icon = match e.stage() {
            ErrorStage::Upload | ErrorStage::Analysis => "❌",
            ErrorStage::Input => "⚠️",
        };
        eprintln!("{} {}", icon, red(&e.to_string()));
    }
    print!("{}", session.dashboard().render(style));
    io::stdout().flush().ok();
}

/// Take the key from the flag/env, or ask for it on a terminal.
fn resolve_credential(cli: &Cli) -> Result<ApiCredential> {
    if let Some(ref key) = cli.api_key {
        return Ok(ApiCredential::new(key.as_str()));
    }
    if !io::stdin().is_terminal() {
        anyhow::bail!("No API key. Pass --api-key or set GEMINI_API_KEY.");
    }
    eprint!("Enter Google Gemini API key: ");
    io::stderr().flush().ok();
    let mut key = String::new();
    io::stdin()
        .lock()
        .read_line(&mut key)
        .context("Failed to read API key")?;
    let key = ApiCredential::new(key);
    if key.is_empty() {
        anyhow::bail!("No API key entered.");
    }
    Ok(key)
}

/// Map CLI args to `AnalysisConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<AnalysisConfig> {
    let mut builder = AnalysisConfig::builder()
        .model(&cli.model)
        .base_url(&cli.base_url)
        .poll_interval_ms(cli.poll_interval_ms)
        .max_poll_attempts(cli.max_poll_attempts)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout);

    if let Some(t) = cli.temperature {
        builder = builder.temperature(t);
    }

    if let Some(ref path) = cli.prompt_file {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt from {:?}", path))?;
        builder = builder.prompt(prompt);
    }

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
