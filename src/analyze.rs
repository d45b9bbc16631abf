//! Analysis entry points.
//!
//! Every entry point runs the same sequence and returns either a complete
//! [`AnalysisResult`] or an [`AnalystError`]:
//!
//! ```text
//! resolve/stage ──▶ upload ──▶ poll ──▶ generate ──▶ parse
//! ```
//!
//! The staged or downloaded file is owned by a local and removed when the
//! function returns, whichever way it returns.

use crate::config::{AnalysisConfig, ApiCredential};
use crate::error::AnalystError;
use crate::gemini::GeminiClient;
use crate::pipeline::input::{self, ResolvedInput};
use crate::pipeline::{generate, parse, upload};
use crate::remote::RemoteFileService;
use crate::result::AnalysisResult;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Analyse a PDF held in memory.
///
/// The bytes are written to a scoped temporary file for the upload and the
/// file is deleted before this function returns.
///
/// # Example
/// ```rust,no_run
/// use edgequake_earnings::{analyze, AnalysisConfig, ApiCredential, TextField};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes = std::fs::read("q2-results.pdf")?;
/// let key = ApiCredential::new(std::env::var("GEMINI_API_KEY")?);
/// let result = analyze(&bytes, &key, &AnalysisConfig::default()).await?;
/// println!("{}", result.text(TextField::CompanyName));
/// # Ok(())
/// # }
/// ```
pub async fn analyze(
    pdf_bytes: &[u8],
    credential: &ApiCredential,
    config: &AnalysisConfig,
) -> Result<AnalysisResult, AnalystError> {
    let staged = input::stage_bytes(pdf_bytes)?;
    run_pipeline(&staged, credential, config).await
}

/// Analyse a local PDF file or an HTTP/HTTPS URL.
pub async fn analyze_file(
    input_str: impl AsRef<str>,
    credential: &ApiCredential,
    config: &AnalysisConfig,
) -> Result<AnalysisResult, AnalystError> {
    let input_str = input_str.as_ref();
    info!("Starting analysis: {}", input_str);
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    run_pipeline(&resolved, credential, config).await
}

/// Synchronous wrapper around [`analyze_file`].
///
/// Creates a temporary tokio runtime internally.
pub fn analyze_file_sync(
    input_str: impl AsRef<str>,
    credential: &ApiCredential,
    config: &AnalysisConfig,
) -> Result<AnalysisResult, AnalystError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| AnalystError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(analyze_file(input_str, credential, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Pick the remote service: a pre-built one from the config wins, otherwise
/// a Gemini client is configured with the credential.
fn resolve_service(
    credential: &ApiCredential,
    config: &AnalysisConfig,
) -> Result<Arc<dyn RemoteFileService>, AnalystError> {
    if let Some(ref service) = config.service {
        return Ok(Arc::clone(service));
    }
    if credential.is_empty() {
        return Err(AnalystError::MissingCredential);
    }
    Ok(Arc::new(GeminiClient::new(credential.clone(), config)?))
}

async fn run_pipeline(
    input: &ResolvedInput,
    credential: &ApiCredential,
    config: &AnalysisConfig,
) -> Result<AnalysisResult, AnalystError> {
    let result = run_steps(input, credential, config).await;

    if let Some(ref cb) = config.progress_callback {
        match &result {
            Ok(_) => cb.on_analysis_complete(),
            Err(e) => cb.on_analysis_error(e.stage(), &e.to_string()),
        }
    }
    if let Err(ref e) = result {
        warn!("Analysis failed at {} stage: {}", e.stage(), e);
    }
    result
}

async fn run_steps(
    input: &ResolvedInput,
    credential: &ApiCredential,
    config: &AnalysisConfig,
) -> Result<AnalysisResult, AnalystError> {
    let total_start = Instant::now();

    // ── Step 1: Configure the client ─────────────────────────────────────
    let service = resolve_service(credential, config)?;

    // ── Step 2: Upload and wait until the file is ready ──────────────────
    let file = upload::upload_and_wait(service.as_ref(), input, config).await?;

    // ── Step 3: Generate ─────────────────────────────────────────────────
    let response = generate::generate_analysis(service.as_ref(), &file, config).await?;

    // ── Step 4: Parse ────────────────────────────────────────────────────
    let result = parse::parse_response(&response.text)?;

    info!(
        "Analysis complete in {}ms",
        total_start.elapsed().as_millis()
    );
    Ok(result)
}
