//! The single generation call against an uploaded file.
//!
//! The prompt lives in [`crate::prompts`] and parsing in
//! [`crate::pipeline::parse`]. There is no retry; one failed call ends the
//! run.

use crate::config::AnalysisConfig;
use crate::error::AnalystError;
use crate::prompts::ANALYST_PROMPT;
use crate::remote::{GenerationResponse, RemoteFileHandle, RemoteFileService};
use std::time::Instant;
use tracing::{debug, info};

/// Ask the model to analyse `file` and return its raw text.
///
/// An empty or whitespace-only answer is an
/// [`AnalystError::EmptyResponse`].
pub async fn generate_analysis(
    service: &dyn RemoteFileService,
    file: &RemoteFileHandle,
    config: &AnalysisConfig,
) -> Result<GenerationResponse, AnalystError> {
    let prompt = config.prompt.as_deref().unwrap_or(ANALYST_PROMPT);

    if let Some(ref cb) = config.progress_callback {
        cb.on_generate_start(&config.model);
    }

    let start = Instant::now();
    let response = service.generate_content(file, prompt).await?;
    info!(
        "{} answered in {}ms ({} input tokens, {} output tokens)",
        config.model,
        start.elapsed().as_millis(),
        response.prompt_tokens,
        response.output_tokens
    );
    debug!("Finish reason: {:?}", response.finish_reason);

    if response.text.trim().is_empty() {
        return Err(AnalystError::EmptyResponse {
            reason: response.finish_reason,
        });
    }

    Ok(response)
}
