//! Error types for the edgequake-earnings library.
//!
//! Every failure is an [`AnalystError`]. A run either produces a complete
//! [`crate::result::AnalysisResult`] or one of these errors; there is no
//! partial result.
//!
//! Variants are grouped by the pipeline stage that produced them, exposed
//! through [`AnalystError::stage`]:
//!
//! * [`ErrorStage::Input`]: the PDF or the credential could not even be
//!   handed to the pipeline (missing file, not a PDF, empty key).
//! * [`ErrorStage::Upload`]: the file never became usable on the remote
//!   side (rejected upload, bad key, processing failed or timed out). No
//!   generation call is made after an upload error.
//! * [`ErrorStage::Analysis`]: the generation call failed or its text could
//!   not be parsed as a JSON object.
//!
//! Transient (network) and permanent (bad credential) failures are not
//! distinguished: both end the run with a message for the user.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the edgequake-earnings library.
#[derive(Debug, Error)]
pub enum AnalystError {
    // ── Input: nothing was sent yet ───────────────────────────────────────
    #[error("Report not found: '{path}'\nCheck the path and try again.")]
    FileNotFound { path: PathBuf },

    #[error("Cannot read report '{path}': permission denied")]
    PermissionDenied { path: PathBuf },

    /// Neither a usable path nor an http(s) URL.
    #[error("'{input}' is neither a report path nor an http(s) URL")]
    InvalidInput { input: String },

    #[error("Could not fetch report from '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    #[error("Fetching '{url}' took longer than {secs}s\nRaise --download-timeout for large reports.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The first bytes are not `%PDF`.
    #[error("'{path}' does not look like a PDF (starts with {magic:?})")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// No API credential was supplied.
    #[error("Please enter an API key.\nPass --api-key or set GEMINI_API_KEY.")]
    MissingCredential,

    #[error("Configuration rejected: {0}")]
    InvalidConfig(String),

    // ── Upload errors ─────────────────────────────────────────────────────
    /// The PDF bytes could not be written to the local staging file.
    #[error("Upload Error: could not stage PDF for upload: {source}")]
    StagingFailed {
        #[source]
        source: std::io::Error,
    },

    /// The Files API rejected the upload or could not be reached.
    #[error("Upload Error: {message}")]
    UploadFailed { message: String },

    /// The service refused the credential (HTTP 401/403, or 400 with an
    /// invalid-key payload).
    #[error("Upload Error: credential rejected (HTTP {status}): {detail}")]
    AuthError { status: u16, detail: String },

    /// The uploaded file reached the FAILED state.
    #[error("Upload Error: remote processing failed for file '{name}'")]
    FileProcessingFailed { name: String },

    /// The uploaded file was still processing when the poll budget ran out.
    #[error(
        "Upload Error: file '{name}' still processing after {attempts} checks ({waited_ms}ms)\n\
Increase --max-poll-attempts or --poll-interval-ms."
    )]
    ProcessingTimedOut {
        name: String,
        attempts: u32,
        waited_ms: u64,
    },

    // ── Analysis errors ───────────────────────────────────────────────────
    /// The generateContent call failed.
    #[error("Analysis Error: {message}")]
    GenerationFailed { message: String },

    /// The model answered without any text part (blocked or empty candidate).
    #[error("Analysis Error: model returned no text{}", reason_suffix(.reason))]
    EmptyResponse { reason: Option<String> },

    /// The response text held no JSON object after fence stripping.
    #[error("Analysis Error: response is not a JSON object: {detail}\nResponse began with: {excerpt:?}")]
    MalformedJson { detail: String, excerpt: String },

    /// The run could not be started at all (e.g. no async runtime). Counted
    /// as an upload failure: nothing reached the model.
    #[error("Unexpected failure: {0}")]
    Internal(String),
}

fn reason_suffix(reason: &Option<String>) -> String {
    match reason {
        Some(r) => format!(" (finish reason: {r})"),
        None => String::new(),
    }
}

/// The pipeline stage an [`AnalystError`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStage {
    /// The PDF or credential was rejected before any remote call.
    Input,
    /// Configuring the client, uploading, or waiting for the file failed.
    Upload,
    /// Generation or JSON parsing failed.
    Analysis,
}

impl fmt::Display for ErrorStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorStage::Input => "input",
            ErrorStage::Upload => "upload",
            ErrorStage::Analysis => "analysis",
        })
    }
}

impl AnalystError {
    /// Which pipeline stage produced this error.
    pub fn stage(&self) -> ErrorStage {
        match self {
            AnalystError::FileNotFound { .. }
            | AnalystError::PermissionDenied { .. }
            | AnalystError::InvalidInput { .. }
            | AnalystError::DownloadFailed { .. }
            | AnalystError::DownloadTimeout { .. }
            | AnalystError::NotAPdf { .. }
            | AnalystError::MissingCredential
            | AnalystError::InvalidConfig(_) => ErrorStage::Input,

            AnalystError::StagingFailed { .. }
            | AnalystError::UploadFailed { .. }
            | AnalystError::AuthError { .. }
            | AnalystError::FileProcessingFailed { .. }
            | AnalystError::ProcessingTimedOut { .. }
            | AnalystError::Internal(_) => ErrorStage::Upload,

            AnalystError::GenerationFailed { .. }
            | AnalystError::EmptyResponse { .. }
            | AnalystError::MalformedJson { .. } => ErrorStage::Analysis,
        }
    }

    /// `true` for errors raised while uploading or waiting on the file.
    pub fn is_upload_error(&self) -> bool {
        self.stage() == ErrorStage::Upload
    }

    /// `true` for errors raised by the generation call or JSON parsing.
    pub fn is_analysis_error(&self) -> bool {
        self.stage() == ErrorStage::Analysis
    }
}
