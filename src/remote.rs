//! The remote analysis service boundary.
//!
//! [`RemoteFileService`] names the three calls the pipeline makes: upload a
//! file, re-read its state, and generate content against it. The production
//! implementation is [`crate::gemini::GeminiClient`]; the trait exists so the
//! pipeline can be driven by a test double that counts calls.

use crate::error::AnalystError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// MIME type declared for every upload.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Processing state of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileState {
    /// State not reported yet.
    Pending,
    /// The service is still ingesting the file.
    Processing,
    /// The file can be referenced in a generation call.
    Ready,
    /// Ingestion failed; the file is unusable.
    Failed,
}

impl FileState {
    /// Map a Gemini `File.state` string onto a [`FileState`].
    ///
    /// Unknown values are treated as [`FileState::Pending`].
    pub fn from_wire(state: &str) -> Self {
        match state {
            "PROCESSING" => FileState::Processing,
            "ACTIVE" => FileState::Ready,
            "FAILED" => FileState::Failed,
            _ => FileState::Pending,
        }
    }

    /// `true` while the pipeline should keep polling.
    pub fn is_waiting(self) -> bool {
        matches!(self, FileState::Pending | FileState::Processing)
    }
}

impl fmt::Display for FileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileState::Pending => "pending",
            FileState::Processing => "processing",
            FileState::Ready => "ready",
            FileState::Failed => "failed",
        })
    }
}

/// Identifier and state of a file held by the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFileHandle {
    /// Resource name, e.g. `files/abc123`. Used to re-read the state.
    pub name: String,
    /// URI passed to the generation call.
    pub uri: String,
    pub mime_type: String,
    pub state: FileState,
}

/// Text returned by a generation call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationResponse {
    /// Concatenated text parts of the first candidate.
    pub text: String,
    /// Why generation stopped, when the service says so (`STOP`, `SAFETY`, …).
    pub finish_reason: Option<String>,
    pub prompt_tokens: u32,
    pub output_tokens: u32,
}

/// The calls the pipeline makes against the remote analysis service.
#[async_trait]
pub trait RemoteFileService: Send + Sync {
    /// Upload the file at `path`, declaring `mime_type`.
    ///
    /// Errors are upload-stage errors.
    async fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: &str,
    ) -> Result<RemoteFileHandle, AnalystError>;

    /// Re-read the state of a previously uploaded file.
    async fn get_file(&self, name: &str) -> Result<RemoteFileHandle, AnalystError>;

    /// Run the model against `file` with the given instruction prompt.
    ///
    /// Errors are analysis-stage errors.
    async fn generate_content(
        &self,
        file: &RemoteFileHandle,
        prompt: &str,
    ) -> Result<GenerationResponse, AnalystError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_states() {
        assert_eq!(FileState::from_wire("PROCESSING"), FileState::Processing);
        assert_eq!(FileState::from_wire("ACTIVE"), FileState::Ready);
        assert_eq!(FileState::from_wire("FAILED"), FileState::Failed);
        assert_eq!(FileState::from_wire("STATE_UNSPECIFIED"), FileState::Pending);
        assert_eq!(FileState::from_wire(""), FileState::Pending);
    }

    #[test]
    fn waiting_states() {
        assert!(FileState::Pending.is_waiting());
        assert!(FileState::Processing.is_waiting());
        assert!(!FileState::Ready.is_waiting());
        assert!(!FileState::Failed.is_waiting());
    }
}
