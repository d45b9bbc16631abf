//! Gemini REST client: Files API upload/state and `generateContent`.
//!
//! The wire shapes are Gemini's own; nothing here tries to be provider
//! neutral. Uploads use the resumable protocol in its two-request form:
//!
//! ```text
//! POST /upload/v1beta/files          X-Goog-Upload-Command: start
//!   ◀── x-goog-upload-url
//! POST <upload-url>                  X-Goog-Upload-Command: upload, finalize
//!   ◀── { "file": { "name": "files/…", "state": "PROCESSING", … } }
//! GET  /v1beta/files/…               (polled by the pipeline)
//! POST /v1beta/models/{model}:generateContent
//! ```
//!
//! The key travels in the `x-goog-api-key` header, never in a URL, so it
//! cannot leak into logged request lines.

use crate::config::{AnalysisConfig, ApiCredential};
use crate::error::AnalystError;
use crate::remote::{FileState, GenerationResponse, RemoteFileHandle, RemoteFileService};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

const API_KEY_HEADER: &str = "x-goog-api-key";
const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";

/// A configured Gemini client.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    credential: ApiCredential,
    base_url: String,
    model: String,
    temperature: Option<f32>,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl GeminiClient {
    /// Configure a client with the caller's credential.
    ///
    /// The key is not checked here; a bad key is reported by the first
    /// request that uses it.
    pub fn new(credential: ApiCredential, config: &AnalysisConfig) -> Result<Self, AnalystError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| AnalystError::UploadFailed {
                message: format!("could not configure HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            credential,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn files_upload_url(&self) -> String {
        format!("{}/upload/v1beta/files", self.base_url)
    }

    fn file_url(&self, name: &str) -> String {
        format!("{}/v1beta/{}", self.base_url, name)
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl RemoteFileService for GeminiClient {
    async fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: &str,
    ) -> Result<RemoteFileHandle, AnalystError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| AnalystError::StagingFailed { source })?;

        // ── Start the resumable session ─────────────────────────────────
        let start = self
            .http
            .post(self.files_upload_url())
            .header(API_KEY_HEADER, self.credential.expose())
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&StartUploadRequest {
                file: UploadMetadata { display_name },
            })
            .send()
            .await
            .map_err(|e| transport_error("upload", e))?;

        let start = ensure_success(start, upload_failure).await?;
        let upload_url = start
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| AnalystError::UploadFailed {
                message: "Files API did not return an upload URL".into(),
            })?;
        debug!("Resumable upload session opened for {}", display_name);

        // ── Send the bytes and finalize ─────────────────────────────────
        let finish = self
            .http
            .post(&upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()
            .await
            .map_err(|e| transport_error("upload", e))?;

        let finish = ensure_success(finish, upload_failure).await?;
        let body: FileEnvelope = finish.json().await.map_err(|e| AnalystError::UploadFailed {
            message: format!("unexpected upload response: {e}"),
        })?;
        Ok(body.file.into_handle())
    }

    async fn get_file(&self, name: &str) -> Result<RemoteFileHandle, AnalystError> {
        let resp = self
            .http
            .get(self.file_url(name))
            .header(API_KEY_HEADER, self.credential.expose())
            .send()
            .await
            .map_err(|e| transport_error("file state", e))?;

        let resp = ensure_success(resp, upload_failure).await?;
        let file: WireFile = resp.json().await.map_err(|e| AnalystError::UploadFailed {
            message: format!("unexpected file state response: {e}"),
        })?;
        Ok(file.into_handle())
    }

    async fn generate_content(
        &self,
        file: &RemoteFileHandle,
        prompt: &str,
    ) -> Result<GenerationResponse, AnalystError> {
        let request = build_generate_request(file, prompt, self.temperature);
        let resp = self
            .http
            .post(self.generate_url())
            .header(API_KEY_HEADER, self.credential.expose())
            .json(&request)
            .send()
            .await
            .map_err(|e| AnalystError::GenerationFailed {
                message: describe_transport("generateContent", &e),
            })?;

        let resp = ensure_success(resp, generation_failure).await?;
        let body: GenerateResponse =
            resp.json()
                .await
                .map_err(|e| AnalystError::GenerationFailed {
                    message: format!("unexpected generateContent response: {e}"),
                })?;
        Ok(body.into_generation())
    }
}

// ── Error mapping ────────────────────────────────────────────────────────

async fn ensure_success(
    resp: reqwest::Response,
    on_error: fn(StatusCode, &str) -> AnalystError,
) -> Result<reqwest::Response, AnalystError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(on_error(status, &body))
}

/// Map a failed Files API response onto an upload-stage error.
fn upload_failure(status: StatusCode, body: &str) -> AnalystError {
    let detail = api_error_message(status, body);
    if is_auth_failure(status, body) {
        AnalystError::AuthError {
            status: status.as_u16(),
            detail,
        }
    } else {
        AnalystError::UploadFailed {
            message: format!("Files API returned HTTP {}: {}", status.as_u16(), detail),
        }
    }
}

/// Map a failed generateContent response onto an analysis-stage error.
fn generation_failure(status: StatusCode, body: &str) -> AnalystError {
    AnalystError::GenerationFailed {
        message: format!(
            "generateContent returned HTTP {}: {}",
            status.as_u16(),
            api_error_message(status, body)
        ),
    }
}

fn is_auth_failure(status: StatusCode, body: &str) -> bool {
    matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        || (status == StatusCode::BAD_REQUEST && body.contains("API_KEY_INVALID"))
}

/// The `error.message` of a Google API error body, or the raw body.
fn api_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(err) = serde_json::from_str::<ApiErrorEnvelope>(body) {
        if !err.error.message.is_empty() {
            return err.error.message;
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("no response body")
            .to_string()
    } else {
        trimmed.chars().take(300).collect()
    }
}

fn transport_error(what: &str, e: reqwest::Error) -> AnalystError {
    AnalystError::UploadFailed {
        message: describe_transport(what, &e),
    }
}

fn describe_transport(what: &str, e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("{what} request timed out: {e}")
    } else if e.is_connect() {
        format!("could not connect for {what} request: {e}")
    } else {
        format!("{what} request failed: {e}")
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct StartUploadRequest<'a> {
    file: UploadMetadata<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadMetadata<'a> {
    display_name: &'a str,
}

#[derive(Deserialize)]
struct FileEnvelope {
    file: WireFile,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFile {
    name: String,
    #[serde(default)]
    uri: String,
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    state: Option<String>,
}

impl WireFile {
    fn into_handle(self) -> RemoteFileHandle {
        RemoteFileHandle {
            state: FileState::from_wire(self.state.as_deref().unwrap_or_default()),
            name: self.name,
            uri: self.uri,
            mime_type: self.mime_type,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum Part<'a> {
    FileData {
        #[serde(rename = "mimeType")]
        mime_type: &'a str,
        #[serde(rename = "fileUri")]
        file_uri: &'a str,
    },
    Text(&'a str),
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

fn build_generate_request<'a>(
    file: &'a RemoteFileHandle,
    prompt: &'a str,
    temperature: Option<f32>,
) -> GenerateRequest<'a> {
    GenerateRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![
                Part::FileData {
                    mime_type: &file.mime_type,
                    file_uri: &file.uri,
                },
                Part::Text(prompt),
            ],
        }],
        generation_config: temperature.map(|temperature| GenerationConfig { temperature }),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GenerateResponse {
    /// Join the text parts of the first candidate.
    fn into_generation(self) -> GenerationResponse {
        let usage = self.usage_metadata;
        let blocked = self.prompt_feedback.and_then(|f| f.block_reason);
        let first = self.candidates.into_iter().next();

        let (text, finish_reason) = match first {
            Some(c) => {
                let text = c
                    .content
                    .map(|content| {
                        content
                            .parts
                            .into_iter()
                            .filter_map(|p| p.text)
                            .collect::<Vec<_>>()
                            .join("")
                    })
                    .unwrap_or_default();
                (text, c.finish_reason.or(blocked))
            }
            None => (String::new(), blocked),
        };

        GenerationResponse {
            text,
            finish_reason,
            prompt_tokens: usage.as_ref().map_or(0, |u| u.prompt_token_count),
            output_tokens: usage.as_ref().map_or(0, |u| u.candidates_token_count),
        }
    }
}

#[derive(Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::PDF_MIME_TYPE;
    use serde_json::json;

    fn ready_handle() -> RemoteFileHandle {
        RemoteFileHandle {
            name: "files/abc123".into(),
            uri: "https://generativelanguage.googleapis.com/v1beta/files/abc123".into(),
            mime_type: PDF_MIME_TYPE.into(),
            state: FileState::Ready,
        }
    }

    #[test]
    fn urls() {
        let config = AnalysisConfig::builder()
            .base_url("http://localhost:9999")
            .model("gemini-2.5-flash")
            .build()
            .unwrap();
        let client = GeminiClient::new(ApiCredential::new("k"), &config).unwrap();
        assert_eq!(client.files_upload_url(), "http://localhost:9999/upload/v1beta/files");
        assert_eq!(
            client.file_url("files/abc"),
            "http://localhost:9999/v1beta/files/abc"
        );
        assert_eq!(
            client.generate_url(),
            "http://localhost:9999/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn debug_hides_key() {
        let client =
            GeminiClient::new(ApiCredential::new("AIzaTopSecret"), &AnalysisConfig::default())
                .unwrap();
        assert!(!format!("{client:?}").contains("TopSecret"));
    }

    #[test]
    fn generate_request_shape() {
        let handle = ready_handle();
        let req = build_generate_request(&handle, "Analyze this.", None);
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        {"fileData": {
                            "mimeType": "application/pdf",
                            "fileUri": "https://generativelanguage.googleapis.com/v1beta/files/abc123"
                        }},
                        {"text": "Analyze this."}
                    ]
                }]
            })
        );
    }

    #[test]
    fn generate_request_with_temperature() {
        let handle = ready_handle();
        let value = serde_json::to_value(build_generate_request(&handle, "p", Some(0.5))).unwrap();
        assert_eq!(value["generationConfig"]["temperature"], json!(0.5));
    }

    #[test]
    fn upload_response_parses() {
        let body = json!({
            "file": {
                "name": "files/abc123",
                "displayName": "report.pdf",
                "mimeType": "application/pdf",
                "sizeBytes": "1024",
                "uri": "https://generativelanguage.googleapis.com/v1beta/files/abc123",
                "state": "PROCESSING"
            }
        });
        let env: FileEnvelope = serde_json::from_value(body).unwrap();
        let handle = env.file.into_handle();
        assert_eq!(handle.name, "files/abc123");
        assert_eq!(handle.state, FileState::Processing);
        assert_eq!(handle.mime_type, "application/pdf");
    }

    #[test]
    fn file_without_state_is_pending() {
        let file: WireFile = serde_json::from_value(json!({"name": "files/x"})).unwrap();
        assert_eq!(file.into_handle().state, FileState::Pending);
    }

    #[test]
    fn generate_response_joins_parts() {
        let body = json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "```json\n{\"a\":"}, {"text": "1}\n```"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 1200, "candidatesTokenCount": 300}
        });
        let resp: GenerateResponse = serde_json::from_value(body).unwrap();
        let gen = resp.into_generation();
        assert_eq!(gen.text, "```json\n{\"a\":1}\n```");
        assert_eq!(gen.finish_reason.as_deref(), Some("STOP"));
        assert_eq!(gen.prompt_tokens, 1200);
        assert_eq!(gen.output_tokens, 300);
    }

    #[test]
    fn blocked_prompt_has_no_text() {
        let body = json!({"promptFeedback": {"blockReason": "SAFETY"}});
        let resp: GenerateResponse = serde_json::from_value(body).unwrap();
        let gen = resp.into_generation();
        assert!(gen.text.is_empty());
        assert_eq!(gen.finish_reason.as_deref(), Some("SAFETY"));
    }

    #[test]
    fn invalid_key_is_auth_error() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT","details":[{"reason":"API_KEY_INVALID"}]}}"#;
        let err = upload_failure(StatusCode::BAD_REQUEST, body);
        match err {
            AnalystError::AuthError { status, detail } => {
                assert_eq!(status, 400);
                assert!(detail.starts_with("API key not valid"));
            }
            other => panic!("expected AuthError, got {other:?}"),
        }
    }

    #[test]
    fn forbidden_is_auth_error() {
        let err = upload_failure(StatusCode::FORBIDDEN, "");
        assert!(matches!(err, AnalystError::AuthError { status: 403, .. }));
        assert!(err.is_upload_error());
    }

    #[test]
    fn server_error_is_upload_failure() {
        let err = upload_failure(StatusCode::SERVICE_UNAVAILABLE, "overloaded");
        assert!(matches!(err, AnalystError::UploadFailed { ref message } if message.contains("503")));
    }

    #[test]
    fn generation_failure_is_analysis_stage() {
        let err = generation_failure(
            StatusCode::NOT_FOUND,
            r#"{"error":{"code":404,"message":"models/nope is not found"}}"#,
        );
        assert!(err.is_analysis_error());
        assert!(err.to_string().contains("models/nope is not found"));
    }
}
