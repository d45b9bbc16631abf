//! Configuration types for earnings-report analysis.
//!
//! All pipeline behaviour is controlled through [`AnalysisConfig`], built via
//! its [`AnalysisConfigBuilder`]. The API credential is not part of the
//! config; it is supplied per run as an [`ApiCredential`].

use crate::error::AnalystError;
use crate::progress::ProgressCallback;
use crate::remote::RemoteFileService;
use std::fmt;
use std::sync::Arc;

/// Model used when the caller does not pick one.
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// Root of the Gemini REST API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Configuration for one analysis run.
///
/// Built via [`AnalysisConfig::builder()`] or using
/// [`AnalysisConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_earnings::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .model("gemini-2.5-flash")
///     .poll_interval_ms(500)
///     .max_poll_attempts(60)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_poll_attempts, 60);
/// ```
#[derive(Clone)]
pub struct AnalysisConfig {
    /// Gemini model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// API root, without a trailing slash. Default: [`DEFAULT_BASE_URL`].
    ///
    /// Overridable so the client can be pointed at a proxy or a local stub.
    pub base_url: String,

    /// Delay between two file-state checks, in milliseconds. Default: 1000.
    pub poll_interval_ms: u64,

    /// Maximum number of file-state checks before giving up. Default: 120.
    ///
    /// Together with `poll_interval_ms` this bounds the wait for the remote
    /// side to finish ingesting the PDF (two minutes by default). Small PDFs
    /// are usually ready on the first check.
    pub max_poll_attempts: u32,

    /// Per-request HTTP timeout for upload, poll and generation calls in
    /// seconds. Default: 120.
    ///
    /// Generation over a long scanned report is the slow call; uploads and
    /// polls finish well inside this.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Sampling temperature. `None` leaves the service default in place.
    pub temperature: Option<f32>,

    /// Custom analysis prompt. If None, uses [`crate::prompts::ANALYST_PROMPT`].
    pub prompt: Option<String>,

    /// Pre-constructed remote service. Takes precedence over building a
    /// [`crate::gemini::GeminiClient`] from the credential.
    pub service: Option<Arc<dyn RemoteFileService>>,

    /// Receiver for pipeline progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval_ms: 1000,
            max_poll_attempts: 120,
            api_timeout_secs: 120,
            download_timeout_secs: 120,
            temperature: None,
            prompt: None,
            service: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("max_poll_attempts", &self.max_poll_attempts)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("temperature", &self.temperature)
            .field("prompt", &self.prompt.as_ref().map(|p| p.len()))
            .field("service", &self.service.as_ref().map(|_| "<dyn RemoteFileService>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn AnalysisProgressCallback>"),
            )
            .finish()
    }
}

impl AnalysisConfig {
    /// Create a new builder for `AnalysisConfig`.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder {
            config: Self::default(),
        }
    }

    /// Upper bound on the time spent waiting for the file to become ready.
    pub fn max_poll_wait_ms(&self) -> u64 {
        self.poll_interval_ms
            .saturating_mul(u64::from(self.max_poll_attempts))
    }
}

/// Builder for [`AnalysisConfig`].
#[derive(Debug)]
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms.max(10);
        self
    }

    pub fn max_poll_attempts(mut self, n: u32) -> Self {
        self.config.max_poll_attempts = n.max(1);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.prompt = Some(prompt.into());
        self
    }

    pub fn service(mut self, service: Arc<dyn RemoteFileService>) -> Self {
        self.config.service = Some(service);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalysisConfig, AnalystError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(AnalystError::InvalidConfig("Model name must not be empty".into()));
        }
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(AnalystError::InvalidConfig(format!(
                "Base URL must start with http:// or https://, got '{}'",
                c.base_url
            )));
        }
        if c.api_timeout_secs == 0 {
            return Err(AnalystError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.prompt.as_deref().is_some_and(|p| p.trim().is_empty()) {
            return Err(AnalystError::InvalidConfig("Prompt must not be empty".into()));
        }
        Ok(self.config)
    }
}

// ── Credential ───────────────────────────────────────────────────────────

/// A user-supplied API key.
///
/// The format is never validated locally: a bad key surfaces as an upload
/// error once the service rejects it. `Debug` and `Display` never print the
/// key itself.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiCredential(String);

impl ApiCredential {
    /// Wrap a raw key, trimming surrounding whitespace from copy-paste.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into().trim().to_string())
    }

    /// The raw key, for building request headers.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for ApiCredential {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ApiCredential {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiCredential(<redacted, {} chars>)", self.0.len())
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}
