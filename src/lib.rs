//! # edgequake-earnings
//!
//! Summarise a scanned earnings-report PDF into a management-commentary
//! dashboard using Gemini's document understanding.
//!
//! There is no local OCR or parsing: the PDF is uploaded to the Gemini Files
//! API as-is, the model is asked for a fixed set of JSON fields, and the
//! answer is laid out as five tiles (company, sentiment, takeaways,
//! guidance, operations).
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     local file, URL download, or in-memory bytes → temp file
//!  ├─ 2. Upload    Files API, resumable upload, MIME application/pdf
//!  ├─ 3. Poll      re-read file state every second, bounded attempts
//!  ├─ 4. Generate  one generateContent call with the analyst prompt
//!  ├─ 5. Parse     strip ```json fences, parse JSON
//!  └─ 6. Render    five fixed tiles, "N/A" for anything missing
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_earnings::{analyze_file, AnalysisConfig, ApiCredential, DashboardView};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let key = ApiCredential::new(std::env::var("GEMINI_API_KEY")?);
//!     let result = analyze_file("q2-results.pdf", &key, &AnalysisConfig::default()).await?;
//!     print!("{}", DashboardView::from_result(Some(&result)));
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `earnings` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod gemini;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod remote;
pub mod result;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{analyze, analyze_file, analyze_file_sync};
pub use config::{AnalysisConfig, AnalysisConfigBuilder, ApiCredential};
pub use dashboard::{Dashboard, DashboardView, RenderStyle, PLACEHOLDER_MESSAGE};
pub use error::{AnalystError, ErrorStage};
pub use gemini::GeminiClient;
pub use pipeline::upload::PollOutcome;
pub use progress::{AnalysisProgressCallback, NoopProgressCallback, ProgressCallback};
pub use remote::{FileState, GenerationResponse, RemoteFileHandle, RemoteFileService};
pub use result::{AnalysisResult, ListField, Section, TextField, NOT_AVAILABLE};
pub use session::{AnalystSession, ResultSlot};
