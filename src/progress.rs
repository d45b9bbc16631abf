//! Progress-callback trait for pipeline events.
//!
//! Inject an [`Arc<dyn AnalysisProgressCallback>`] via
//! [`crate::config::AnalysisConfigBuilder::progress_callback`] to be told
//! what the pipeline is doing while the caller is blocked on it. The CLI
//! uses this to drive its spinner; a GUI could disable its "Run" button
//! between `on_upload_start` and `on_analysis_complete`/`on_analysis_error`.
//!
//! # Example
//!
//! ```rust
//! use edgequake_earnings::{AnalysisConfig, AnalysisProgressCallback, FileState};
//! use std::sync::{Arc, atomic::{AtomicU32, Ordering}};
//!
//! struct PollCounter(AtomicU32);
//!
//! impl AnalysisProgressCallback for PollCounter {
//!     fn on_poll(&self, attempt: u32, state: FileState) {
//!         self.0.store(attempt, Ordering::SeqCst);
//!         eprintln!("check #{attempt}: {state}");
//!     }
//! }
//!
//! let config = AnalysisConfig::builder()
//!     .progress_callback(Arc::new(PollCounter(AtomicU32::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use crate::error::ErrorStage;
use crate::remote::FileState;
use std::sync::Arc;

/// Called by the analysis pipeline as it moves through its steps.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Events arrive in order on the task running the
/// analysis; exactly one of `on_analysis_complete` / `on_analysis_error`
/// ends every run that reached `on_upload_start`.
pub trait AnalysisProgressCallback: Send + Sync {
    /// Called before the PDF is sent to the Files API.
    ///
    /// # Arguments
    /// * `bytes`: size of the PDF being uploaded
    fn on_upload_start(&self, bytes: u64) {
        let _ = bytes;
    }

    /// Called once the service has accepted the file.
    ///
    /// # Arguments
    /// * `name`: remote resource name, e.g. `files/abc123`
    fn on_upload_complete(&self, name: &str) {
        let _ = name;
    }

    /// Called after every file-state check.
    ///
    /// # Arguments
    /// * `attempt`: 1-based check number
    /// * `state`  : state reported by the service
    fn on_poll(&self, attempt: u32, state: FileState) {
        let _ = (attempt, state);
    }

    /// Called just before the generation request is sent.
    fn on_generate_start(&self, model: &str) {
        let _ = model;
    }

    /// Called when the response has been parsed into a result.
    fn on_analysis_complete(&self) {}

    /// Called when the run fails.
    ///
    /// # Arguments
    /// * `stage`  : which step failed
    /// * `message`: human-readable error description
    fn on_analysis_error(&self, stage: ErrorStage, message: &str) {
        let _ = (stage, message);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl AnalysisProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::AnalysisConfig`].
pub type ProgressCallback = Arc<dyn AnalysisProgressCallback>;
