//! Session state: the credential, the config, and the last result.
//!
//! An [`AnalystSession`] is what an interactive front end holds between user
//! actions. It owns a [`ResultSlot`] with room for exactly one
//! [`AnalysisResult`]:
//!
//! * a successful run replaces the slot's content wholesale;
//! * a failed run leaves it as it was and hands the error back.
//!
//! `run_*` methods take `&mut self`, so a session cannot start a second run
//! while one is in flight. Nothing in a session is ever written to disk.

use crate::analyze::{analyze, analyze_file};
use crate::config::{AnalysisConfig, ApiCredential};
use crate::dashboard::DashboardView;
use crate::error::AnalystError;
use crate::result::AnalysisResult;
use tracing::debug;

/// Single-slot store for the most recent successful result.
#[derive(Debug, Clone, Default)]
pub struct ResultSlot {
    current: Option<AnalysisResult>,
}

impl ResultSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&AnalysisResult> {
        self.current.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    /// Put `result` in the slot, returning what was there before.
    pub fn replace(&mut self, result: AnalysisResult) -> Option<AnalysisResult> {
        self.current.replace(result)
    }

    /// Apply the outcome of a run: store on success, keep the old content on
    /// error.
    pub fn apply(
        &mut self,
        outcome: Result<AnalysisResult, AnalystError>,
    ) -> Result<&AnalysisResult, AnalystError> {
        let stored: &AnalysisResult = self.current.insert(outcome?);
        Ok(stored)
    }
}

/// One user's working session.
#[derive(Debug)]
pub struct AnalystSession {
    credential: ApiCredential,
    config: AnalysisConfig,
    slot: ResultSlot,
}

impl AnalystSession {
    pub fn new(credential: ApiCredential, config: AnalysisConfig) -> Self {
        Self {
            credential,
            config,
            slot: ResultSlot::new(),
        }
    }

    /// Swap in a different key for subsequent runs.
    pub fn set_credential(&mut self, credential: ApiCredential) {
        self.credential = credential;
    }

    pub fn has_credential(&self) -> bool {
        !self.credential.is_empty()
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.slot.get()
    }

    /// The dashboard for whatever the slot currently holds.
    pub fn dashboard(&self) -> DashboardView {
        DashboardView::from_result(self.slot.get())
    }

    /// Analyse a local path or URL.
    pub async fn run_file(&mut self, input: &str) -> Result<&AnalysisResult, AnalystError> {
        self.ensure_credential()?;
        let outcome = analyze_file(input, &self.credential, &self.config).await;
        debug!("Run on {} finished: ok={}", input, outcome.is_ok());
        self.slot.apply(outcome)
    }

    /// Analyse a PDF held in memory.
    pub async fn run_bytes(&mut self, pdf_bytes: &[u8]) -> Result<&AnalysisResult, AnalystError> {
        self.ensure_credential()?;
        let outcome = analyze(pdf_bytes, &self.credential, &self.config).await;
        self.slot.apply(outcome)
    }

    /// Show a fixed demo result without calling the service.
    pub fn load_sample(&mut self) -> &AnalysisResult {
        self.slot.current.insert(AnalysisResult::sample())
    }

    fn ensure_credential(&self) -> Result<(), AnalystError> {
        if self.config.service.is_none() && self.credential.is_empty() {
            return Err(AnalystError::MissingCredential);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::TextField;
    use serde_json::json;

    fn result(company: &str) -> AnalysisResult {
        AnalysisResult::from_value(json!({"Meta": {"Company Name": company}}))
    }

    #[test]
    fn slot_replaces_on_success() {
        let mut slot = ResultSlot::new();
        assert!(slot.is_empty());
        slot.apply(Ok(result("First"))).unwrap();
        slot.apply(Ok(result("Second"))).unwrap();
        assert_eq!(slot.get().unwrap().text(TextField::CompanyName), "Second");
    }

    #[test]
    fn slot_keeps_previous_on_error() {
        let mut slot = ResultSlot::new();
        slot.apply(Ok(result("Kept"))).unwrap();
        let err = slot
            .apply(Err(AnalystError::GenerationFailed {
                message: "boom".into(),
            }))
            .unwrap_err();
        assert!(err.is_analysis_error());
        assert_eq!(slot.get().unwrap().text(TextField::CompanyName), "Kept");
    }

    #[test]
    fn replace_does_not_merge() {
        let mut slot = ResultSlot::new();
        slot.replace(AnalysisResult::from_value(json!({
            "Meta": {"Company Name": "Old"},
            "Guidance": {"Revenue": "Up"}
        })));
        let previous = slot.replace(result("New"));
        assert!(previous.is_some());
        let now = slot.get().unwrap();
        assert_eq!(now.text(TextField::CompanyName), "New");
        assert_eq!(now.text(TextField::Revenue), "N/A");
    }

    #[tokio::test]
    async fn missing_credential_is_rejected_before_any_work() {
        let mut session = AnalystSession::new(ApiCredential::new(""), AnalysisConfig::default());
        assert!(!session.has_credential());
        let err = session.run_bytes(b"%PDF-1.4").await.unwrap_err();
        assert!(matches!(err, AnalystError::MissingCredential));
        assert!(session.result().is_none());
        assert_eq!(session.dashboard(), DashboardView::Placeholder);
    }

    #[test]
    fn sample_fills_the_dashboard() {
        let mut session = AnalystSession::new(ApiCredential::new(""), AnalysisConfig::default());
        session.load_sample();
        assert!(session.dashboard().tiles().is_some());
    }
}
