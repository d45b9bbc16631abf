//! Upload the staged PDF and wait for the service to finish ingesting it.
//!
//! Ingestion is asynchronous on the remote side: the upload call returns a
//! handle whose state is usually `PROCESSING`. [`poll_until_ready`] re-reads
//! the state at a fixed interval with a hard cap on the number of checks, so
//! a stuck file ends the run with [`PollOutcome::TimedOut`] instead of
//! hanging the caller.

use crate::config::AnalysisConfig;
use crate::error::AnalystError;
use crate::pipeline::input::ResolvedInput;
use crate::remote::{FileState, RemoteFileHandle, RemoteFileService, PDF_MIME_TYPE};
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

/// How the wait for a file ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The file can be used in a generation call.
    Ready(RemoteFileHandle),
    /// The attempt budget ran out while the file was still processing.
    TimedOut {
        handle: RemoteFileHandle,
        attempts: u32,
        waited_ms: u64,
    },
    /// The service reported the file as failed.
    Failed(RemoteFileHandle),
}

impl PollOutcome {
    /// Turn a non-ready outcome into the matching upload error.
    pub fn into_ready(self) -> Result<RemoteFileHandle, AnalystError> {
        match self {
            PollOutcome::Ready(handle) => Ok(handle),
            PollOutcome::TimedOut {
                handle,
                attempts,
                waited_ms,
            } => Err(AnalystError::ProcessingTimedOut {
                name: handle.name,
                attempts,
                waited_ms,
            }),
            PollOutcome::Failed(handle) => {
                Err(AnalystError::FileProcessingFailed { name: handle.name })
            }
        }
    }
}

/// Upload the resolved PDF and wait until it is ready.
pub async fn upload_and_wait(
    service: &dyn RemoteFileService,
    input: &ResolvedInput,
    config: &AnalysisConfig,
) -> Result<RemoteFileHandle, AnalystError> {
    let path = input.path();
    let size = tokio::fs::metadata(path)
        .await
        .map(|m| m.len())
        .map_err(|source| AnalystError::StagingFailed { source })?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_upload_start(size);
    }

    let start = Instant::now();
    let handle = service
        .upload_file(path, PDF_MIME_TYPE, &input.display_name())
        .await?;
    info!(
        "Uploaded {} ({} bytes) as {} in {}ms",
        input.display_name(),
        size,
        handle.name,
        start.elapsed().as_millis()
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_upload_complete(&handle.name);
    }

    poll_until_ready(service, handle, config).await?.into_ready()
}

/// Re-read the file state until it leaves `Pending`/`Processing`, or until
/// `config.max_poll_attempts` checks have been made.
///
/// The handle returned by the upload counts as the first observation: a
/// file that is already `Ready` costs no extra request. Errors from the
/// state call itself are returned as-is; they are not retried.
pub async fn poll_until_ready(
    service: &dyn RemoteFileService,
    initial: RemoteFileHandle,
    config: &AnalysisConfig,
) -> Result<PollOutcome, AnalystError> {
    let start = Instant::now();
    let interval = Duration::from_millis(config.poll_interval_ms);
    let mut handle = initial;
    let mut attempts = 0u32;

    loop {
        match handle.state {
            FileState::Ready => {
                debug!("{} ready after {} checks", handle.name, attempts);
                return Ok(PollOutcome::Ready(handle));
            }
            FileState::Failed => {
                warn!("{} failed remote processing", handle.name);
                return Ok(PollOutcome::Failed(handle));
            }
            FileState::Pending | FileState::Processing => {}
        }

        if attempts >= config.max_poll_attempts {
            let waited_ms = start.elapsed().as_millis() as u64;
            warn!(
                "{} still {} after {} checks ({}ms)",
                handle.name, handle.state, attempts, waited_ms
            );
            return Ok(PollOutcome::TimedOut {
                handle,
                attempts,
                waited_ms,
            });
        }

        sleep(interval).await;
        attempts += 1;
        handle = service.get_file(&handle.name).await?;
        debug!("{}: check {} → {}", handle.name, attempts, handle.state);

        if let Some(ref cb) = config.progress_callback {
            cb.on_poll(attempts, handle.state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::GenerationResponse;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Mutex;

    /// Replays a fixed sequence of states from `get_file`.
    struct ScriptedStates {
        states: Mutex<Vec<FileState>>,
        calls: Mutex<u32>,
    }

    impl ScriptedStates {
        fn new(mut states: Vec<FileState>) -> Self {
            states.reverse();
            Self {
                states: Mutex::new(states),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl RemoteFileService for ScriptedStates {
        async fn upload_file(
            &self,
            _path: &Path,
            _mime_type: &str,
            _display_name: &str,
        ) -> Result<RemoteFileHandle, AnalystError> {
            unreachable!("poll tests never upload")
        }

        async fn get_file(&self, name: &str) -> Result<RemoteFileHandle, AnalystError> {
            *self.calls.lock().unwrap() += 1;
            let state = self
                .states
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(FileState::Processing);
            Ok(handle(name, state))
        }

        async fn generate_content(
            &self,
            _file: &RemoteFileHandle,
            _prompt: &str,
        ) -> Result<GenerationResponse, AnalystError> {
            unreachable!("poll tests never generate")
        }
    }

    fn handle(name: &str, state: FileState) -> RemoteFileHandle {
        RemoteFileHandle {
            name: name.to_string(),
            uri: format!("https://files.example/{name}"),
            mime_type: PDF_MIME_TYPE.to_string(),
            state,
        }
    }

    fn fast_config(max_attempts: u32) -> AnalysisConfig {
        AnalysisConfig::builder()
            .poll_interval_ms(10)
            .max_poll_attempts(max_attempts)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn already_ready_needs_no_poll() {
        let svc = ScriptedStates::new(vec![]);
        let out = poll_until_ready(&svc, handle("files/a", FileState::Ready), &fast_config(3))
            .await
            .unwrap();
        assert!(matches!(out, PollOutcome::Ready(_)));
        assert_eq!(svc.calls(), 0);
    }

    #[tokio::test]
    async fn becomes_ready_after_processing() {
        let svc = ScriptedStates::new(vec![FileState::Processing, FileState::Ready]);
        let out = poll_until_ready(
            &svc,
            handle("files/b", FileState::Processing),
            &fast_config(5),
        )
        .await
        .unwrap();
        assert!(matches!(out, PollOutcome::Ready(ref h) if h.name == "files/b"));
        assert_eq!(svc.calls(), 2);
    }

    #[tokio::test]
    async fn failed_state_stops_polling() {
        let svc = ScriptedStates::new(vec![FileState::Failed]);
        let out = poll_until_ready(
            &svc,
            handle("files/c", FileState::Processing),
            &fast_config(5),
        )
        .await
        .unwrap();
        assert!(matches!(out, PollOutcome::Failed(_)));
        let err = out.into_ready().unwrap_err();
        assert!(err.is_upload_error());
    }

    #[tokio::test]
    async fn attempt_budget_is_enforced() {
        let svc = ScriptedStates::new(vec![]);
        let out = poll_until_ready(
            &svc,
            handle("files/d", FileState::Processing),
            &fast_config(3),
        )
        .await
        .unwrap();
        match out {
            PollOutcome::TimedOut { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("expected TimedOut, got {other:?}"),
        }
        assert_eq!(svc.calls(), 3);
    }

    #[tokio::test]
    async fn pending_keeps_waiting() {
        let svc = ScriptedStates::new(vec![FileState::Pending, FileState::Ready]);
        let out = poll_until_ready(&svc, handle("files/e", FileState::Pending), &fast_config(5))
            .await
            .unwrap();
        assert!(matches!(out, PollOutcome::Ready(_)));
    }
}
