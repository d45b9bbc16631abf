//! End-to-end tests against the live Gemini API.
//!
//! These tests need a real key and a scanned earnings report in
//! `./test_cases/`. They are gated behind the `E2E_ENABLED` environment
//! variable so they do not run in CI unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 GEMINI_API_KEY=... cargo test --test e2e -- --nocapture
//!
//! Use a different report with `EARNINGS_E2E_PDF=/path/to/report.pdf`.

use edgequake_earnings::{
    analyze, analyze_file, analyze_file_sync, AnalysisConfig, AnalystError, AnalystSession,
    ApiCredential, DashboardView, ErrorStage, RenderStyle, TextField, NOT_AVAILABLE,
};
use std::path::PathBuf;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn sample_report() -> PathBuf {
    std::env::var("EARNINGS_E2E_PDF")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases/earnings_report.pdf")
        })
}

/// Route library logs to the test output; `RUST_LOG` overrides the level.
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("edgequake_earnings=debug")),
        )
        .with_test_writer()
        .try_init();
}

fn live_config() -> AnalysisConfig {
    let mut builder = AnalysisConfig::builder();
    if let Ok(model) = std::env::var("EARNINGS_MODEL") {
        builder = builder.model(model);
    }
    builder.build().expect("valid config")
}

/// Skip unless E2E_ENABLED and GEMINI_API_KEY are set; yields the key.
macro_rules! e2e_skip_unless_keyed {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        init_logging();
        match std::env::var("GEMINI_API_KEY") {
            Ok(k) if !k.trim().is_empty() => ApiCredential::new(k),
            _ => {
                println!("SKIP: GEMINI_API_KEY is not set");
                return;
            }
        }
    }};
}

/// As above, and also require the sample report to exist.
macro_rules! e2e_skip_unless_ready {
    () => {{
        let key = e2e_skip_unless_keyed!();
        let p = sample_report();
        if !p.exists() {
            println!("SKIP: test file not found: {}", p.display());
            println!("       Set EARNINGS_E2E_PDF or copy a report there.");
            return;
        }
        (key, p)
    }};
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// A real report should at least yield a company name and a tone.
#[tokio::test]
async fn test_analyze_sample_report() {
    let (key, path) = e2e_skip_unless_ready!();

    let result = analyze_file(path.to_str().unwrap(), &key, &live_config())
        .await
        .expect("analysis should succeed");

    assert_ne!(result.text(TextField::CompanyName), NOT_AVAILABLE);
    assert_ne!(result.text(TextField::Tone), NOT_AVAILABLE);

    let rendered = DashboardView::from_result(Some(&result)).render(RenderStyle::default());
    println!("--- BEGIN DASHBOARD ---\n{rendered}--- END DASHBOARD ---");
}

/// Same report via the in-memory entry point.
#[tokio::test]
async fn test_analyze_bytes() {
    let (key, path) = e2e_skip_unless_ready!();
    let bytes = std::fs::read(&path).expect("readable report");

    let result = analyze(&bytes, &key, &live_config())
        .await
        .expect("analysis should succeed");
    assert!(result.raw().is_object(), "top level should be a JSON object");
}

/// A key the service does not recognise fails at upload, not analysis.
#[tokio::test]
async fn test_invalid_key_is_upload_error() {
    let _ = e2e_skip_unless_keyed!();

    let mut session = AnalystSession::new(
        ApiCredential::new("definitely-not-a-valid-key"),
        live_config(),
    );
    let err = session
        .run_bytes(b"%PDF-1.4\n%%EOF\n")
        .await
        .expect_err("bogus key must be rejected");
    assert_eq!(err.stage(), ErrorStage::Upload, "got: {err}");
    assert!(session.result().is_none());
}

#[test]
fn test_sync_wrapper_reports_missing_file() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
        return;
    }
    let err = analyze_file_sync(
        "/nonexistent/report.pdf",
        &ApiCredential::new("unused"),
        &AnalysisConfig::default(),
    )
    .expect_err("missing file");
    assert!(matches!(err, AnalystError::FileNotFound { .. }));
}

/// An empty key never reaches the network.
#[test]
fn test_empty_key_rejected_without_network() {
    let mut session = AnalystSession::new(ApiCredential::new("   "), AnalysisConfig::default());
    let err = tokio_test::block_on(session.run_bytes(b"%PDF-1.4")).unwrap_err();
    assert!(matches!(err, AnalystError::MissingCredential));
    assert_eq!(err.stage(), ErrorStage::Input);
}
