//! Integration tests that invoke the real Claude CLI.
//!
//! These tests are `#[ignore]` by default. They require:
//! - The `claude` CLI installed and on PATH
//! - Valid Anthropic credentials configured
//!
//! Run explicitly with:
//! ```bash
//! cargo test -p conduit-agents --test cli_integration -- --ignored
//! ```

use std::sync::Arc;
use std::time::Duration;

use conduit_agents::claude_cli::{check_cli_available, invoke_claude, ClaudeCliConfig};
use conduit_agents::{ClaudeCliModel, DecisionClassifier, DirectResponder};
use conduit_models::routing::RoutingDecision;
use conduit_models::Request;

const TEST_MODEL: &str = "claude-3-5-haiku-latest";

fn model() -> Arc<ClaudeCliModel> {
    Arc::new(ClaudeCliModel::new(
        TEST_MODEL.to_string(),
        Duration::from_secs(60),
    ))
}

/// Verify the Claude CLI is installed and responds to --version.
#[tokio::test]
#[ignore]
async fn cli_is_available() {
    assert!(
        check_cli_available().await,
        "claude CLI not found on PATH"
    );
}

/// A reminder needs no search; a live price does.
#[tokio::test]
#[ignore]
async fn classifier_routes_obvious_requests() {
    if !check_cli_available().await {
        eprintln!("Skipping: claude CLI not available");
        return;
    }

    let classifier = DecisionClassifier::new(model());

    let reminder = Request::new("Remind me to drink water").unwrap();
    assert_eq!(
        classifier.classify(&reminder).await.unwrap(),
        RoutingDecision::Direct
    );

    let price = Request::new("What is the current price of bitcoin in dollars?").unwrap();
    assert_eq!(
        classifier.classify(&price).await.unwrap(),
        RoutingDecision::NeedsTools
    );
}

#[tokio::test]
#[ignore]
async fn direct_responder_returns_text() {
    if !check_cli_available().await {
        eprintln!("Skipping: claude CLI not available");
        return;
    }

    let answer = DirectResponder::new(model())
        .respond_direct(&Request::new("Remind me to exercise").unwrap())
        .await
        .expect("direct responder failed");

    assert!(!answer.text.is_empty());
    assert_eq!(answer.route, RoutingDecision::Direct);
}

/// The CLI should exit non-zero for an unknown model, and we should surface it.
#[tokio::test]
#[ignore]
async fn cli_reports_errors_for_invalid_model() {
    if !check_cli_available().await {
        eprintln!("Skipping: claude CLI not available");
        return;
    }

    let config = ClaudeCliConfig {
        model: "nonexistent-model-12345".to_string(),
        timeout: Duration::from_secs(15),
    };

    let result = invoke_claude("You are a test.", "hello", &config).await;
    assert!(result.is_err(), "Expected error for invalid model, got: {result:?}");
}
