//! Conduit - Conditional tool-augmented responder
//!
//! Classifies each request, then answers it either directly with one model
//! call or through a bounded ReAct loop over configured capabilities.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use conduit::models::{ConduitConfig, Request};
//! use conduit::agents::Orchestrator;
//! use conduit::tools::{Capability, CapabilitySet};
//! ```

pub use conduit_agents as agents;
pub use conduit_models as models;
pub use conduit_tools as tools;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use conduit_agents::{AgentError, ClaudeCliModel, LanguageModel, Orchestrator};
use conduit_models::config::{ConduitConfig, ModelRole};
use conduit_models::{FinalAnswer, Request};
use conduit_tools::build_capability_set;
use tracing::info;

/// Read and parse a TOML configuration file.
pub fn load_config(path: impl AsRef<Path>) -> anyhow::Result<ConduitConfig> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("Failed to parse config: {}", path.display()))
}

/// Build an Orchestrator backed by the Claude CLI from configuration.
pub fn build_orchestrator(config: &ConduitConfig) -> anyhow::Result<Orchestrator> {
    let capabilities =
        build_capability_set(&config.tools).context("Failed to build capability set")?;
    info!(
        tools = ?capabilities.names(),
        max_iterations = config.responder.max_iterations.get(),
        "Capabilities registered"
    );

    let model = |role| Arc::new(ClaudeCliModel::for_role(&config.model, role)) as Arc<dyn LanguageModel>;

    Ok(Orchestrator::from_models(
        model(ModelRole::Classifier),
        model(ModelRole::Direct),
        model(ModelRole::Tools),
        capabilities,
        config.responder.clone(),
    ))
}

/// Answer one request with the given orchestrator.
pub async fn answer(orchestrator: &Orchestrator, request: &Request) -> Result<FinalAnswer, AgentError> {
    orchestrator.handle(request).await
}

/// Machine-readable description of a failed request.
///
/// An exhausted tool loop includes its partial transcript so a person can see
/// how far the model got.
pub fn failure_report(request: &Request, error: &AgentError) -> serde_json::Value {
    let mut report = serde_json::json!({
        "request_id": request.id,
        "kind": error.kind(),
        "error": error.to_string(),
    });
    if let AgentError::ToolLoopExhausted { iterations, transcript } = error {
        report["iterations"] = serde_json::json!(iterations);
        report["transcript"] = serde_json::to_value(transcript).unwrap_or_default();
    }
    report
}
