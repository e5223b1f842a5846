use std::time::Duration;

use async_trait::async_trait;
use conduit_models::config::{ModelConfig, ModelRole};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::ModelError;
use crate::model::{LanguageModel, Prompt};

/// Configuration for a Claude CLI invocation.
#[derive(Debug, Clone)]
pub struct ClaudeCliConfig {
    pub model: String,
    pub timeout: Duration,
}

impl Default for ClaudeCliConfig {
    fn default() -> Self {
        Self {
            model: "claude-3-5-haiku-latest".to_string(),
            timeout: Duration::from_secs(45),
        }
    }
}

/// Invoke the `claude` CLI with a system prompt and user prompt.
/// Returns the raw stdout text.
pub async fn invoke_claude(
    system_prompt: &str,
    user_prompt: &str,
    config: &ClaudeCliConfig,
) -> Result<String, ModelError> {
    debug!(model = %config.model, "Invoking claude CLI");

    let result = tokio::time::timeout(config.timeout, async {
        Command::new("claude")
            .args([
                "-p",
                user_prompt,
                "--system-prompt",
                system_prompt,
                "--model",
                &config.model,
                "--output-format",
                "text",
            ])
            .kill_on_drop(true)
            .output()
            .await
    })
    .await
    .map_err(|_| ModelError::Timeout(config.timeout.as_secs()))?
    .map_err(|e| ModelError::Cli(format!("Failed to spawn claude: {e}")))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        warn!(status = %result.status, stderr = %stderr, "Claude CLI failed");
        return Err(ModelError::Cli(format!(
            "claude exited {}: {}",
            result.status, stderr
        )));
    }

    let stdout = String::from_utf8_lossy(&result.stdout).to_string();
    if stdout.trim().is_empty() {
        return Err(ModelError::Cli("Claude returned empty response".to_string()));
    }

    Ok(stdout)
}

/// Check if the `claude` CLI is available on the system.
pub async fn check_cli_available() -> bool {
    match Command::new("claude").arg("--version").output().await {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}

/// A [`LanguageModel`] backed by the Claude CLI.
pub struct ClaudeCliModel {
    pub cli_config: ClaudeCliConfig,
}

impl ClaudeCliModel {
    pub fn new(model: String, timeout: Duration) -> Self {
        Self {
            cli_config: ClaudeCliConfig { model, timeout },
        }
    }

    /// The model configured for `role`, with the shared per-call timeout.
    pub fn for_role(config: &ModelConfig, role: ModelRole) -> Self {
        Self::new(
            config.model_for(role).to_string(),
            Duration::from_secs(config.timeout_seconds),
        )
    }
}

#[async_trait]
impl LanguageModel for ClaudeCliModel {
    fn name(&self) -> &str {
        &self.cli_config.model
    }

    async fn complete(&self, prompt: &Prompt) -> Result<String, ModelError> {
        invoke_claude(&prompt.system, &prompt.user, &self.cli_config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ClaudeCliConfig::default();
        assert_eq!(config.model, "claude-3-5-haiku-latest");
        assert_eq!(config.timeout, Duration::from_secs(45));
    }

    #[test]
    fn model_per_role() {
        let config = ModelConfig {
            default_model: "claude-sonnet-4-5-20250929".to_string(),
            classifier_model: Some("claude-3-5-haiku-latest".to_string()),
            direct_model: None,
            tool_model: None,
            timeout_seconds: 20,
        };

        let classifier = ClaudeCliModel::for_role(&config, ModelRole::Classifier);
        assert_eq!(classifier.name(), "claude-3-5-haiku-latest");
        assert_eq!(classifier.cli_config.timeout, Duration::from_secs(20));

        let tools = ClaudeCliModel::for_role(&config, ModelRole::Tools);
        assert_eq!(tools.name(), "claude-sonnet-4-5-20250929");
    }
}
