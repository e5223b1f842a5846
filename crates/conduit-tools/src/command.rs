use std::time::Duration;

use async_trait::async_trait;
use conduit_models::config::CommandToolConfig;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::capability::Capability;
use crate::error::CapabilityError;

/// Runs an external program as a tool. The tool argument is appended as the
/// last command-line argument and stdout is returned as the observation.
///
/// This is how a web-search backend is plugged in, e.g. `ddgr --json -n 5`.
#[derive(Debug, Clone)]
pub struct CommandCapability {
    name: String,
    description: String,
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandCapability {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        program: impl Into<String>,
        args: Vec<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            program: program.into(),
            args,
            timeout,
        }
    }

    pub fn from_config(config: &CommandToolConfig) -> Self {
        Self::new(
            config.name.clone(),
            config.description.clone(),
            config.program.clone(),
            config.args.clone(),
            Duration::from_secs(config.timeout_seconds),
        )
    }
}

#[async_trait]
impl Capability for CommandCapability {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn invoke(&self, argument: &str) -> Result<String, CapabilityError> {
        debug!(tool = %self.name, program = %self.program, "Running command tool");

        let result = tokio::time::timeout(self.timeout, async {
            Command::new(&self.program)
                .args(&self.args)
                .arg(argument.trim())
                .kill_on_drop(true)
                .output()
                .await
        })
        .await
        .map_err(|_| CapabilityError::Timeout {
            tool: self.name.clone(),
            seconds: self.timeout.as_secs(),
        })?
        .map_err(|e| CapabilityError::Execution(format!("Failed to spawn {}: {e}", self.program)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            warn!(tool = %self.name, status = %result.status, stderr = %stderr, "Command tool failed");
            return Err(CapabilityError::Execution(format!(
                "{} exited {}: {}",
                self.program,
                result.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&result.stdout).trim().to_string();
        if stdout.is_empty() {
            return Ok("(no output)".to_string());
        }
        Ok(stdout)
    }
}
