use conduit_models::reasoning::Transcript;
use conduit_tools::CapabilityError;
use thiserror::Error;

/// Failures of a single language model call.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Claude CLI error: {0}")]
    Cli(String),

    #[error("Model response parse error: {0}")]
    Parse(String),

    #[error("Model output outside schema: {0}")]
    Schema(String),

    #[error("Model call timed out after {0} seconds")]
    Timeout(u64),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Request-level failures surfaced by the orchestrator.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Classification failed: {0}")]
    Classification(#[source] ModelError),

    #[error("Responder failed: {0}")]
    Responder(#[source] ModelError),

    #[error("Tool '{tool}' failed: {source}")]
    ToolInvocation {
        tool: String,
        #[source]
        source: CapabilityError,
    },

    #[error("No final answer after {iterations} iterations")]
    ToolLoopExhausted {
        iterations: usize,
        transcript: Transcript,
    },
}

impl AgentError {
    /// Only an exhausted tool loop is worth retrying with a fresh request.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AgentError::ToolLoopExhausted { .. })
    }

    /// Partial transcript of an exhausted tool loop.
    pub fn transcript(&self) -> Option<&Transcript> {
        match self {
            AgentError::ToolLoopExhausted { transcript, .. } => Some(transcript),
            _ => None,
        }
    }

    /// Stable short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AgentError::Classification(_) => "classification",
            AgentError::Responder(_) => "responder",
            AgentError::ToolInvocation { .. } => "tool_invocation",
            AgentError::ToolLoopExhausted { .. } => "tool_loop_exhausted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_exhaustion_is_recoverable() {
        let exhausted = AgentError::ToolLoopExhausted {
            iterations: 3,
            transcript: Transcript::new(),
        };
        assert!(exhausted.is_recoverable());
        assert!(exhausted.transcript().is_some());
        assert_eq!(exhausted.to_string(), "No final answer after 3 iterations");

        let classification = AgentError::Classification(ModelError::Timeout(45));
        assert!(!classification.is_recoverable());
        assert!(classification.transcript().is_none());
        assert_eq!(classification.kind(), "classification");
    }

    #[test]
    fn tool_error_message_names_tool() {
        let err = AgentError::ToolInvocation {
            tool: "search_tool".to_string(),
            source: CapabilityError::Execution("boom".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Tool 'search_tool' failed: Execution failed: boom"
        );
    }
}
