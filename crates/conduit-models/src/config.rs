use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

/// Top-level configuration for Conduit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConduitConfig {
    #[serde(default)]
    pub model: ModelConfig,
    pub responder: ResponderConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// Which component a model call is made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelRole {
    Classifier,
    Direct,
    Tools,
}

/// Configuration for the language model backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    /// Model used by every component unless overridden below.
    pub default_model: String,
    /// Override for the decision classifier.
    #[serde(default)]
    pub classifier_model: Option<String>,
    /// Override for the direct responder.
    #[serde(default)]
    pub direct_model: Option<String>,
    /// Override for the tool-augmented responder.
    #[serde(default)]
    pub tool_model: Option<String>,
    /// Per-call timeout in seconds.
    pub timeout_seconds: u64,
}

impl ModelConfig {
    pub fn model_for(&self, role: ModelRole) -> &str {
        let override_model = match role {
            ModelRole::Classifier => self.classifier_model.as_deref(),
            ModelRole::Direct => self.direct_model.as_deref(),
            ModelRole::Tools => self.tool_model.as_deref(),
        };
        override_model.unwrap_or(&self.default_model)
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            default_model: "claude-sonnet-4-5-20250929".to_string(),
            classifier_model: Some("claude-3-5-haiku-latest".to_string()),
            direct_model: None,
            tool_model: None,
            timeout_seconds: 45,
        }
    }
}

/// What the tool loop does with model output it cannot parse.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ParsingErrorPolicy {
    /// Feed a corrective observation back and keep looping.
    #[default]
    Correct,
    /// Fail the request immediately.
    Fail,
}

/// Configuration for the tool-augmented responder.
///
/// `max_iterations` has no default: callers must choose a cap.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResponderConfig {
    pub max_iterations: NonZeroUsize,
    #[serde(default)]
    pub parsing_errors: ParsingErrorPolicy,
}

impl ResponderConfig {
    pub fn new(max_iterations: NonZeroUsize) -> Self {
        Self {
            max_iterations,
            parsing_errors: ParsingErrorPolicy::default(),
        }
    }
}

/// Capabilities exposed to the tool-augmented responder.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ToolsConfig {
    #[serde(default)]
    pub filesystem: Option<FilesystemToolsConfig>,
    #[serde(default)]
    pub commands: Vec<CommandToolConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilesystemToolsConfig {
    /// Directory all filesystem tools are confined to.
    pub root: String,
    /// Registers `write_file` and `delete_file` when true.
    #[serde(default)]
    pub allow_writes: bool,
    /// Directory depth searched by `find_file`.
    #[serde(default = "default_search_depth")]
    pub max_search_depth: usize,
}

/// An external program exposed as a tool (e.g. a web search CLI).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandToolConfig {
    pub name: String,
    pub description: String,
    pub program: String,
    /// Fixed arguments; the tool argument is appended last.
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_command_timeout")]
    pub timeout_seconds: u64,
}

fn default_search_depth() -> usize {
    8
}

fn default_command_timeout() -> u64 {
    30
}
