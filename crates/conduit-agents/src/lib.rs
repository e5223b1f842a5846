pub mod classifier;
pub mod claude_cli;
pub mod direct;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod parser;
pub mod prompts;
pub mod tool_responder;

pub mod test_support;

pub use classifier::DecisionClassifier;
pub use claude_cli::ClaudeCliModel;
pub use direct::DirectResponder;
pub use error::{AgentError, ModelError};
pub use model::{LanguageModel, Prompt};
pub use orchestrator::Orchestrator;
pub use tool_responder::ToolResponder;
