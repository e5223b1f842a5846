pub mod answer;
pub mod config;
pub mod reasoning;
pub mod request;
pub mod routing;

pub use answer::FinalAnswer;
pub use config::{
    CommandToolConfig, ConduitConfig, FilesystemToolsConfig, ModelConfig, ModelRole,
    ParsingErrorPolicy, ResponderConfig, ToolsConfig,
};
pub use reasoning::{ReasoningStep, ToolCallRecord, ToolInvocation, Transcript};
pub use request::{EmptyRequest, Request};
pub use routing::{ChoiceSchema, RoutingDecision};
