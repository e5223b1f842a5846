use serde::{Deserialize, Serialize};

/// A request to run a named tool with a single string argument.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolInvocation {
    pub tool: String,
    pub argument: String,
}

/// One iteration of the tool loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReasoningStep {
    pub thought: String,
    pub action: Option<ToolInvocation>,
    /// Tool output, or the corrective note fed back after unparsable output.
    pub observation: Option<String>,
}

/// A completed tool call, as reported on a `FinalAnswer`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolCallRecord {
    pub tool: String,
    pub argument: String,
    pub observation: String,
}

/// Append-only record of one tool-loop run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transcript {
    steps: Vec<ReasoningStep>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: ReasoningStep) {
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[ReasoningStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Render the steps as the ReAct scratchpad that follows the first `Thought:`.
    pub fn render_scratchpad(&self) -> String {
        let mut out = String::new();
        for step in &self.steps {
            out.push_str(step.thought.trim_end());
            if let Some(action) = &step.action {
                out.push_str(&format!(
                    "\nAction: {}\nAction Input: {}",
                    action.tool, action.argument
                ));
            }
            if let Some(observation) = &step.observation {
                out.push_str(&format!("\nObservation: {observation}"));
            }
            out.push_str("\nThought: ");
        }
        out
    }
}
