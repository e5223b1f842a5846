use std::sync::Arc;

use conduit_models::answer::FinalAnswer;
use conduit_models::config::{ParsingErrorPolicy, ResponderConfig};
use conduit_models::reasoning::{ReasoningStep, ToolCallRecord, ToolInvocation, Transcript};
use conduit_models::request::Request;
use conduit_tools::CapabilitySet;
use tracing::{debug, info, warn};

use crate::error::{AgentError, ModelError};
use crate::model::{LanguageModel, Prompt};
use crate::parser::{parse_react_output, ReactOutput};
use crate::prompts::{
    format_correction, invalid_tool_observation, react_system_prompt, react_user_prompt,
    tool_error_observation,
};

/// Runs a bounded ReAct loop, invoking capabilities until the model gives a
/// final answer.
///
/// Every model call counts as one iteration, including calls whose output
/// could not be parsed. Tool calls run one at a time.
pub struct ToolResponder {
    model: Arc<dyn LanguageModel>,
    capabilities: CapabilitySet,
    config: ResponderConfig,
}

impl ToolResponder {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        capabilities: CapabilitySet,
        config: ResponderConfig,
    ) -> Self {
        Self {
            model,
            capabilities,
            config,
        }
    }

    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    pub async fn respond_with_tools(&self, request: &Request) -> Result<FinalAnswer, AgentError> {
        let max_iterations = self.config.max_iterations.get();
        let system = react_system_prompt();
        let mut transcript = Transcript::new();
        let mut tool_calls: Vec<ToolCallRecord> = Vec::new();

        for iteration in 1..=max_iterations {
            let prompt = Prompt::new(
                system.clone(),
                react_user_prompt(
                    &self.capabilities,
                    request.text(),
                    &transcript.render_scratchpad(),
                ),
            );

            let raw = self
                .model
                .complete(&prompt)
                .await
                .map_err(AgentError::Responder)?;

            match parse_react_output(&raw) {
                Ok(ReactOutput::Finish { answer, .. }) => {
                    info!(
                        request_id = %request.id,
                        iterations = iteration,
                        tool_calls = tool_calls.len(),
                        "Tool loop finished"
                    );
                    return Ok(FinalAnswer::with_tools(
                        request.id,
                        answer,
                        iteration,
                        tool_calls,
                    ));
                }
                Ok(ReactOutput::Action {
                    thought,
                    invocation,
                }) => {
                    let observation = self.run_tool(&invocation, &mut tool_calls).await?;
                    transcript.push(ReasoningStep {
                        thought,
                        action: Some(invocation),
                        observation: Some(observation),
                    });
                }
                Err(format_error) => match self.config.parsing_errors {
                    ParsingErrorPolicy::Correct => {
                        warn!(
                            request_id = %request.id,
                            iteration,
                            error = %format_error,
                            "Unparsable model output, asking for the format again"
                        );
                        transcript.push(ReasoningStep {
                            thought: raw.trim().to_string(),
                            action: None,
                            observation: Some(format_correction(&format_error)),
                        });
                    }
                    ParsingErrorPolicy::Fail => {
                        return Err(AgentError::Responder(ModelError::Parse(
                            format_error.to_string(),
                        )));
                    }
                },
            }
        }

        warn!(
            request_id = %request.id,
            iterations = max_iterations,
            "Tool loop exhausted without a final answer"
        );
        Err(AgentError::ToolLoopExhausted {
            iterations: max_iterations,
            transcript,
        })
    }

    /// Invoke the named capability and return the observation text.
    ///
    /// Unknown tools and recoverable tool errors become observations;
    /// anything else aborts the loop.
    async fn run_tool(
        &self,
        invocation: &ToolInvocation,
        tool_calls: &mut Vec<ToolCallRecord>,
    ) -> Result<String, AgentError> {
        let Some(capability) = self.capabilities.get(&invocation.tool) else {
            warn!(tool = %invocation.tool, "Model asked for an unknown tool");
            return Ok(invalid_tool_observation(&invocation.tool, &self.capabilities));
        };

        debug!(tool = %invocation.tool, argument = %invocation.argument, "Invoking tool");
        match capability.invoke(&invocation.argument).await {
            Ok(observation) => {
                tool_calls.push(ToolCallRecord {
                    tool: invocation.tool.clone(),
                    argument: invocation.argument.clone(),
                    observation: observation.clone(),
                });
                Ok(observation)
            }
            Err(e) if e.is_recoverable() => {
                warn!(tool = %invocation.tool, error = %e, "Tool rejected its input");
                Ok(tool_error_observation(&e))
            }
            Err(e) => Err(AgentError::ToolInvocation {
                tool: invocation.tool.clone(),
                source: e,
            }),
        }
    }
}
