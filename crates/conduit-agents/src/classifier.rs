use std::sync::Arc;

use conduit_models::request::Request;
use conduit_models::routing::{ChoiceSchema, RoutingDecision};
use tracing::{debug, warn};

use crate::error::{AgentError, ModelError};
use crate::model::{LanguageModel, Prompt};
use crate::prompts::decision_system_prompt;

/// Decides whether a request needs tools before it can be answered.
pub struct DecisionClassifier {
    model: Arc<dyn LanguageModel>,
    schema: ChoiceSchema,
}

impl DecisionClassifier {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            schema: ChoiceSchema::routing(),
        }
    }

    /// One structured model call. Never guesses a route on failure.
    pub async fn classify(&self, request: &Request) -> Result<RoutingDecision, AgentError> {
        let prompt = Prompt::new(decision_system_prompt(), request.text());

        let literal = self
            .model
            .complete_structured(&prompt, &self.schema)
            .await
            .map_err(|e| {
                warn!(request_id = %request.id, model = self.model.name(), error = %e, "Classifier call failed");
                AgentError::Classification(e)
            })?;

        let decision = RoutingDecision::from_literal(&literal).ok_or_else(|| {
            AgentError::Classification(ModelError::Schema(format!(
                "unexpected routing literal: {literal}"
            )))
        })?;

        debug!(request_id = %request.id, %decision, "Request classified");
        Ok(decision)
    }
}
