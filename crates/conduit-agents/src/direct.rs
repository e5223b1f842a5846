use std::sync::Arc;

use conduit_models::answer::FinalAnswer;
use conduit_models::request::Request;
use tracing::debug;

use crate::error::{AgentError, ModelError};
use crate::model::{LanguageModel, Prompt};
use crate::prompts::direct_system_prompt;

/// Answers with a single completion call and no tools.
pub struct DirectResponder {
    model: Arc<dyn LanguageModel>,
}

impl DirectResponder {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    pub async fn respond_direct(&self, request: &Request) -> Result<FinalAnswer, AgentError> {
        let prompt = Prompt::new(direct_system_prompt(), request.text());
        let raw = self
            .model
            .complete(&prompt)
            .await
            .map_err(AgentError::Responder)?;

        let text = raw.trim();
        if text.is_empty() {
            return Err(AgentError::Responder(ModelError::Parse(
                "empty response".to_string(),
            )));
        }

        debug!(request_id = %request.id, chars = text.len(), "Direct answer produced");
        Ok(FinalAnswer::direct(request.id, text.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedModel;
    use conduit_models::routing::RoutingDecision;

    #[tokio::test]
    async fn returns_trimmed_completion() {
        let model = Arc::new(ScriptedModel::new("direct").with_reply("  Remember to take out the trash\n"));
        let responder = DirectResponder::new(model.clone());
        let request = Request::new("take out the trash").unwrap();

        let answer = responder.respond_direct(&request).await.unwrap();
        assert_eq!(answer.text, "Remember to take out the trash");
        assert_eq!(answer.request_id, request.id);
        assert_eq!(answer.route, RoutingDecision::Direct);
        assert!(answer.tool_calls.is_empty());
        assert_eq!(model.completion_calls(), 1);
    }

    #[tokio::test]
    async fn uses_reminder_instructions() {
        let model = Arc::new(ScriptedModel::new("direct").with_reply("ok"));
        DirectResponder::new(model.clone())
            .respond_direct(&Request::new("drink water").unwrap())
            .await
            .unwrap();

        let prompt = &model.prompts()[0];
        assert!(prompt.system.contains("Remember to drink water"));
        assert_eq!(prompt.user, "drink water");
    }

    #[tokio::test]
    async fn model_failure_is_responder_error() {
        let model = ScriptedModel::new("direct").with_failure("rate limited");
        let err = DirectResponder::new(Arc::new(model))
            .respond_direct(&Request::new("hello").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Responder(ModelError::Cli(_))));
    }

    #[tokio::test]
    async fn blank_completion_is_responder_error() {
        let model = ScriptedModel::new("direct").with_reply("   ");
        let err = DirectResponder::new(Arc::new(model))
            .respond_direct(&Request::new("hello").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Responder(ModelError::Parse(_))));
    }
}
