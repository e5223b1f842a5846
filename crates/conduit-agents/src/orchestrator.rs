use std::sync::Arc;
use std::time::Instant;

use conduit_models::answer::FinalAnswer;
use conduit_models::config::ResponderConfig;
use conduit_models::request::Request;
use conduit_models::routing::RoutingDecision;
use conduit_tools::CapabilitySet;
use tracing::{info, warn};

use crate::classifier::DecisionClassifier;
use crate::direct::DirectResponder;
use crate::error::AgentError;
use crate::model::LanguageModel;
use crate::tool_responder::ToolResponder;

/// Where a request is in its lifecycle.
enum Stage {
    Classifying,
    Responding(RoutingDecision),
    Done(FinalAnswer),
}

/// Routes each request through the classifier to exactly one responder.
///
/// Holds no per-request state, so one instance can serve concurrent
/// requests behind an `Arc`.
pub struct Orchestrator {
    classifier: DecisionClassifier,
    direct: DirectResponder,
    tools: ToolResponder,
}

impl Orchestrator {
    pub fn new(classifier: DecisionClassifier, direct: DirectResponder, tools: ToolResponder) -> Self {
        Self {
            classifier,
            direct,
            tools,
        }
    }

    /// Wire the three stages from one model per role.
    pub fn from_models(
        classifier_model: Arc<dyn LanguageModel>,
        direct_model: Arc<dyn LanguageModel>,
        tool_model: Arc<dyn LanguageModel>,
        capabilities: CapabilitySet,
        responder: ResponderConfig,
    ) -> Self {
        Self::new(
            DecisionClassifier::new(classifier_model),
            DirectResponder::new(direct_model),
            ToolResponder::new(tool_model, capabilities, responder),
        )
    }

    pub fn capabilities(&self) -> &CapabilitySet {
        self.tools.capabilities()
    }

    /// Classify the request, then answer it with the chosen responder.
    pub async fn handle(&self, request: &Request) -> Result<FinalAnswer, AgentError> {
        let start = Instant::now();
        info!(request_id = %request.id, "Handling request");

        let result = self.run(request).await;
        match &result {
            Ok(answer) => info!(
                request_id = %request.id,
                route = %answer.route,
                iterations = answer.iterations,
                elapsed_ms = start.elapsed().as_millis(),
                "Request answered"
            ),
            Err(e) => warn!(
                request_id = %request.id,
                kind = e.kind(),
                error = %e,
                elapsed_ms = start.elapsed().as_millis(),
                "Request failed"
            ),
        }
        result
    }

    async fn run(&self, request: &Request) -> Result<FinalAnswer, AgentError> {
        let mut stage = Stage::Classifying;
        loop {
            stage = match stage {
                Stage::Classifying => {
                    let decision = self.classifier.classify(request).await?;
                    info!(request_id = %request.id, route = %decision, "Routing");
                    Stage::Responding(decision)
                }
                Stage::Responding(RoutingDecision::Direct) => {
                    Stage::Done(self.direct.respond_direct(request).await?)
                }
                Stage::Responding(RoutingDecision::NeedsTools) => {
                    Stage::Done(self.tools.respond_with_tools(request).await?)
                }
                Stage::Done(answer) => return Ok(answer),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::test_support::{EchoCapability, ScriptedModel};
    use std::num::NonZeroUsize;

    struct Harness {
        classifier: Arc<ScriptedModel>,
        direct: Arc<ScriptedModel>,
        tools: Arc<ScriptedModel>,
    }

    impl Harness {
        fn orchestrator(&self) -> Orchestrator {
            let capabilities = CapabilitySet::new()
                .with(Arc::new(EchoCapability::new("echo")))
                .unwrap();
            Orchestrator::from_models(
                self.classifier.clone(),
                self.direct.clone(),
                self.tools.clone(),
                capabilities,
                ResponderConfig::new(NonZeroUsize::new(5).unwrap()),
            )
        }
    }

    #[tokio::test]
    async fn direct_route_never_touches_tool_model() {
        let h = Harness {
            classifier: Arc::new(ScriptedModel::choosing("nao")),
            direct: Arc::new(ScriptedModel::new("direct").with_reply("Remember to drink water")),
            tools: Arc::new(ScriptedModel::new("tools")),
        };
        let answer = h
            .orchestrator()
            .handle(&Request::new("drink water").unwrap())
            .await
            .unwrap();

        assert_eq!(answer.route, RoutingDecision::Direct);
        assert_eq!(answer.text, "Remember to drink water");
        assert_eq!(h.classifier.calls(), 1);
        assert_eq!(h.direct.calls(), 1);
        assert_eq!(h.tools.calls(), 0);
    }

    #[tokio::test]
    async fn tool_route_never_touches_direct_model() {
        let h = Harness {
            classifier: Arc::new(ScriptedModel::choosing("sim")),
            direct: Arc::new(ScriptedModel::new("direct")),
            tools: Arc::new(
                ScriptedModel::new("tools")
                    .with_reply("Action: echo\nAction Input: hi")
                    .with_reply("Final Answer: hi"),
            ),
        };
        let answer = h
            .orchestrator()
            .handle(&Request::new("say hi").unwrap())
            .await
            .unwrap();

        assert_eq!(answer.route, RoutingDecision::NeedsTools);
        assert_eq!(answer.tool_calls.len(), 1);
        assert_eq!(h.direct.calls(), 0);
        assert_eq!(h.tools.completion_calls(), 2);
    }

    #[tokio::test]
    async fn classifier_failure_stops_before_any_responder() {
        let h = Harness {
            classifier: Arc::new(ScriptedModel::new("classifier").with_structured_failure("down")),
            direct: Arc::new(ScriptedModel::new("direct").repeating("unused")),
            tools: Arc::new(ScriptedModel::new("tools").repeating("Final Answer: unused")),
        };
        let err = h
            .orchestrator()
            .handle(&Request::new("anything").unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::Classification(ModelError::Cli(_))));
        assert_eq!(h.direct.calls(), 0);
        assert_eq!(h.tools.calls(), 0);
    }

    #[tokio::test]
    async fn answer_keeps_request_id() {
        let h = Harness {
            classifier: Arc::new(ScriptedModel::choosing("nao")),
            direct: Arc::new(ScriptedModel::new("direct").with_reply("ok")),
            tools: Arc::new(ScriptedModel::new("tools")),
        };
        let request = Request::new("hello").unwrap();
        let answer = h.orchestrator().handle(&request).await.unwrap();
        assert_eq!(answer.request_id, request.id);
    }
}
