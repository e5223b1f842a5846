//! Test support module providing scripted language models and capabilities.
//!
//! `ScriptedModel` replays a fixed list of completions and structured
//! answers, counting every call so tests can assert which components ran.
//! The capability stubs record the arguments they were invoked with.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use conduit_models::routing::ChoiceSchema;
use conduit_tools::{Capability, CapabilityError};

use crate::error::ModelError;
use crate::model::{LanguageModel, Prompt};

/// One scripted model turn.
#[derive(Debug, Clone)]
enum Turn {
    Text(String),
    Fail(String),
}

impl Turn {
    fn into_result(self) -> Result<String, ModelError> {
        match self {
            Turn::Text(text) => Ok(text),
            Turn::Fail(message) => Err(ModelError::Cli(message)),
        }
    }
}

/// A language model that replays scripted turns.
///
/// `complete` pops from the completion script, then falls back to the
/// repeating reply (if set), then fails. `complete_structured` does the
/// same with its own script and never calls `complete`.
pub struct ScriptedModel {
    name: String,
    completions: Mutex<VecDeque<Turn>>,
    repeat: Option<String>,
    choices: Mutex<VecDeque<Turn>>,
    completion_calls: AtomicUsize,
    structured_calls: AtomicUsize,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedModel {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            completions: Mutex::new(VecDeque::new()),
            repeat: None,
            choices: Mutex::new(VecDeque::new()),
            completion_calls: AtomicUsize::new(0),
            structured_calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A model whose structured call always picks `literal`.
    pub fn choosing(literal: &str) -> Self {
        Self::new("classifier").with_choice(literal)
    }

    /// Queue a free-text completion.
    pub fn with_reply(self, text: &str) -> Self {
        self.push_completion(Turn::Text(text.to_string()));
        self
    }

    /// Queue a failing free-text completion.
    pub fn with_failure(self, message: &str) -> Self {
        self.push_completion(Turn::Fail(message.to_string()));
        self
    }

    /// Reply used whenever the completion script is empty.
    pub fn repeating(mut self, text: &str) -> Self {
        self.repeat = Some(text.to_string());
        self
    }

    /// Queue a structured answer.
    pub fn with_choice(self, literal: &str) -> Self {
        self.push_choice(Turn::Text(literal.to_string()));
        self
    }

    /// Queue a failing structured call.
    pub fn with_structured_failure(self, message: &str) -> Self {
        self.push_choice(Turn::Fail(message.to_string()));
        self
    }

    pub fn completion_calls(&self) -> usize {
        self.completion_calls.load(Ordering::SeqCst)
    }

    pub fn structured_calls(&self) -> usize {
        self.structured_calls.load(Ordering::SeqCst)
    }

    /// Total calls of either kind.
    pub fn calls(&self) -> usize {
        self.completion_calls() + self.structured_calls()
    }

    /// Every prompt received, in order.
    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    fn push_completion(&self, turn: Turn) {
        if let Ok(mut script) = self.completions.lock() {
            script.push_back(turn);
        }
    }

    fn push_choice(&self, turn: Turn) {
        if let Ok(mut script) = self.choices.lock() {
            script.push_back(turn);
        }
    }

    fn record(&self, prompt: &Prompt) {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.clone());
        }
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, prompt: &Prompt) -> Result<String, ModelError> {
        self.completion_calls.fetch_add(1, Ordering::SeqCst);
        self.record(prompt);

        let next = self.completions.lock().ok().and_then(|mut s| s.pop_front());
        match (next, &self.repeat) {
            (Some(turn), _) => turn.into_result(),
            (None, Some(text)) => Ok(text.clone()),
            (None, None) => Err(ModelError::Cli(format!(
                "{}: completion script exhausted",
                self.name
            ))),
        }
    }

    async fn complete_structured(
        &self,
        prompt: &Prompt,
        schema: &ChoiceSchema,
    ) -> Result<String, ModelError> {
        self.structured_calls.fetch_add(1, Ordering::SeqCst);
        self.record(prompt);

        let next = self.choices.lock().ok().and_then(|mut s| s.pop_front());
        match next {
            Some(turn) => {
                let value = turn.into_result()?;
                schema.accept(&value).map(str::to_string).ok_or_else(|| {
                    ModelError::Schema(format!("{} is not one of {:?}", value, schema.options))
                })
            }
            None => Err(ModelError::Cli(format!(
                "{}: structured script exhausted",
                self.name
            ))),
        }
    }
}

/// Returns its argument unchanged and records every invocation.
pub struct EchoCapability {
    name: String,
    invocations: Mutex<Vec<String>>,
}

impl EchoCapability {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            invocations: Mutex::new(Vec::new()),
        }
    }

    pub fn invocations(&self) -> Vec<String> {
        self.invocations.lock().map(|i| i.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Capability for EchoCapability {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Returns its input unchanged"
    }

    async fn invoke(&self, argument: &str) -> Result<String, CapabilityError> {
        if let Ok(mut invocations) = self.invocations.lock() {
            invocations.push(argument.to_string());
        }
        Ok(argument.to_string())
    }
}

/// Always fails; `recoverable` picks the error kind.
pub struct FailingCapability {
    name: String,
    recoverable: bool,
    calls: AtomicUsize,
}

impl FailingCapability {
    /// Fails with an execution error, which aborts the request.
    pub fn fatal(name: &str) -> Self {
        Self {
            name: name.to_string(),
            recoverable: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Fails with a not-found error, which the model gets to see.
    pub fn recoverable(name: &str) -> Self {
        Self {
            name: name.to_string(),
            recoverable: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Capability for FailingCapability {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Always fails"
    }

    async fn invoke(&self, argument: &str) -> Result<String, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.recoverable {
            Err(CapabilityError::NotFound(format!("nothing for '{argument}'")))
        } else {
            Err(CapabilityError::Execution("backend unavailable".to_string()))
        }
    }
}
