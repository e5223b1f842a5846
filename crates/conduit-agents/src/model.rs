use async_trait::async_trait;
use conduit_models::routing::ChoiceSchema;

use crate::error::ModelError;
use crate::parser::parse_choice;
use crate::prompts::structured_output_instruction;

/// A system instruction plus the user-facing text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

/// Language model backend. Mockable for testing.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn name(&self) -> &str;

    /// Free-text completion.
    async fn complete(&self, prompt: &Prompt) -> Result<String, ModelError>;

    /// Completion constrained to one of the schema's two literals.
    ///
    /// The default asks for a one-field JSON object through `complete` and
    /// validates it; backends with native structured output override this.
    async fn complete_structured(
        &self,
        prompt: &Prompt,
        schema: &ChoiceSchema,
    ) -> Result<String, ModelError> {
        let constrained = Prompt::new(
            format!(
                "{}\n\n{}",
                prompt.system,
                structured_output_instruction(schema)
            ),
            prompt.user.clone(),
        );
        let raw = self.complete(&constrained).await?;
        parse_choice(&raw, schema)
    }
}
