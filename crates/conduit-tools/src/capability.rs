use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::CapabilityError;

/// A named tool the tool-augmented responder may call. Mockable for testing.
#[async_trait]
pub trait Capability: Send + Sync {
    /// Unique name the model uses to select this tool.
    fn name(&self) -> &str;

    /// One-line description shown to the model.
    fn description(&self) -> &str;

    async fn invoke(&self, argument: &str) -> Result<String, CapabilityError>;
}

/// Name -> capability mapping, resolved once when a responder is built.
///
/// Ordered by name so the tool list rendered into prompts is stable.
#[derive(Clone, Default)]
pub struct CapabilitySet {
    providers: BTreeMap<String, Arc<dyn Capability>>,
}

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capability. Names must be unique.
    pub fn register(&mut self, capability: Arc<dyn Capability>) -> Result<(), CapabilityError> {
        let name = capability.name().to_string();
        if name.trim().is_empty() {
            return Err(CapabilityError::InvalidArgument(
                "capability name is empty".to_string(),
            ));
        }
        if self.providers.contains_key(&name) {
            return Err(CapabilityError::Duplicate(name));
        }
        debug!(capability = %name, "Registering capability");
        self.providers.insert(name, capability);
        Ok(())
    }

    /// Builder-style `register`.
    pub fn with(mut self, capability: Arc<dyn Capability>) -> Result<Self, CapabilityError> {
        self.register(capability)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Capability>> {
        self.providers.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// `name: description` lines, one per capability.
    pub fn describe(&self) -> String {
        self.providers
            .values()
            .map(|c| format!("{}: {}", c.name(), c.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilitySet")
            .field("names", &self.names())
            .finish()
    }
}
