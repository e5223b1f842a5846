use serde::{Deserialize, Serialize};

/// Whether a request needs an external information-gathering step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RoutingDecision {
    NeedsTools,
    Direct,
}

impl RoutingDecision {
    /// Structured-output literal for "needs tools".
    pub const NEEDS_TOOLS_LITERAL: &'static str = "sim";
    /// Structured-output literal for "answer directly".
    pub const DIRECT_LITERAL: &'static str = "nao";

    /// Map a classifier literal to a decision. Case and surrounding
    /// whitespace are ignored; anything else is `None`.
    pub fn from_literal(literal: &str) -> Option<Self> {
        let normalized = literal.trim().to_lowercase();
        match normalized.as_str() {
            Self::NEEDS_TOOLS_LITERAL => Some(Self::NeedsTools),
            Self::DIRECT_LITERAL => Some(Self::Direct),
            _ => None,
        }
    }

    pub fn literal(self) -> &'static str {
        match self {
            Self::NeedsTools => Self::NEEDS_TOOLS_LITERAL,
            Self::Direct => Self::DIRECT_LITERAL,
        }
    }
}

impl std::fmt::Display for RoutingDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NeedsTools => write!(f, "needs_tools"),
            Self::Direct => write!(f, "direct"),
        }
    }
}

/// A structured-output schema with one field restricted to two literals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChoiceSchema {
    pub field: String,
    pub options: [String; 2],
}

impl ChoiceSchema {
    pub fn new(field: &str, first: &str, second: &str) -> Self {
        Self {
            field: field.to_string(),
            options: [first.to_string(), second.to_string()],
        }
    }

    /// The schema the decision classifier asks for.
    pub fn routing() -> Self {
        Self::new(
            "needs_search",
            RoutingDecision::NEEDS_TOOLS_LITERAL,
            RoutingDecision::DIRECT_LITERAL,
        )
    }

    /// Return the matching option (canonical spelling) if `value` is allowed.
    pub fn accept(&self, value: &str) -> Option<&str> {
        let value = value.trim();
        self.options
            .iter()
            .find(|o| o.eq_ignore_ascii_case(value))
            .map(String::as_str)
    }
}
