use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::reasoning::ToolCallRecord;
use crate::routing::RoutingDecision;

/// The terminal text result of one request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinalAnswer {
    pub request_id: Uuid,
    pub text: String,
    /// Which responder produced the answer.
    pub route: RoutingDecision,
    /// Tool-loop iterations spent. Always 0 on the direct route.
    pub iterations: usize,
    /// Tools actually invoked, in order. Always empty on the direct route.
    pub tool_calls: Vec<ToolCallRecord>,
    pub answered_at: DateTime<Utc>,
}

impl FinalAnswer {
    pub fn direct(request_id: Uuid, text: String) -> Self {
        Self {
            request_id,
            text,
            route: RoutingDecision::Direct,
            iterations: 0,
            tool_calls: vec![],
            answered_at: Utc::now(),
        }
    }

    pub fn with_tools(
        request_id: Uuid,
        text: String,
        iterations: usize,
        tool_calls: Vec<ToolCallRecord>,
    ) -> Self {
        Self {
            request_id,
            text,
            route: RoutingDecision::NeedsTools,
            iterations,
            tool_calls,
            answered_at: Utc::now(),
        }
    }
}
