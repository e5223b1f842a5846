use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Request text is empty")]
pub struct EmptyRequest;

/// A user's ask, immutable once created.
///
/// Deserialization applies the same non-empty check as [`Request::new`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "RequestFields")]
pub struct Request {
    pub id: Uuid,
    text: String,
    pub received_at: DateTime<Utc>,
}

impl Request {
    /// Create a request. Whitespace-only text is rejected.
    pub fn new(text: impl Into<String>) -> Result<Self, EmptyRequest> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(EmptyRequest);
        }
        Ok(Self {
            id: Uuid::new_v4(),
            text,
            received_at: Utc::now(),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

#[derive(Deserialize)]
struct RequestFields {
    id: Uuid,
    text: String,
    received_at: DateTime<Utc>,
}

impl TryFrom<RequestFields> for Request {
    type Error = EmptyRequest;

    fn try_from(fields: RequestFields) -> Result<Self, Self::Error> {
        if fields.text.trim().is_empty() {
            return Err(EmptyRequest);
        }
        Ok(Self {
            id: fields.id,
            text: fields.text,
            received_at: fields.received_at,
        })
    }
}
