use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{domain::Question, error::Failure};

pub const ASK_ROUTE: &str = "/ask";
pub const HEALTH_ROUTE: &str = "/health";

#[derive(Debug, Clone, Serialize)]
pub struct AskRequest<'a> {
    pub question: &'a Question,
}

/// Classified result of one `/ask` exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Value),
    Failure(Failure),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl From<Failure> for Outcome {
    fn from(value: Failure) -> Self {
        Self::Failure(value)
    }
}

/// Fields of a successful `/ask` body, with absent values defaulted.
///
/// The body is read leniently: every field is optional and a field of the
/// wrong type counts as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AskReply {
    pub status: Option<String>,
    pub answer: String,
    pub query: String,
    pub tokens_used: i64,
    pub raw_results: Option<Value>,
}

impl AskReply {
    pub fn from_payload(payload: &Value) -> Self {
        let status = payload
            .get("status")
            .and_then(Value::as_str)
            .map(str::to_string);
        let Some(data) = payload.get("data") else {
            return Self {
                status,
                ..Self::default()
            };
        };

        Self {
            status,
            answer: text_field(data, "answer"),
            query: text_field(data, "query"),
            tokens_used: data
                .get("tokens_used")
                .and_then(Value::as_i64)
                .unwrap_or_default(),
            raw_results: data.get("raw_results").filter(|v| !v.is_null()).cloned(),
        }
    }

    /// The service reports some failures as 2xx with `"status": "error"`.
    pub fn is_soft_error(&self) -> bool {
        self.status.as_deref() == Some("error")
    }
}

fn text_field(data: &Value, name: &str) -> String {
    data.get(name)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}
