//! Maps a raw HTTP status and body onto an [`Outcome`].

use reqwest::StatusCode;
use serde_json::Value;
use shared::{
    error::{Failure, FALLBACK_FAILURE_MESSAGE},
    protocol::Outcome,
};
use tracing::debug;

pub fn classify(status: StatusCode, body: &[u8]) -> Outcome {
    if status.is_success() {
        return match serde_json::from_slice::<Value>(body) {
            Ok(payload) => Outcome::Success(payload),
            Err(err) => {
                debug!(status = status.as_u16(), %err, "success response body is not JSON");
                Failure::malformed(format!("Malformed response from server: {err}")).into()
            }
        };
    }

    Failure::service(status.as_u16(), failure_message(body)).into()
}

fn failure_message(body: &[u8]) -> String {
    let detail = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|mut body| body.get_mut("detail").map(Value::take));

    match detail {
        Some(Value::String(text)) if !text.is_empty() => text,
        Some(Value::String(_)) | Some(Value::Null) | None => FALLBACK_FAILURE_MESSAGE.to_string(),
        // FastAPI validation errors carry a list of objects here.
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
#[path = "tests/classifier_tests.rs"]
mod tests;
