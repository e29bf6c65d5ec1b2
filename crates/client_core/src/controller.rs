//! Drives one question/answer round trip and publishes the resulting [`ViewState`].

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use serde::Serialize;
use shared::{
    domain::{NormalizedTable, Question},
    protocol::{AskReply, Outcome},
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{client::QueryBackend, normalizer::normalize};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerView {
    pub answer: String,
    pub query: String,
    pub tokens_used: i64,
    pub table: NormalizedTable,
}

/// What the presentation layer should currently show.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ViewState {
    #[default]
    Idle,
    Loading,
    Success(AnswerView),
    Failure { message: String },
}

impl ViewState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// How a call to [`SubmissionController::submit`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Empty question; nothing was sent and the state is unchanged.
    Rejected,
    /// The outcome was published.
    Completed,
    /// A newer submission started while this one was in flight; its outcome was dropped.
    Superseded,
}

pub struct SubmissionController {
    backend: Arc<dyn QueryBackend>,
    state: watch::Sender<ViewState>,
    latest_submission: AtomicU64,
}

impl SubmissionController {
    pub fn new(backend: Arc<dyn QueryBackend>) -> Self {
        let (state, _) = watch::channel(ViewState::Idle);
        Self {
            backend,
            state,
            latest_submission: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ViewState {
        self.state.borrow().clone()
    }

    pub async fn submit(&self, raw: &str) -> Submission {
        let question = match Question::new(raw) {
            Ok(question) => question,
            Err(err) => {
                debug!(%err, "ignoring submission");
                return Submission::Rejected;
            }
        };

        let submission = self.latest_submission.fetch_add(1, Ordering::SeqCst) + 1;
        info!(submission, question = %question, "submitting question");
        self.state.send_replace(ViewState::Loading);

        let outcome = self.backend.send(&question).await;

        // Out-of-order completions must not overwrite a newer submission.
        let latest = self.latest_submission.load(Ordering::SeqCst);
        if latest != submission {
            debug!(submission, latest, "discarding stale outcome");
            return Submission::Superseded;
        }

        self.state.send_replace(view_for(submission, outcome));
        Submission::Completed
    }
}

fn view_for(submission: u64, outcome: Outcome) -> ViewState {
    match outcome {
        Outcome::Success(payload) => {
            let reply = AskReply::from_payload(&payload);
            if reply.is_soft_error() {
                warn!(submission, "service reported an error status in a successful response");
            }
            let table = normalize(reply.raw_results.as_ref());
            info!(
                submission,
                tokens_used = reply.tokens_used,
                rows = table.row_count(),
                "answer received"
            );
            ViewState::Success(AnswerView {
                answer: reply.answer,
                query: reply.query,
                tokens_used: reply.tokens_used,
                table,
            })
        }
        Outcome::Failure(failure) => {
            warn!(submission, kind = %failure.kind, "submission failed");
            ViewState::Failure {
                message: failure.message,
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
