//! Client side of the natural-language query service: classifying responses,
//! normalizing result sets and driving a question through its lifecycle.

pub mod classifier;
pub mod client;
pub mod controller;
pub mod normalizer;

pub use classifier::classify;
pub use client::{validate_base_url, ClientSettings, QueryBackend, QueryClient};
pub use controller::{AnswerView, Submission, SubmissionController, ViewState};
pub use normalizer::normalize;
