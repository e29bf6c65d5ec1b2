//! HTTP client for the question-answering service.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::Question,
    error::Failure,
    protocol::{AskRequest, HealthResponse, Outcome, ASK_ROUTE, HEALTH_ROUTE},
};
use tracing::{debug, info, warn};
use url::Url;

use crate::classifier::classify;

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub request_timeout: Option<Duration>,
}

impl ClientSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout: None,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

/// Anything that can turn a question into an [`Outcome`].
#[async_trait]
pub trait QueryBackend: Send + Sync {
    async fn send(&self, question: &Question) -> Outcome;
}

pub struct QueryClient {
    http: Client,
    server_url: String,
}

impl QueryClient {
    pub fn new(settings: ClientSettings) -> Result<Self> {
        let server_url = validate_base_url(&settings.base_url)?;
        let mut builder = Client::builder();
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("failed to build HTTP client")?;
        Ok(Self { http, server_url })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub async fn send(&self, question: &Question) -> Outcome {
        let url = format!("{}{ASK_ROUTE}", self.server_url);
        debug!(%url, "sending question");

        let response = match self
            .http
            .post(&url)
            .json(&AskRequest { question })
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(%url, error = %err, "ask request failed before a response arrived");
                return Failure::transport(err.to_string()).into();
            }
        };

        let status = response.status();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(err) => {
                warn!(%url, status = status.as_u16(), error = %err, "failed to read ask response body");
                return Failure::transport(err.to_string()).into();
            }
        };

        let outcome = classify(status, &body);
        match &outcome {
            Outcome::Success(_) => info!(status = status.as_u16(), bytes = body.len(), "ask succeeded"),
            Outcome::Failure(failure) => warn!(
                status = status.as_u16(),
                kind = %failure.kind,
                message = %failure.message,
                "ask failed"
            ),
        }
        outcome
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        let res = self
            .http
            .get(format!("{}{HEALTH_ROUTE}", self.server_url))
            .send()
            .await?
            .error_for_status()?;
        let health: HealthResponse = res.json().await?;
        Ok(health)
    }
}

#[async_trait]
impl QueryBackend for QueryClient {
    async fn send(&self, question: &Question) -> Outcome {
        QueryClient::send(self, question).await
    }
}

/// Checks that `raw` is an absolute http(s) URL and strips trailing slashes.
pub fn validate_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(anyhow!("service base URL must not be empty"));
    }
    let parsed =
        Url::parse(trimmed).with_context(|| format!("invalid service base URL '{trimmed}'"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(anyhow!(
            "service base URL '{trimmed}' must use http or https, got '{}'",
            parsed.scheme()
        ));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(anyhow!(
            "service base URL '{trimmed}' must not carry a query or fragment"
        ));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
#[path = "tests/client_tests.rs"]
mod tests;
