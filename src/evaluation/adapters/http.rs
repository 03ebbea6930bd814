//! HTTP adapter for a remote evaluation backend.

use super::PromptRenderer;
use crate::evaluation::{
    domain::{EvaluationRequest, EvaluationVerdict},
    ports::{Evaluator, EvaluatorError, EvaluatorResult},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Connection settings for [`HttpEvaluator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpEvaluatorConfig {
    /// Endpoint that accepts evaluation requests.
    pub endpoint: String,
    /// Optional bearer token.
    pub api_key: Option<String>,
    /// Per-request transport timeout.
    pub timeout: Duration,
}

#[derive(Serialize)]
struct EvaluationEnvelope<'a> {
    #[serde(flatten)]
    request: &'a EvaluationRequest,
    prompt: String,
}

/// Evaluator that posts requests to a remote backend as JSON.
///
/// The backend must answer with a JSON [`EvaluationVerdict`].
#[derive(Debug)]
pub struct HttpEvaluator {
    client: Client,
    config: HttpEvaluatorConfig,
    prompts: PromptRenderer,
}

impl HttpEvaluator {
    /// Creates an evaluator for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluatorError::Unavailable`] when the HTTP client or the
    /// prompt templates cannot be initialised.
    pub fn new(config: HttpEvaluatorConfig) -> EvaluatorResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(EvaluatorError::unavailable)?;
        let prompts = PromptRenderer::new().map_err(EvaluatorError::unavailable)?;
        Ok(Self {
            client,
            config,
            prompts,
        })
    }

    /// Returns the configured endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// Decodes a response body into a verdict.
    ///
    /// When the backend leaves `raw_text` empty the body itself is kept as
    /// the raw text.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluatorError::InvalidResponse`] when the body is not a
    /// verdict.
    pub fn decode_verdict(body: &str) -> EvaluatorResult<EvaluationVerdict> {
        let mut verdict: EvaluationVerdict = serde_json::from_str(body)
            .map_err(|err| EvaluatorError::InvalidResponse(err.to_string()))?;
        if verdict.raw_text.is_empty() {
            body.clone_into(&mut verdict.raw_text);
        }
        Ok(verdict)
    }
}

#[async_trait]
impl Evaluator for HttpEvaluator {
    async fn evaluate(&self, request: &EvaluationRequest) -> EvaluatorResult<EvaluationVerdict> {
        let prompt = self
            .prompts
            .render(request)
            .map_err(EvaluatorError::unavailable)?;
        let envelope = EvaluationEnvelope { request, prompt };

        let mut builder = self.client.post(&self.config.endpoint).json(&envelope);
        if let Some(api_key) = &self.config.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| {
                warn!(endpoint = %self.config.endpoint, error = %err, "evaluator request failed");
                EvaluatorError::unavailable(err)
            })?;
        let body = response.text().await.map_err(EvaluatorError::unavailable)?;
        debug!(kind = %request.kind(), bytes = body.len(), "evaluator responded");
        Self::decode_verdict(&body)
    }
}
