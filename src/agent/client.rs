use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::error::AgentError;
use super::messages::{AgentContext, AgentEnvelope, AgentReply, AgentRequest, EvaluationResult};
use crate::config::AgentConfig;
use crate::session::TranscriptBundle;

/// Request/response contract with the external interviewer and evaluator agents
///
/// Calls are single-shot; retry policy belongs to the caller.
#[async_trait]
pub trait AgentGateway: Send + Sync {
    /// Send the candidate's latest utterance and get the interviewer's reply
    async fn send_message(
        &self,
        utterance: &str,
        context: &AgentContext,
    ) -> Result<AgentReply, AgentError>;

    /// Ask the evaluator to score a finished interview
    async fn request_evaluation(
        &self,
        bundle: &TranscriptBundle,
    ) -> Result<EvaluationResult, AgentError>;
}

/// Agent gateway speaking JSON over HTTP POST
pub struct HttpAgentGateway {
    client: Client,
    endpoint: String,
    interviewer_agent_id: String,
    evaluator_agent_id: String,
}

impl HttpAgentGateway {
    pub fn new(config: &AgentConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        info!("Agent gateway targeting {}", config.endpoint);

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            interviewer_agent_id: config.interviewer_agent_id.clone(),
            evaluator_agent_id: config.evaluator_agent_id.clone(),
        })
    }

    /// POST a request and return the `response` payload of a successful envelope
    async fn call(&self, request: &AgentRequest) -> Result<Value, AgentError> {
        debug!("Calling agent {} ({} chars)", request.agent_id, request.message.len());

        let response = self.client.post(&self.endpoint).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Agent {} returned HTTP {}", request.agent_id, status);
            return Err(AgentError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let envelope: AgentEnvelope = serde_json::from_slice(&body)
            .map_err(|e| AgentError::MalformedBody(e.to_string()))?;

        if !envelope.success {
            return Err(AgentError::Rejected(envelope.error));
        }

        match envelope.response {
            None | Some(Value::Null) => Err(AgentError::EmptyResponse),
            Some(Value::String(text)) if text.is_empty() => Err(AgentError::EmptyResponse),
            Some(payload) => Ok(payload),
        }
    }
}

#[async_trait]
impl AgentGateway for HttpAgentGateway {
    async fn send_message(
        &self,
        utterance: &str,
        context: &AgentContext,
    ) -> Result<AgentReply, AgentError> {
        let request = AgentRequest::chat(&self.interviewer_agent_id, utterance, context);
        let payload = self.call(&request).await?;
        Ok(AgentReply::from_value(payload))
    }

    async fn request_evaluation(
        &self,
        bundle: &TranscriptBundle,
    ) -> Result<EvaluationResult, AgentError> {
        let request = AgentRequest::evaluation(&self.evaluator_agent_id, bundle);
        let payload = self.call(&request).await?;

        let result =
            EvaluationResult::from_response(payload).map_err(AgentError::MalformedEvaluation)?;

        info!(
            "Evaluation received for {}: {:.1} ({:?})",
            bundle.candidate_name, result.overall_score.weighted_average, result.recommendation.decision
        );

        Ok(result)
    }
}
