use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::session::{PositionLevel, TranscriptBundle, TranscriptItem};

/// Request body posted to the agent endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRequest {
    pub message: String,
    pub agent_id: String,
    pub context: RequestContext,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestContext {
    Interview(AgentContext),
    Evaluation(EvaluationContext),
}

/// Session context sent with every candidate utterance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentContext {
    pub candidate_name: String,
    pub position_level: PositionLevel,
    pub interview_type: String,
}

/// Context sent with an evaluation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationContext {
    pub transcript: Vec<TranscriptItem>,
    pub candidate_name: String,
    pub position_level: PositionLevel,
}

/// Response body returned by the agent endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub response: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Interviewer reply, in whichever shape the agent produced it
#[derive(Debug, Clone, PartialEq)]
pub enum AgentReply {
    Text(String),
    Structured(Value),
}

impl AgentReply {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Text(text),
            other => Self::Structured(other),
        }
    }

    /// Plain text of the reply
    ///
    /// A structured payload yields its non-empty string `content` field; any
    /// other shape is rendered as compact JSON rather than rejected.
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Structured(Value::Object(mut fields)) => match fields.remove("content") {
                Some(Value::String(content)) if !content.is_empty() => content,
                Some(content) => {
                    fields.insert("content".to_string(), content);
                    Value::Object(fields).to_string()
                }
                None => Value::Object(fields).to_string(),
            },
            Self::Structured(other) => other.to_string(),
        }
    }
}

/// Structured evaluation of a finished interview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub overall_score: OverallScore,
    #[serde(default)]
    pub scores: BTreeMap<String, CompetencyScore>,
    #[serde(default)]
    pub strengths: Vec<Finding>,
    #[serde(default)]
    pub weaknesses: Vec<Finding>,
    pub recommendation: Recommendation,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverallScore {
    pub weighted_average: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompetencyScore {
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub area: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub decision: Decision,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    #[serde(alias = "hire", alias = "HIRE")]
    Hire,
    #[serde(alias = "consider", alias = "CONSIDER")]
    Consider,
    #[serde(alias = "pass", alias = "PASS")]
    Pass,
}

impl EvaluationResult {
    /// Parse the `response` field of an evaluation reply
    ///
    /// The evaluator may return the result as an object or as a JSON string.
    pub fn from_response(response: Value) -> serde_json::Result<Self> {
        match response {
            Value::String(encoded) => serde_json::from_str(&encoded),
            other => serde_json::from_value(other),
        }
    }
}

impl AgentRequest {
    pub fn chat(agent_id: &str, utterance: &str, context: &AgentContext) -> Self {
        Self {
            message: utterance.to_string(),
            agent_id: agent_id.to_string(),
            context: RequestContext::Interview(context.clone()),
        }
    }

    pub fn evaluation(agent_id: &str, bundle: &TranscriptBundle) -> Self {
        Self {
            message: evaluation_prompt(bundle),
            agent_id: agent_id.to_string(),
            context: RequestContext::Evaluation(EvaluationContext {
                transcript: bundle.transcript.clone(),
                candidate_name: bundle.candidate_name.clone(),
                position_level: bundle.position_level,
            }),
        }
    }
}

/// Plain-text transcript dump the evaluator reads
pub fn evaluation_prompt(bundle: &TranscriptBundle) -> String {
    let lines: Vec<String> = bundle
        .transcript
        .iter()
        .map(|item| format!("{}: {}", item.speaker, item.content))
        .collect();

    format!(
        "Please evaluate this interview transcript:\n\nCandidate: {}\nLevel: {}\n\nTranscript:\n{}",
        bundle.candidate_name,
        bundle.position_level,
        lines.join("\n")
    )
}
