pub mod client;
pub mod error;
pub mod messages;

pub use client::{AgentGateway, HttpAgentGateway};
pub use error::AgentError;
pub use messages::{
    AgentContext, AgentEnvelope, AgentReply, AgentRequest, CompetencyScore, Decision,
    EvaluationResult, Finding, OverallScore, Recommendation, RequestContext,
};
