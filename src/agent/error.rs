/// Failure of a single agent call
///
/// Every variant is recoverable: the caller decides whether to retry.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("agent request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("agent returned HTTP {status}")]
    Status { status: u16 },

    #[error("agent returned a malformed body: {0}")]
    MalformedBody(String),

    #[error("agent reported failure: {}", .0.as_deref().unwrap_or("no details"))]
    Rejected(Option<String>),

    #[error("agent returned an empty response")]
    EmptyResponse,

    #[error("agent returned an unreadable evaluation: {0}")]
    MalformedEvaluation(#[source] serde_json::Error),
}
