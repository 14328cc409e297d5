pub mod agent;
pub mod clock;
pub mod config;
pub mod http;
pub mod review;
pub mod session;
pub mod speech;

pub use agent::{AgentError, AgentGateway, AgentReply, EvaluationResult, HttpAgentGateway};
pub use clock::{ClockEvent, Countdown};
pub use config::Config;
pub use http::{create_router, AppState};
pub use review::{InterviewRecord, InterviewStatus};
pub use session::{
    PositionLevel, RunnerOptions, SessionConfig, SessionHandle, SessionRunner, SessionState,
    TranscriptBundle, TranscriptItem,
};
pub use speech::{SpeechBackendFactory, SpeechInputAdapter, SpeechOutputAdapter};
