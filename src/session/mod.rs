//! Live interview session management
//!
//! This module provides the `SessionRunner` state machine that manages:
//! - The countdown that bounds the interview
//! - Candidate input, typed or spoken
//! - Agent calls for interviewer replies (one outstanding at a time)
//! - Spoken playback of interviewer replies
//! - The final transcript bundle
//!
//! `SessionHandle` runs a runner on its own task for callers that should not
//! own it directly (HTTP API, console).

mod config;
mod handle;
mod runner;
mod state;
mod transcript;

pub use config::{PositionLevel, SessionConfig};
pub use handle::{SessionCommand, SessionHandle};
pub use runner::{
    AgentOutcome, RunnerOptions, SessionEvent, SessionRunner, NOMINAL_DURATION_SECS,
};
pub use state::{Phase, Role, SessionState, Turn};
pub use transcript::{format_clock, TranscriptBundle, TranscriptItem};
