use serde::{Deserialize, Serialize};
use std::fmt;

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Candidate,
    Interviewer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Candidate => f.write_str("candidate"),
            Self::Interviewer => f.write_str("interviewer"),
        }
    }
}

/// One utterance in the conversation log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    /// Insertion order, starting at 0
    pub sequence: u64,
}

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Not started yet
    Idle,
    Running,
    /// Tearing down clock and voice adapters
    Ending,
    Ended,
}

/// Everything a session runner owns about the conversation
///
/// Subscribers receive clones of this after every folded event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub turns: Vec<Turn>,
    pub remaining_seconds: u64,
    pub phase: Phase,
    pub voice_capture_active: bool,
    pub voice_playback_active: bool,
    pub voice_output_enabled: bool,
    /// Finalized speech not yet submitted
    pub pending_transcript_buffer: String,
    /// Latest interim speech fragment (display only)
    pub interim_transcript: String,
    /// An agent call is outstanding
    pub awaiting_reply: bool,
}

impl SessionState {
    pub fn new(duration_secs: u64, voice_output_enabled: bool) -> Self {
        Self {
            turns: Vec::new(),
            remaining_seconds: duration_secs,
            phase: Phase::Idle,
            voice_capture_active: false,
            voice_playback_active: false,
            voice_output_enabled,
            pending_transcript_buffer: String::new(),
            interim_transcript: String::new(),
            awaiting_reply: false,
        }
    }

    pub(crate) fn push_turn(&mut self, role: Role, content: String) {
        let sequence = self.turns.len() as u64;
        self.turns.push(Turn {
            role,
            content,
            sequence,
        });
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }
}
