use serde::{Deserialize, Serialize};

use super::config::{PositionLevel, SessionConfig};
use super::state::{Role, Turn};

/// A turn as it appears in the finished transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptItem {
    /// `mm:ss` position within the nominal session length
    pub timestamp: String,
    pub speaker: Role,
    pub content: String,
}

/// Finished interview, handed to review and evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptBundle {
    pub candidate_name: String,
    pub position_level: PositionLevel,
    pub notes: String,
    pub transcript: Vec<TranscriptItem>,
}

impl TranscriptBundle {
    /// Build the bundle from the turn log
    ///
    /// Timestamps are spread linearly by turn index over `nominal_secs`;
    /// no wall-clock time is recorded per turn.
    pub fn from_turns(config: &SessionConfig, turns: &[Turn], nominal_secs: u64) -> Self {
        let total = turns.len() as u64;
        let transcript = turns
            .iter()
            .enumerate()
            .map(|(index, turn)| TranscriptItem {
                timestamp: format_clock(index as u64 * nominal_secs / total),
                speaker: turn.role,
                content: turn.content.clone(),
            })
            .collect();

        Self {
            candidate_name: config.candidate_name.clone(),
            position_level: config.position_level,
            notes: config.notes.clone(),
            transcript,
        }
    }
}

/// Format seconds as zero-padded `mm:ss`
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
