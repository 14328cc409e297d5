use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Seniority the candidate is interviewing for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionLevel {
    Junior,
    Mid,
    Senior,
}

impl fmt::Display for PositionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Junior => "Junior",
            Self::Mid => "Mid",
            Self::Senior => "Senior",
        };
        f.write_str(label)
    }
}

impl FromStr for PositionLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "junior" => Ok(Self::Junior),
            "mid" => Ok(Self::Mid),
            "senior" => Ok(Self::Senior),
            other => bail!("Unknown position level: {}", other),
        }
    }
}

/// Configuration for an interview session
///
/// Fixed once the session starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Candidate's display name (must not be blank)
    pub candidate_name: String,

    pub position_level: PositionLevel,

    /// Free-form interviewer notes, carried into the transcript bundle
    #[serde(default)]
    pub notes: String,
}

impl SessionConfig {
    pub fn new(candidate_name: impl Into<String>, position_level: PositionLevel) -> Self {
        Self {
            candidate_name: candidate_name.into(),
            position_level,
            notes: String::new(),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.candidate_name.trim().is_empty() {
            bail!("Candidate name must not be empty");
        }
        Ok(())
    }
}
