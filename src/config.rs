use anyhow::{Context, Result};
use serde::Deserialize;

use crate::speech::{RecognitionKind, SynthesisKind};

/// Environment variables with this prefix override file settings,
/// e.g. `LOQA_INTERVIEW__AGENT__ENDPOINT`.
pub const ENV_PREFIX: &str = "LOQA_INTERVIEW";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub agent: AgentConfig,
    #[serde(default)]
    pub interview: InterviewConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Full URL of the agent endpoint (POST)
    pub endpoint: String,
    /// Agent that plays the interviewer
    pub interviewer_agent_id: String,
    /// Agent that scores finished transcripts
    pub evaluator_agent_id: String,
    #[serde(default = "default_interview_type")]
    pub interview_type: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InterviewConfig {
    /// Nominal session length in seconds
    pub duration_secs: u64,
    /// Speak interviewer replies aloud
    pub voice_output: bool,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            duration_secs: crate::session::NOMINAL_DURATION_SECS,
            voice_output: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VoiceConfig {
    pub recognition: RecognitionKind,
    pub synthesis: SynthesisKind,
    pub words_per_minute: u32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            recognition: RecognitionKind::None,
            synthesis: SynthesisKind::None,
            words_per_minute: 170,
        }
    }
}

fn default_interview_type() -> String {
    "frontend_developer".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .with_context(|| format!("Failed to read config from {}", path))?;

        settings
            .try_deserialize()
            .context("Invalid configuration")
    }
}
