use crate::agent::AgentGateway;
use crate::config::VoiceConfig;
use crate::review::InterviewRecord;
use crate::session::{RunnerOptions, SessionHandle, SessionRunner, TranscriptBundle};
use crate::speech::{RecognitionFeed, SpeechBackendFactory};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// The interview currently in progress
#[derive(Clone)]
pub struct ActiveInterview {
    pub id: String,
    pub handle: SessionHandle,
    /// Present when recognition results are pushed by the client
    pub feed: Option<RecognitionFeed>,
}

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn AgentGateway>,
    pub options: RunnerOptions,
    pub voice: VoiceConfig,
    /// At most one live interview
    pub active: Arc<RwLock<Option<ActiveInterview>>>,
    /// Finished interviews (interview_id → record)
    pub interviews: Arc<RwLock<HashMap<String, InterviewRecord>>>,
}

impl AppState {
    pub fn new(gateway: Arc<dyn AgentGateway>, options: RunnerOptions, voice: VoiceConfig) -> Self {
        Self {
            gateway,
            options,
            voice,
            active: Arc::new(RwLock::new(None)),
            interviews: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Build a fresh runner with the configured voice backends
    pub fn build_runner(&self) -> (SessionRunner, Option<RecognitionFeed>) {
        let (recognizer, feed) = SpeechBackendFactory::recognizer(self.voice.recognition);
        let synthesizer =
            SpeechBackendFactory::synthesizer(self.voice.synthesis, self.voice.words_per_minute);
        let runner = SessionRunner::new(
            Arc::clone(&self.gateway),
            recognizer,
            synthesizer,
            self.options.clone(),
        );
        (runner, feed)
    }

    /// Live interview with `id`, if it is the active one
    pub async fn active_interview(&self, id: &str) -> Option<ActiveInterview> {
        let active = self.active.read().await;
        active.as_ref().filter(|a| a.id == id).cloned()
    }

    /// Move a finished interview from the active slot into the record store
    ///
    /// Safe to call more than once for the same interview.
    pub async fn complete(&self, id: &str, bundle: TranscriptBundle) {
        {
            let mut interviews = self.interviews.write().await;
            if !interviews.contains_key(id) {
                interviews.insert(id.to_string(), InterviewRecord::completed(id, bundle));
                info!("Interview {} completed", id);
            }
        }

        let mut active = self.active.write().await;
        if active.as_ref().is_some_and(|a| a.id == id) {
            *active = None;
        }
    }
}
