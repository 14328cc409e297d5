// Test doubles shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use loqa_interview::agent::{
    AgentContext, AgentError, AgentGateway, AgentReply, Decision, EvaluationResult, OverallScore,
    Recommendation,
};
use loqa_interview::speech::{PlaybackEvent, SynthesisBackend, Utterance};
use loqa_interview::{PositionLevel, SessionConfig, TranscriptBundle};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

pub fn ada() -> SessionConfig {
    SessionConfig::new("Ada", PositionLevel::Senior).with_notes("Strong on CSS")
}

/// An agent call waiting for the test to answer it
pub struct PendingCall {
    pub utterance: String,
    pub context: AgentContext,
    reply: oneshot::Sender<Result<AgentReply, AgentError>>,
}

impl PendingCall {
    pub fn reply_text(self, text: &str) {
        let _ = self.reply.send(Ok(AgentReply::Text(text.to_string())));
    }

    pub fn fail(self, error: AgentError) {
        let _ = self.reply.send(Err(error));
    }
}

/// Gateway whose replies are released by the test, one call at a time
pub struct ControlledGateway {
    calls: mpsc::UnboundedSender<PendingCall>,
}

pub struct GatewayControl {
    calls: mpsc::UnboundedReceiver<PendingCall>,
}

impl ControlledGateway {
    pub fn new() -> (Arc<Self>, GatewayControl) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { calls: tx }), GatewayControl { calls: rx })
    }
}

impl GatewayControl {
    pub async fn next_call(&mut self) -> PendingCall {
        self.calls.recv().await.expect("gateway dropped")
    }

    pub fn has_pending(&mut self) -> bool {
        !self.calls.is_empty()
    }
}

#[async_trait]
impl AgentGateway for ControlledGateway {
    async fn send_message(
        &self,
        utterance: &str,
        context: &AgentContext,
    ) -> Result<AgentReply, AgentError> {
        let (reply, rx) = oneshot::channel();
        let call = PendingCall {
            utterance: utterance.to_string(),
            context: context.clone(),
            reply,
        };
        if self.calls.send(call).is_err() {
            return Err(AgentError::EmptyResponse);
        }
        rx.await.unwrap_or(Err(AgentError::EmptyResponse))
    }

    async fn request_evaluation(
        &self,
        _bundle: &TranscriptBundle,
    ) -> Result<EvaluationResult, AgentError> {
        Err(AgentError::EmptyResponse)
    }
}

/// Gateway that answers immediately: echoes utterances and scores every
/// transcript with `score`
pub struct EchoGateway {
    pub score: Mutex<f64>,
}

impl EchoGateway {
    pub fn new(score: f64) -> Arc<Self> {
        Arc::new(Self {
            score: Mutex::new(score),
        })
    }
}

#[async_trait]
impl AgentGateway for EchoGateway {
    async fn send_message(
        &self,
        utterance: &str,
        _context: &AgentContext,
    ) -> Result<AgentReply, AgentError> {
        Ok(AgentReply::Text(format!("You said: {}", utterance)))
    }

    async fn request_evaluation(
        &self,
        bundle: &TranscriptBundle,
    ) -> Result<EvaluationResult, AgentError> {
        let score = *self.score.lock().unwrap();
        Ok(evaluation(score, &format!("{} turns", bundle.transcript.len())))
    }
}

pub fn evaluation(score: f64, summary: &str) -> EvaluationResult {
    EvaluationResult {
        overall_score: OverallScore {
            weighted_average: score,
        },
        scores: BTreeMap::new(),
        strengths: Vec::new(),
        weaknesses: Vec::new(),
        recommendation: Recommendation {
            decision: Decision::Consider,
            summary: summary.to_string(),
        },
    }
}

/// Synthesizer that records what it was asked to say and reports playback
/// as started, never finishing on its own
pub struct RecordingSynthesizer {
    spoken: Arc<Mutex<Vec<String>>>,
    cancels: Arc<Mutex<usize>>,
}

impl RecordingSynthesizer {
    pub fn new() -> (Self, Arc<Mutex<Vec<String>>>) {
        let spoken = Arc::new(Mutex::new(Vec::new()));
        let synth = Self {
            spoken: Arc::clone(&spoken),
            cancels: Arc::new(Mutex::new(0)),
        };
        (synth, spoken)
    }
}

#[async_trait]
impl SynthesisBackend for RecordingSynthesizer {
    async fn speak(
        &mut self,
        utterance: Utterance,
        events: mpsc::UnboundedSender<PlaybackEvent>,
    ) -> anyhow::Result<()> {
        self.spoken.lock().unwrap().push(utterance.text.clone());
        let _ = events.send(PlaybackEvent::Started {
            utterance: utterance.id,
        });
        Ok(())
    }

    async fn cancel(&mut self) -> anyhow::Result<()> {
        *self.cancels.lock().unwrap() += 1;
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "recording"
    }
}
