use anyhow::{bail, Result};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use super::config::SessionConfig;
use super::state::{Phase, Role, SessionState};
use super::transcript::TranscriptBundle;
use crate::agent::{AgentContext, AgentError, AgentGateway, AgentReply};
use crate::clock::{ClockEvent, Countdown};
use crate::config::Config;
use crate::speech::{
    PlaybackEvent, RecognitionBackend, RecognitionEvent, SpeechInputAdapter, SpeechOutputAdapter,
    SynthesisBackend,
};

/// Nominal interview length: 20 minutes
pub const NOMINAL_DURATION_SECS: u64 = 20 * 60;

/// Runner settings that are not part of the per-candidate session config
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    pub duration_secs: u64,
    /// Speak interviewer replies aloud
    pub voice_output: bool,
    /// Interview-type tag sent to the agent with every utterance
    pub interview_type: String,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            duration_secs: NOMINAL_DURATION_SECS,
            voice_output: true,
            interview_type: "frontend_developer".to_string(),
        }
    }
}

impl RunnerOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            duration_secs: config.interview.duration_secs,
            voice_output: config.interview.voice_output,
            interview_type: config.agent.interview_type.clone(),
        }
    }
}

/// Result of an agent call, tagged with the request that produced it
#[derive(Debug)]
pub struct AgentOutcome {
    pub request_id: u64,
    pub result: Result<AgentReply, AgentError>,
}

/// Asynchronous input folded into the session one at a time
#[derive(Debug)]
pub enum SessionEvent {
    Clock(ClockEvent),
    Agent(AgentOutcome),
    Recognition(RecognitionEvent),
    Playback(PlaybackEvent),
}

/// Live interview state machine
///
/// Owns the turn log, the countdown and both voice adapters. All mutation
/// goes through `&mut self`, so clock ticks, recognition results, playback
/// events and agent replies are applied strictly one after another.
///
/// At most one agent call is outstanding at a time; a submission made while
/// one is pending is rejected. Turn order therefore always equals the order in
/// which submissions were accepted.
pub struct SessionRunner {
    options: RunnerOptions,
    config: Option<SessionConfig>,
    state: SessionState,
    clock: Countdown,
    speech_in: SpeechInputAdapter,
    speech_out: SpeechOutputAdapter,
    gateway: Arc<dyn AgentGateway>,
    replies_tx: mpsc::UnboundedSender<AgentOutcome>,
    replies_rx: mpsc::UnboundedReceiver<AgentOutcome>,
    in_flight: Option<u64>,
    next_request_id: u64,
    bundle: Option<TranscriptBundle>,
    updates: watch::Sender<SessionState>,
}

impl SessionRunner {
    pub fn new(
        gateway: Arc<dyn AgentGateway>,
        recognizer: Box<dyn RecognitionBackend>,
        synthesizer: Box<dyn SynthesisBackend>,
        options: RunnerOptions,
    ) -> Self {
        let state = SessionState::new(options.duration_secs, options.voice_output);
        let (updates, _) = watch::channel(state.clone());
        let (replies_tx, replies_rx) = mpsc::unbounded_channel();

        Self {
            clock: Countdown::new(options.duration_secs),
            speech_in: SpeechInputAdapter::new(recognizer),
            speech_out: SpeechOutputAdapter::new(synthesizer, options.voice_output),
            options,
            config: None,
            state,
            gateway,
            replies_tx,
            replies_rx,
            in_flight: None,
            next_request_id: 0,
            bundle: None,
            updates,
        }
    }

    pub fn start(&mut self, config: SessionConfig) -> Result<()> {
        config.validate()?;

        if self.state.phase != Phase::Idle {
            bail!("Session already started");
        }

        info!(
            "Starting interview: {} ({}), {}s",
            config.candidate_name, config.position_level, self.options.duration_secs
        );

        self.state.turns.clear();
        self.state.remaining_seconds = self.options.duration_secs;
        self.state.phase = Phase::Running;
        self.config = Some(config);
        self.clock.start();
        self.publish();

        Ok(())
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn config(&self) -> Option<&SessionConfig> {
        self.config.as_ref()
    }

    /// Final transcript, once the session has ended
    pub fn transcript(&self) -> Option<&TranscriptBundle> {
        self.bundle.as_ref()
    }

    /// Observe state changes
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.updates.subscribe()
    }

    /// Submit a typed candidate utterance
    ///
    /// Returns `false` (and changes nothing) if the session is not running,
    /// the text is blank, or a previous utterance is still awaiting its reply.
    pub fn submit_text(&mut self, text: &str) -> bool {
        if !self.state.is_running() {
            debug!("Ignoring submission while {:?}", self.state.phase);
            return false;
        }

        let text = text.trim();
        if text.is_empty() {
            return false;
        }

        if let Some(request_id) = self.in_flight {
            debug!("Rejecting submission, request {} still outstanding", request_id);
            return false;
        }

        let Some(context) = self.agent_context() else {
            return false;
        };

        self.state.push_turn(Role::Candidate, text.to_string());
        self.speech_in.clear_buffer();

        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.in_flight = Some(request_id);
        self.state.awaiting_reply = true;

        let gateway = Arc::clone(&self.gateway);
        let replies = self.replies_tx.clone();
        let utterance = text.to_string();

        tokio::spawn(async move {
            let result = gateway.send_message(&utterance, &context).await;
            // Receiver is gone once the runner is dropped
            let _ = replies.send(AgentOutcome { request_id, result });
        });

        self.publish();
        true
    }

    /// Submit the accumulated speech buffer as a candidate utterance
    ///
    /// Rejected without side effects if the buffer is blank or a submission
    /// would be rejected. Otherwise stops listening first.
    pub async fn submit_voice_buffer(&mut self) -> bool {
        if !self.state.is_running() || self.in_flight.is_some() {
            return false;
        }

        self.speech_in.flush_pending().await;
        if self.speech_in.buffer().trim().is_empty() {
            self.publish();
            return false;
        }

        self.speech_in.stop_listening().await;
        let text = self.speech_in.take_buffer();
        self.submit_text(&text)
    }

    /// Start voice capture; returns whether capture is active afterwards
    pub async fn start_listening(&mut self) -> bool {
        if !self.state.is_running() {
            return false;
        }
        self.speech_in.start_listening().await;
        self.publish();
        self.speech_in.is_listening()
    }

    pub async fn stop_listening(&mut self) {
        self.speech_in.stop_listening().await;
        self.publish();
    }

    pub async fn set_voice_output(&mut self, enabled: bool) {
        self.speech_out.set_enabled(enabled).await;
        self.publish();
    }

    /// Advance the displayed clock by one second
    pub async fn tick(&mut self) {
        let next = self.state.remaining_seconds.saturating_sub(1);
        self.tick_to(next).await;
    }

    async fn tick_to(&mut self, remaining: u64) {
        if !self.state.is_running() {
            return;
        }

        self.state.remaining_seconds = self.state.remaining_seconds.min(remaining);
        self.publish();

        if self.state.remaining_seconds == 0 {
            info!("Interview time is up");
            self.end().await;
        }
    }

    /// End the session and return the final transcript
    ///
    /// Idempotent: later calls return the same bundle. Returns `None` if the
    /// session was never started.
    pub async fn end(&mut self) -> Option<TranscriptBundle> {
        match self.state.phase {
            Phase::Idle => {
                debug!("Ignoring end of a session that never started");
                None
            }
            Phase::Ending | Phase::Ended => self.bundle.clone(),
            Phase::Running => {
                self.state.phase = Phase::Ending;
                self.publish();

                self.clock.cancel();
                self.speech_in.stop_listening().await;
                self.speech_out.stop().await;

                if let Some(request_id) = self.in_flight.take() {
                    debug!("Discarding outstanding agent request {}", request_id);
                }
                self.state.awaiting_reply = false;

                let bundle = self.config.as_ref().map(|config| {
                    TranscriptBundle::from_turns(config, &self.state.turns, self.options.duration_secs)
                });
                self.bundle = bundle.clone();
                self.state.phase = Phase::Ended;
                self.publish();

                info!(
                    "Interview ended: {} turns, {}s remaining",
                    self.state.turns.len(),
                    self.state.remaining_seconds
                );

                bundle
            }
        }
    }

    /// Wait for the next clock, agent, recognition or playback event
    pub async fn next_event(&mut self) -> SessionEvent {
        tokio::select! {
            Some(event) = self.clock.next() => SessionEvent::Clock(event),
            Some(outcome) = self.replies_rx.recv() => SessionEvent::Agent(outcome),
            event = self.speech_in.next_event() => SessionEvent::Recognition(event),
            event = self.speech_out.next_event() => SessionEvent::Playback(event),
        }
    }

    pub async fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Clock(ClockEvent::Tick { remaining }) => self.tick_to(remaining).await,
            SessionEvent::Clock(ClockEvent::Expired) => {
                self.end().await;
            }
            SessionEvent::Agent(outcome) => self.handle_agent_outcome(outcome).await,
            SessionEvent::Recognition(event) => self.speech_in.handle_event(event).await,
            SessionEvent::Playback(event) => self.speech_out.handle_event(event),
        }
        self.publish();
    }

    /// Wait for one event and fold it
    pub async fn process_next(&mut self) {
        let event = self.next_event().await;
        self.handle_event(event).await;
    }

    async fn handle_agent_outcome(&mut self, outcome: AgentOutcome) {
        if !self.state.is_running() || self.in_flight != Some(outcome.request_id) {
            debug!("Discarding late reply for request {}", outcome.request_id);
            return;
        }

        self.in_flight = None;
        self.state.awaiting_reply = false;

        match outcome.result {
            Ok(reply) => {
                let text = reply.into_text();
                self.state.push_turn(Role::Interviewer, text.clone());
                self.speech_out.speak(&text).await;
            }
            Err(e) => {
                warn!("Agent call failed, no reply recorded: {}", e);
            }
        }
    }

    fn agent_context(&self) -> Option<AgentContext> {
        self.config.as_ref().map(|config| AgentContext {
            candidate_name: config.candidate_name.clone(),
            position_level: config.position_level,
            interview_type: self.options.interview_type.clone(),
        })
    }

    fn publish(&mut self) {
        self.state.voice_capture_active = self.speech_in.is_listening();
        self.state.voice_playback_active = self.speech_out.is_speaking();
        self.state.voice_output_enabled = self.speech_out.is_enabled();
        self.state.pending_transcript_buffer = self.speech_in.buffer().to_string();
        self.state.interim_transcript = self.speech_in.interim().to_string();
        self.updates.send_replace(self.state.clone());
    }
}
