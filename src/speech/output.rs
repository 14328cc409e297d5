use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::backend::{PlaybackEvent, SynthesisBackend, Utterance};

/// Playback state of the speech output adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Speaking,
    /// Platform has no synthesizer; every operation is a no-op
    Unavailable,
}

/// Speaks interviewer text, one utterance at a time
///
/// A new `speak` always preempts the current utterance. Lifecycle events are
/// matched by utterance id so a late `Finished` from a preempted utterance
/// cannot flip the state of the one that replaced it.
pub struct SpeechOutputAdapter {
    backend: Box<dyn SynthesisBackend>,
    state: PlaybackState,
    enabled: bool,
    current: Option<u64>,
    next_id: u64,
    events_tx: mpsc::UnboundedSender<PlaybackEvent>,
    events_rx: mpsc::UnboundedReceiver<PlaybackEvent>,
}

impl SpeechOutputAdapter {
    pub fn new(backend: Box<dyn SynthesisBackend>, enabled: bool) -> Self {
        let state = if backend.is_available() {
            PlaybackState::Idle
        } else {
            info!("Speech synthesis unavailable ({}), voice output disabled", backend.name());
            PlaybackState::Unavailable
        };
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Self {
            backend,
            state,
            enabled,
            current: None,
            next_id: 0,
            events_tx,
            events_rx,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_speaking(&self) -> bool {
        self.state == PlaybackState::Speaking
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable voice output; disabling silences the current utterance
    pub async fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.stop().await;
        }
    }

    pub async fn speak(&mut self, text: &str) {
        if !self.enabled || self.state == PlaybackState::Unavailable || text.trim().is_empty() {
            return;
        }

        if self.current.is_some() {
            self.cancel_current().await;
        }

        let id = self.next_id;
        self.next_id += 1;
        self.current = Some(id);

        let utterance = Utterance {
            id,
            text: text.to_string(),
        };

        if let Err(e) = self.backend.speak(utterance, self.events_tx.clone()).await {
            warn!("Speech synthesis failed: {:#}", e);
            self.current = None;
            self.state = PlaybackState::Idle;
        }
    }

    /// Silence playback
    pub async fn stop(&mut self) {
        if self.current.is_none() {
            return;
        }
        self.cancel_current().await;
        debug!("Playback stopped");
    }

    pub async fn next_event(&mut self) -> PlaybackEvent {
        match self.events_rx.recv().await {
            Some(event) => event,
            // The adapter holds a sender, so the channel never closes
            None => std::future::pending().await,
        }
    }

    pub fn handle_event(&mut self, event: PlaybackEvent) {
        if self.current != Some(event.utterance()) {
            debug!("Ignoring playback event for stale utterance: {:?}", event);
            return;
        }

        match event {
            PlaybackEvent::Started { .. } => {
                self.state = PlaybackState::Speaking;
            }
            PlaybackEvent::Finished { .. } => {
                self.current = None;
                self.state = PlaybackState::Idle;
            }
            PlaybackEvent::Failed { error, .. } => {
                warn!("Speech playback error: {}", error);
                self.current = None;
                self.state = PlaybackState::Idle;
            }
        }
    }

    async fn cancel_current(&mut self) {
        if let Err(e) = self.backend.cancel().await {
            warn!("Failed to cancel speech playback: {:#}", e);
        }
        self.current = None;
        if self.state == PlaybackState::Speaking {
            self.state = PlaybackState::Idle;
        }
    }
}
