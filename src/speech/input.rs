use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::backend::{RecognitionBackend, RecognitionEvent};

/// Capture state of the speech input adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Listening,
    /// Platform has no recognizer; every operation is a no-op
    Unavailable,
}

/// Turns a streaming recognizer into a buffer of finalized text
///
/// Only final fragments are accumulated. Interim fragments are kept apart for
/// display and replaced on every update, so a final result that supersedes
/// them is never duplicated.
pub struct SpeechInputAdapter {
    backend: Box<dyn RecognitionBackend>,
    state: CaptureState,
    events: Option<mpsc::Receiver<RecognitionEvent>>,
    buffer: String,
    interim: String,
}

impl SpeechInputAdapter {
    pub fn new(backend: Box<dyn RecognitionBackend>) -> Self {
        let state = if backend.is_available() {
            CaptureState::Idle
        } else {
            info!("Speech recognition unavailable ({}), voice input disabled", backend.name());
            CaptureState::Unavailable
        };

        Self {
            backend,
            state,
            events: None,
            buffer: String::new(),
            interim: String::new(),
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_listening(&self) -> bool {
        self.state == CaptureState::Listening
    }

    pub fn is_available(&self) -> bool {
        self.state != CaptureState::Unavailable
    }

    /// Accumulated final text
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Latest interim fragment (display only)
    pub fn interim(&self) -> &str {
        &self.interim
    }

    pub async fn start_listening(&mut self) {
        if self.state != CaptureState::Idle {
            return;
        }

        self.buffer.clear();
        self.interim.clear();

        match self.backend.start().await {
            Ok(rx) => {
                self.events = Some(rx);
                self.state = CaptureState::Listening;
                info!("Listening ({})", self.backend.name());
            }
            Err(e) => {
                warn!("Failed to start speech recognition: {:#}", e);
            }
        }
    }

    /// Stop capture, keeping the accumulated buffer
    pub async fn stop_listening(&mut self) {
        if self.state != CaptureState::Listening {
            return;
        }

        if let Err(e) = self.backend.stop().await {
            warn!("Failed to stop speech recognition: {:#}", e);
        }

        // Results delivered before the stop still belong to the buffer
        self.flush_pending().await;

        self.go_idle();
        info!("Stopped listening");
    }

    /// Fold recognizer events that are already queued, without waiting
    pub async fn flush_pending(&mut self) {
        while self.state == CaptureState::Listening {
            let Some(event) = self.events.as_mut().and_then(|rx| rx.try_recv().ok()) else {
                break;
            };
            self.handle_event(event).await;
        }
    }

    /// Take the buffered text, trimmed, leaving the buffer empty
    pub fn take_buffer(&mut self) -> String {
        let text = self.buffer.trim().to_string();
        self.buffer.clear();
        self.interim.clear();
        text
    }

    pub fn clear_buffer(&mut self) {
        self.buffer.clear();
        self.interim.clear();
    }

    /// Wait for the next recognizer event
    ///
    /// Pends forever while not listening, so it can sit in a `select!`.
    pub async fn next_event(&mut self) -> RecognitionEvent {
        match self.events.as_mut() {
            Some(rx) => match rx.recv().await {
                Some(event) => event,
                None => RecognitionEvent::Ended,
            },
            None => std::future::pending().await,
        }
    }

    /// Fold a recognizer event into the adapter
    pub async fn handle_event(&mut self, event: RecognitionEvent) {
        if self.state != CaptureState::Listening {
            debug!("Ignoring recognition event while not listening: {:?}", event);
            return;
        }

        match event {
            RecognitionEvent::Result {
                transcript,
                is_final: true,
            } => {
                let fragment = transcript.trim();
                if !fragment.is_empty() {
                    if !self.buffer.is_empty() {
                        self.buffer.push(' ');
                    }
                    self.buffer.push_str(fragment);
                }
                self.interim.clear();
            }
            RecognitionEvent::Result {
                transcript,
                is_final: false,
            } => {
                self.interim = transcript;
            }
            RecognitionEvent::Error(error) => {
                warn!("Speech recognition error: {}", error);
                if let Err(e) = self.backend.stop().await {
                    debug!("Recognizer stop after error failed: {:#}", e);
                }
                self.go_idle();
            }
            RecognitionEvent::Ended => {
                debug!("Recognizer ended");
                self.go_idle();
            }
        }
    }

    fn go_idle(&mut self) {
        self.events = None;
        self.interim.clear();
        self.state = CaptureState::Idle;
    }
}
