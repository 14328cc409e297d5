// Recognizer fed by results produced on the client device

use anyhow::Result;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::backend::{RecognitionBackend, RecognitionEvent};

const FEED_CHANNEL_SIZE: usize = 64;

type SharedSender = Arc<Mutex<Option<mpsc::Sender<RecognitionEvent>>>>;

/// Recognition backend whose results are pushed in through a [`RecognitionFeed`]
///
/// Results pushed while the recognizer is not started are dropped.
pub struct PushRecognizer {
    sender: SharedSender,
}

/// Producer side of a [`PushRecognizer`]
#[derive(Clone)]
pub struct RecognitionFeed {
    sender: SharedSender,
}

impl PushRecognizer {
    pub fn new() -> (Self, RecognitionFeed) {
        let sender: SharedSender = Arc::new(Mutex::new(None));
        (
            Self {
                sender: Arc::clone(&sender),
            },
            RecognitionFeed { sender },
        )
    }
}

#[async_trait::async_trait]
impl RecognitionBackend for PushRecognizer {
    async fn start(&mut self) -> Result<mpsc::Receiver<RecognitionEvent>> {
        let (tx, rx) = mpsc::channel(FEED_CHANNEL_SIZE);
        let mut slot = self
            .sender
            .lock()
            .map_err(|_| anyhow::anyhow!("Recognition feed lock poisoned"))?;
        *slot = Some(tx);
        debug!("Push recognizer started");
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        let mut slot = self
            .sender
            .lock()
            .map_err(|_| anyhow::anyhow!("Recognition feed lock poisoned"))?;
        *slot = None;
        debug!("Push recognizer stopped");
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "push"
    }
}

impl RecognitionFeed {
    /// Push a recognized fragment
    ///
    /// Returns `false` if the recognizer is not listening or is backed up.
    pub fn push(&self, transcript: impl Into<String>, is_final: bool) -> bool {
        self.send(RecognitionEvent::Result {
            transcript: transcript.into(),
            is_final,
        })
    }

    /// Report a recognizer failure on the client
    pub fn fail(&self, error: impl Into<String>) -> bool {
        self.send(RecognitionEvent::Error(error.into()))
    }

    pub fn is_listening(&self) -> bool {
        self.sender
            .lock()
            .map(|slot| slot.as_ref().is_some_and(|tx| !tx.is_closed()))
            .unwrap_or(false)
    }

    fn send(&self, event: RecognitionEvent) -> bool {
        let Ok(slot) = self.sender.lock() else {
            return false;
        };

        match slot.as_ref() {
            Some(tx) => match tx.try_send(event) {
                Ok(()) => true,
                Err(e) => {
                    warn!("Dropping recognition result: {}", e);
                    false
                }
            },
            None => {
                debug!("Recognizer not listening, dropping result");
                false
            }
        }
    }
}
