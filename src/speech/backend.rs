use anyhow::Result;
use serde::Deserialize;
use tokio::sync::mpsc;

use super::push::PushRecognizer;
use super::simulated::SimulatedSynthesizer;

/// Result from a streaming recognizer
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionEvent {
    /// A recognized fragment. Interim fragments may later be superseded by a
    /// final one covering the same speech.
    Result { transcript: String, is_final: bool },
    /// Recognizer failed; capture is over
    Error(String),
    /// Recognizer stopped on its own
    Ended,
}

/// Text handed to a synthesizer, tagged so lifecycle events can be matched
/// to the utterance that produced them
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub id: u64,
    pub text: String,
}

/// Playback lifecycle event
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    Started { utterance: u64 },
    Finished { utterance: u64 },
    Failed { utterance: u64, error: String },
}

impl PlaybackEvent {
    pub fn utterance(&self) -> u64 {
        match self {
            Self::Started { utterance }
            | Self::Finished { utterance }
            | Self::Failed { utterance, .. } => *utterance,
        }
    }
}

/// Continuous speech recognition capability
///
/// Implementations:
/// - Push: results come from the client device (browser, mobile app)
/// - Unavailable: platform has no recognizer
#[async_trait::async_trait]
pub trait RecognitionBackend: Send + Sync {
    /// Start recognizing
    ///
    /// Returns a channel receiver that will receive recognition results
    async fn start(&mut self) -> Result<mpsc::Receiver<RecognitionEvent>>;

    /// Stop recognizing
    async fn stop(&mut self) -> Result<()>;

    /// Whether the platform exposes this capability at all
    fn is_available(&self) -> bool;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Speech synthesis capability
#[async_trait::async_trait]
pub trait SynthesisBackend: Send + Sync {
    /// Begin speaking `utterance`
    ///
    /// Lifecycle events for it are sent on `events`.
    async fn speak(
        &mut self,
        utterance: Utterance,
        events: mpsc::UnboundedSender<PlaybackEvent>,
    ) -> Result<()>;

    /// Silence whatever is currently playing
    async fn cancel(&mut self) -> Result<()>;

    fn is_available(&self) -> bool;

    fn name(&self) -> &str;
}

/// Recognizer for a platform without speech recognition
pub struct UnavailableRecognizer;

#[async_trait::async_trait]
impl RecognitionBackend for UnavailableRecognizer {
    async fn start(&mut self) -> Result<mpsc::Receiver<RecognitionEvent>> {
        anyhow::bail!("Speech recognition is not available on this platform")
    }

    async fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn is_available(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

/// Synthesizer for a platform without speech output
pub struct UnavailableSynthesizer;

#[async_trait::async_trait]
impl SynthesisBackend for UnavailableSynthesizer {
    async fn speak(
        &mut self,
        _utterance: Utterance,
        _events: mpsc::UnboundedSender<PlaybackEvent>,
    ) -> Result<()> {
        anyhow::bail!("Speech synthesis is not available on this platform")
    }

    async fn cancel(&mut self) -> Result<()> {
        Ok(())
    }

    fn is_available(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

/// Recognition backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecognitionKind {
    None,
    Push,
}

/// Synthesis backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisKind {
    None,
    Simulated,
}

/// Speech backend factory
pub struct SpeechBackendFactory;

impl SpeechBackendFactory {
    /// Create a recognizer
    ///
    /// For `Push` the returned feed is how recognition results reach the
    /// recognizer; it is `None` for backends that need no feed.
    pub fn recognizer(
        kind: RecognitionKind,
    ) -> (Box<dyn RecognitionBackend>, Option<super::push::RecognitionFeed>) {
        match kind {
            RecognitionKind::None => (Box::new(UnavailableRecognizer), None),
            RecognitionKind::Push => {
                let (recognizer, feed) = PushRecognizer::new();
                (Box::new(recognizer), Some(feed))
            }
        }
    }

    pub fn synthesizer(kind: SynthesisKind, words_per_minute: u32) -> Box<dyn SynthesisBackend> {
        match kind {
            SynthesisKind::None => Box::new(UnavailableSynthesizer),
            SynthesisKind::Simulated => Box::new(SimulatedSynthesizer::new(words_per_minute)),
        }
    }
}
