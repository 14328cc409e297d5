// Synthesizer that logs utterances instead of producing audio

use anyhow::Result;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use super::backend::{PlaybackEvent, SynthesisBackend, Utterance};

/// Synthesis backend that "plays" text for as long as reading it aloud would take
///
/// Used where no audio device is attached (server, console, tests). The
/// playback duration follows from the word count and `words_per_minute`.
pub struct SimulatedSynthesizer {
    words_per_minute: u32,
    playback: Option<JoinHandle<()>>,
}

impl SimulatedSynthesizer {
    pub fn new(words_per_minute: u32) -> Self {
        Self {
            words_per_minute: words_per_minute.max(1),
            playback: None,
        }
    }

    pub fn playback_duration(&self, text: &str) -> Duration {
        let words = text.split_whitespace().count() as u64;
        Duration::from_millis(words * 60_000 / self.words_per_minute as u64)
    }
}

#[async_trait::async_trait]
impl SynthesisBackend for SimulatedSynthesizer {
    async fn speak(
        &mut self,
        utterance: Utterance,
        events: mpsc::UnboundedSender<PlaybackEvent>,
    ) -> Result<()> {
        self.cancel().await?;

        let duration = self.playback_duration(&utterance.text);
        info!("Speaking ({:.1}s): {}", duration.as_secs_f64(), utterance.text);

        let id = utterance.id;
        self.playback = Some(tokio::spawn(async move {
            if events.send(PlaybackEvent::Started { utterance: id }).is_err() {
                return;
            }
            tokio::time::sleep(duration).await;
            let _ = events.send(PlaybackEvent::Finished { utterance: id });
        }));

        Ok(())
    }

    async fn cancel(&mut self) -> Result<()> {
        if let Some(playback) = self.playback.take() {
            playback.abort();
        }
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "simulated"
    }
}

impl Drop for SimulatedSynthesizer {
    fn drop(&mut self) {
        if let Some(playback) = self.playback.take() {
            playback.abort();
        }
    }
}
