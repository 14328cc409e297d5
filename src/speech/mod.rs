//! Voice input and output
//!
//! Adapters over the platform speech capabilities:
//! - `SpeechInputAdapter` buffers finalized recognition results
//! - `SpeechOutputAdapter` speaks interviewer replies, one at a time
//!
//! A missing capability degrades the adapter to a permanently disabled
//! state instead of failing.

pub mod backend;
pub mod input;
pub mod output;
pub mod push;
pub mod simulated;

pub use backend::{
    PlaybackEvent, RecognitionBackend, RecognitionEvent, RecognitionKind, SpeechBackendFactory,
    SynthesisBackend, SynthesisKind, UnavailableRecognizer, UnavailableSynthesizer, Utterance,
};
pub use input::{CaptureState, SpeechInputAdapter};
pub use output::{PlaybackState, SpeechOutputAdapter};
pub use push::{PushRecognizer, RecognitionFeed};
pub use simulated::SimulatedSynthesizer;
