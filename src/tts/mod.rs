//! Text-to-speech backends and delivery of the synthesized audio.

pub mod delivery;
pub mod google;
pub mod synthesizer;

pub use delivery::{AudioDelivery, AudioRef, PublicStore};
#[cfg(feature = "playback")]
pub use delivery::SpeakerPlayback;
pub use google::GoogleSynthesizer;
pub use synthesizer::{AudioFormat, StubSynthesizer, SynthesizedAudio, Synthesizer};
