//! voxlate - Speak in one language, hear it in another
//!
//! Transcribe → translate → synthesize, driven from the microphone or over HTTP.

// Enforce error handling discipline
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod history;
pub mod interactive;
pub mod output;
pub mod pipeline;
pub mod server;
pub mod stt;
pub mod translate;
pub mod tts;

// Composition root - needs everything
pub mod app;

// Capability traits (transcribe → translate → synthesize → deliver)
pub use audio::listener::UtteranceSource;
pub use audio::source::AudioSource;
pub use history::{HistoryStore, SharedHistory, TranslationRecord};
pub use interactive::CommandSource;
pub use stt::Transcriber;
pub use translate::{LanguageCode, Translator};
pub use tts::{AudioDelivery, AudioRef, Synthesizer};

// Pipeline
pub use pipeline::{Pipeline, PipelineConfig, PipelineOutput, Services, SynthesisPolicy};

// Error handling
pub use error::{Result, VoxlateError};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
