//! Audio input: WAV validation, capture sources and utterance detection.

#[cfg(feature = "cpal-audio")]
pub mod capture;
pub mod listener;
pub mod source;
pub mod wav;
