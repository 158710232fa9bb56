//! Error types for voxlate.

use thiserror::Error;

/// Why a WAV upload was rejected before any service was called.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WavRejection {
    /// The RIFF/fmt header could not be parsed at all.
    #[error("{0}")]
    UnreadableHeader(String),
    /// Channel count outside {1, 2}.
    #[error("must be mono or stereo")]
    UnsupportedChannels(u16),
    /// Sample width in bytes other than 2.
    #[error("must be 16-bit")]
    UnsupportedSampleWidth(u16),
}

#[derive(Error, Debug)]
pub enum VoxlateError {
    // Pipeline errors, one per stage
    #[error("Invalid WAV file: {0}")]
    InvalidFormat(WavRejection),

    #[error("Could not understand audio")]
    RecognitionFailed { detail: String },

    #[error("Translation failed")]
    TranslationFailed { detail: String },

    #[error("Speech synthesis failed: {message}")]
    SynthesisFailed { message: String },

    // Input errors outside the main pipeline
    #[error("Unsupported language code: {code}")]
    UnsupportedLanguage { code: String },

    #[error("No text provided")]
    EmptyText,

    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    // Audio device errors
    #[error("Audio device not found: {device}")]
    AudioDeviceNotFound { device: String },

    #[error("Audio capture failed: {message}")]
    AudioCapture { message: String },

    #[error("Audio playback failed: {message}")]
    Playback { message: String },

    // Transport errors from backend services
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl VoxlateError {
    pub(crate) fn recognition(detail: impl Into<String>) -> Self {
        Self::RecognitionFailed {
            detail: detail.into(),
        }
    }

    pub(crate) fn translation(detail: impl Into<String>) -> Self {
        Self::TranslationFailed {
            detail: detail.into(),
        }
    }

    pub(crate) fn synthesis(message: impl Into<String>) -> Self {
        Self::SynthesisFailed {
            message: message.into(),
        }
    }

    /// Detail attached to a failed stage, for logs. Falls back to the display string.
    pub fn detail(&self) -> String {
        match self {
            Self::RecognitionFailed { detail } | Self::TranslationFailed { detail } => {
                detail.clone()
            }
            other => other.to_string(),
        }
    }

    /// True for errors caused by the caller's input rather than a backend fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidFormat(_)
                | Self::RecognitionFailed { .. }
                | Self::TranslationFailed { .. }
                | Self::UnsupportedLanguage { .. }
                | Self::EmptyText
        )
    }
}

pub type Result<T> = std::result::Result<T, VoxlateError>;
