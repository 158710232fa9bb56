//! Default configuration constants for voxlate.
//!
//! Shared by the config types, the HTTP server and the interactive loop so
//! the same values are used everywhere.

/// Sample rate used for microphone capture and encoded utterances.
pub const SAMPLE_RATE: u32 = 16000;

/// Target language when a request does not name one.
pub const DEFAULT_TARGET_LANGUAGE: &str = "hi";

/// Language assumed for recognition and recorded as the source language
/// when the translator does not report what it detected.
pub const DEFAULT_SOURCE_LANGUAGE: &str = "en";

/// Language used by `/preview` when the body does not name one.
pub const DEFAULT_PREVIEW_LANGUAGE: &str = "en";

/// Address the HTTP server binds to.
pub const DEFAULT_BIND: &str = "127.0.0.1:5000";

/// Maximum accepted upload size (16 MiB).
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Directory served under [`PUBLIC_URL_PREFIX`].
pub const PUBLIC_DIR: &str = "static";

/// URL prefix for files in the public directory.
pub const PUBLIC_URL_PREFIX: &str = "/static";

/// Subdirectory of the public directory that receives generated translations.
pub const GENERATED_AUDIO_SUBDIR: &str = "audio";

/// Number of history entries shown by the `h` key and `voxlate history`.
pub const RECENT_HISTORY_COUNT: usize = 5;

/// Sleep between iterations of the interactive loop.
pub const POLL_INTERVAL_MS: u64 = 500;

/// Extra sleep after an iteration that ended in an error.
pub const ERROR_BACKOFF_MS: u64 = 1000;

/// Ambient audio sampled before listening, to set the speech threshold.
pub const CALIBRATION_MS: u32 = 500;

/// Floor for the calibrated speech threshold (RMS, 0.0 to 1.0).
pub const MIN_SPEECH_THRESHOLD: f32 = 0.02;

/// Calibrated threshold = ambient RMS × this factor.
pub const AMBIENT_MULTIPLIER: f32 = 1.5;

/// Trailing silence that ends an utterance.
pub const SILENCE_DURATION_MS: u32 = 800;

/// How long to wait for speech to start before giving control back to the loop.
pub const PHRASE_TIMEOUT_SECS: u64 = 5;

/// Hard cap on a single utterance.
pub const MAX_PHRASE_SECS: u64 = 30;

/// Recognition model name sent to OpenAI-compatible transcription servers.
pub const TRANSCRIPTION_MODEL: &str = "whisper-1";

/// Local OpenAI-compatible transcription endpoint.
pub const TRANSCRIPTION_URL: &str = "http://127.0.0.1:8000/v1/audio/transcriptions";

/// Public Google translate endpoint (the `gtx` client).
pub const TRANSLATION_URL: &str = "https://translate.googleapis.com/translate_a/single";

/// Public Google text-to-speech endpoint.
pub const SYNTHESIS_URL: &str = "https://translate.google.com/translate_tts";

/// Longest text the synthesis endpoint accepts per request.
pub const SYNTHESIS_CHUNK_CHARS: usize = 100;

/// History file name inside the data directory.
pub const HISTORY_FILE_NAME: &str = "history.json";
