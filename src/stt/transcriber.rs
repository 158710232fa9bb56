use crate::audio::wav::AudioAsset;
use crate::error::{Result, VoxlateError};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Trait for speech-to-text transcription.
///
/// Allows swapping a network recognizer for a deterministic stub.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe a validated WAV asset to text.
    ///
    /// An empty string means the recognizer heard nothing intelligible.
    async fn transcribe(&self, audio: &AudioAsset) -> Result<String>;

    /// Name of the backend, for logs
    fn name(&self) -> &str;
}

/// Implement Transcriber for Arc<T> so one instance can serve many pipelines.
#[async_trait]
impl<T: Transcriber + ?Sized> Transcriber for Arc<T> {
    async fn transcribe(&self, audio: &AudioAsset) -> Result<String> {
        (**self).transcribe(audio).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Offline transcriber returning a fixed response.
#[derive(Debug)]
pub struct StubTranscriber {
    response: String,
    should_fail: bool,
    calls: AtomicUsize,
}

impl StubTranscriber {
    pub fn new() -> Self {
        Self {
            response: "hello world".to_string(),
            should_fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Configure the stub to return a specific response
    pub fn with_response(mut self, response: &str) -> Self {
        self.response = response.to_string();
        self
    }

    /// Configure the stub to fail on transcribe
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Number of transcribe calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for StubTranscriber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transcriber for StubTranscriber {
    async fn transcribe(&self, _audio: &AudioAsset) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            return Err(VoxlateError::recognition("stub recognizer unavailable"));
        }
        Ok(self.response.clone())
    }

    fn name(&self) -> &str {
        "stub"
    }
}
