use crate::audio::wav::encode_pcm16;
use crate::defaults;
use crate::error::{Result, VoxlateError};
use crate::translate::languages::LanguageCode;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Container format of synthesized speech.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Wav,
}

impl AudioFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::Wav => "audio/wav",
        }
    }
}

/// Encoded speech ready to be stored or played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedAudio {
    pub bytes: Vec<u8>,
    pub format: AudioFormat,
}

/// Trait for text-to-speech synthesis.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, language: LanguageCode) -> Result<SynthesizedAudio>;

    /// Name of the backend, for logs
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: Synthesizer + ?Sized> Synthesizer for Arc<T> {
    async fn synthesize(&self, text: &str, language: LanguageCode) -> Result<SynthesizedAudio> {
        (**self).synthesize(text, language).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Silence per character of input, so longer text gives longer audio.
const STUB_MS_PER_CHAR: usize = 10;

/// Offline synthesizer producing silent WAV audio.
#[derive(Debug, Default)]
pub struct StubSynthesizer {
    should_fail: bool,
    calls: AtomicUsize,
}

impl StubSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the stub to fail on synthesize
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Synthesizer for StubSynthesizer {
    async fn synthesize(&self, text: &str, _language: LanguageCode) -> Result<SynthesizedAudio> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            return Err(VoxlateError::synthesis("stub synthesizer unavailable"));
        }
        let millis = text.chars().count() * STUB_MS_PER_CHAR;
        let samples = vec![0i16; defaults::SAMPLE_RATE as usize * millis / 1000];
        Ok(SynthesizedAudio {
            bytes: encode_pcm16(&samples, defaults::SAMPLE_RATE)?,
            format: AudioFormat::Wav,
        })
    }

    fn name(&self) -> &str {
        "stub"
    }
}
