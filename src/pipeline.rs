//! Transcribe → translate → synthesize → record.
//!
//! Each stage runs only if the previous one succeeded. The first failing
//! stage decides the error kind, so callers can tell "could not understand"
//! from "translation failed" without looking at backend details.

use crate::audio::wav::AudioAsset;
use crate::defaults;
use crate::error::{Result, VoxlateError};
use crate::history::{SharedHistory, TranslationRecord};
use crate::stt::Transcriber;
use crate::translate::{LanguageCode, Translator};
use crate::tts::{AudioDelivery, Synthesizer};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

pub use crate::tts::AudioRef;

/// Source of history timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// What a synthesis failure does to the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisPolicy {
    /// The run fails with `SynthesisFailed`.
    Required,
    /// The run succeeds without audio and a warning is logged.
    BestEffort,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Recorded as the source language when the translator does not detect one.
    pub source_language: String,
    pub synthesis: SynthesisPolicy,
    /// Append a history record for every run that produced audio.
    pub record_history: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_language: defaults::DEFAULT_SOURCE_LANGUAGE.to_string(),
            synthesis: SynthesisPolicy::Required,
            record_history: false,
        }
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineOutput {
    pub original_text: String,
    pub translated_text: String,
    pub source_lang: String,
    pub target_lang: String,
    /// `None` only when synthesis failed under [`SynthesisPolicy::BestEffort`].
    pub audio: Option<AudioRef>,
}

/// The three speech services a pipeline drives.
#[derive(Clone)]
pub struct Services {
    pub transcriber: Arc<dyn Transcriber>,
    pub translator: Arc<dyn Translator>,
    pub synthesizer: Arc<dyn Synthesizer>,
}

pub struct Pipeline {
    services: Services,
    delivery: Arc<dyn AudioDelivery>,
    preview_delivery: Option<Arc<dyn AudioDelivery>>,
    history: Option<SharedHistory>,
    clock: Arc<dyn Clock>,
    config: PipelineConfig,
    sequence: AtomicU64,
}

impl Pipeline {
    pub fn new(services: Services, delivery: Arc<dyn AudioDelivery>, config: PipelineConfig) -> Self {
        Self {
            services,
            delivery,
            preview_delivery: None,
            history: None,
            clock: Arc::new(SystemClock),
            config,
            sequence: AtomicU64::new(0),
        }
    }

    /// History that successful runs are appended to when recording is enabled.
    pub fn with_history(mut self, history: SharedHistory) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Separate delivery for [`Pipeline::preview`]; defaults to the main one.
    pub fn with_preview_delivery(mut self, delivery: Arc<dyn AudioDelivery>) -> Self {
        self.preview_delivery = Some(delivery);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Validate raw WAV bytes, then run the whole pipeline.
    ///
    /// Invalid audio is rejected before any service is called.
    pub async fn run(&self, audio_bytes: Vec<u8>, target_lang: &str) -> Result<PipelineOutput> {
        let asset = AudioAsset::from_wav_bytes(audio_bytes)?;
        tracing::debug!(
            channels = asset.header().channels,
            rate = asset.header().frame_rate,
            duration_ms = asset.header().duration_ms(),
            "audio validated"
        );
        self.run_asset(&asset, target_lang).await
    }

    /// Run the pipeline on audio that is already validated.
    pub async fn run_asset(&self, asset: &AudioAsset, target_lang: &str) -> Result<PipelineOutput> {
        let original_text = self
            .services
            .transcriber
            .transcribe(asset)
            .await
            .map_err(as_recognition)?;
        let original_text = original_text.trim().to_string();
        if original_text.is_empty() {
            return Err(VoxlateError::recognition("no intelligible speech"));
        }
        tracing::debug!(backend = self.services.transcriber.name(), text = %original_text, "transcribed");

        let target = LanguageCode::parse(target_lang).map_err(as_translation)?;
        let translation = self
            .services
            .translator
            .translate(&original_text, target)
            .await
            .map_err(as_translation)?;
        let translated_text = translation.text.trim().to_string();
        if translated_text.is_empty() {
            return Err(VoxlateError::translation("translator returned no text"));
        }
        tracing::debug!(backend = self.services.translator.name(), text = %translated_text, "translated");

        let source_lang = translation
            .source_language
            .unwrap_or_else(|| self.config.source_language.clone());

        let name = self.artifact_name(target);
        let audio = match self.speak(&translated_text, target, &self.delivery, &name).await {
            Ok(reference) => Some(reference),
            Err(e) => match self.config.synthesis {
                SynthesisPolicy::Required => return Err(e),
                SynthesisPolicy::BestEffort => {
                    tracing::warn!("continuing without audio: {e}");
                    None
                }
            },
        };

        let output = PipelineOutput {
            original_text,
            translated_text,
            source_lang,
            target_lang: target.code().to_string(),
            audio,
        };

        // Degraded runs without audio are not completed translations.
        if output.audio.is_some() {
            self.record(&output).await;
        }
        tracing::info!(
            source_lang = %output.source_lang,
            target_lang = %output.target_lang,
            audio = output.audio.is_some(),
            "translation complete"
        );
        Ok(output)
    }

    /// Speak `text` in `language` into the fixed artifact `preview_<lang>`.
    pub async fn preview(&self, text: &str, language: &str) -> Result<AudioRef> {
        let text = text.trim();
        if text.is_empty() {
            return Err(VoxlateError::EmptyText);
        }
        let language = LanguageCode::parse(language)?;
        let delivery = self.preview_delivery.as_ref().unwrap_or(&self.delivery);
        self.speak(text, language, delivery, &format!("preview_{language}"))
            .await
    }

    async fn speak(
        &self,
        text: &str,
        language: LanguageCode,
        delivery: &Arc<dyn AudioDelivery>,
        name: &str,
    ) -> Result<AudioRef> {
        let audio = self
            .services
            .synthesizer
            .synthesize(text, language)
            .await
            .map_err(as_synthesis)?;
        tracing::debug!(
            backend = self.services.synthesizer.name(),
            bytes = audio.bytes.len(),
            "synthesized"
        );
        delivery.deliver(&audio, name).await.map_err(as_synthesis)
    }

    async fn record(&self, output: &PipelineOutput) {
        if !self.config.record_history {
            return;
        }
        let Some(history) = &self.history else {
            return;
        };

        let record = TranslationRecord {
            timestamp: self.clock.now(),
            original_text: output.original_text.clone(),
            translated_text: output.translated_text.clone(),
            source_lang: output.source_lang.clone(),
            target_lang: output.target_lang.clone(),
        };
        // File-backed stores write synchronously under the lock.
        let history = Arc::clone(history);
        let saved =
            tokio::task::spawn_blocking(move || history.blocking_lock().append(record)).await;
        match saved {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("failed to save translation history: {e}"),
            Err(e) => tracing::error!("history task failed: {e}"),
        }
    }

    fn artifact_name(&self, language: LanguageCode) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!(
            "translation_{}_{seq}_{language}",
            self.clock.now().format("%Y%m%d%H%M%S%3f")
        )
    }
}

fn as_recognition(e: VoxlateError) -> VoxlateError {
    match e {
        e @ VoxlateError::RecognitionFailed { .. } => e,
        other => VoxlateError::recognition(other.to_string()),
    }
}

fn as_translation(e: VoxlateError) -> VoxlateError {
    match e {
        e @ VoxlateError::TranslationFailed { .. } => e,
        other => VoxlateError::translation(other.to_string()),
    }
}

fn as_synthesis(e: VoxlateError) -> VoxlateError {
    match e {
        e @ VoxlateError::SynthesisFailed { .. } => e,
        other => VoxlateError::synthesis(other.to_string()),
    }
}
