//! Transcription over an OpenAI-compatible `/v1/audio/transcriptions` endpoint.
//!
//! Works with hosted Whisper as well as local servers (whisper.cpp server,
//! faster-whisper-server, LocalAI) that speak the same multipart protocol.

use crate::audio::wav::AudioAsset;
use crate::config::ServicesConfig;
use crate::error::{Result, VoxlateError};
use crate::stt::transcriber::Transcriber;
use crate::tts::AudioFormat;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

/// Remote speech recognizer.
pub struct HttpTranscriber {
    client: reqwest::Client,
    url: String,
    model: String,
    language: Option<String>,
    api_key: Option<String>,
}

impl HttpTranscriber {
    pub fn new(url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            model: model.into(),
            language: None,
            api_key: None,
        }
    }

    /// Build from the `[services]` config section.
    pub fn from_config(services: &ServicesConfig, language: &str) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = services.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            client: builder.build()?,
            url: services.transcription_url.clone(),
            model: services.transcription_model.clone(),
            language: Some(language.to_string()),
            api_key: services.api_key.clone(),
        })
    }

    fn form(&self, audio: &AudioAsset) -> Result<Form> {
        let format = AudioFormat::Wav;
        let part = Part::bytes(audio.bytes().to_vec())
            .file_name(format!("utterance.{}", format.extension()))
            .mime_str(format.mime_type())?;

        let mut form = Form::new()
            .part("file", part)
            .text("model", self.model.clone())
            .text("response_format", "json");
        if let Some(language) = &self.language {
            form = form.text("language", language.clone());
        }
        Ok(form)
    }
}

#[async_trait]
impl Transcriber for HttpTranscriber {
    async fn transcribe(&self, audio: &AudioAsset) -> Result<String> {
        let mut request = self.client.post(&self.url).multipart(self.form(audio)?);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        tracing::debug!(
            url = %self.url,
            model = %self.model,
            duration_ms = audio.header().duration_ms(),
            "sending audio for transcription"
        );

        let response = request
            .send()
            .await
            .map_err(|e| VoxlateError::recognition(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VoxlateError::recognition(format!(
                "recognizer returned {status}: {body}"
            )));
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| VoxlateError::recognition(format!("malformed response: {e}")))?;

        Ok(parsed.text.trim().to_string())
    }

    fn name(&self) -> &str {
        &self.model
    }
}
