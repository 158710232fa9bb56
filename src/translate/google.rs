//! Translation through the public Google Translate `gtx` endpoint.

use crate::config::ServicesConfig;
use crate::error::{Result, VoxlateError};
use crate::translate::languages::LanguageCode;
use crate::translate::translator::{Translation, Translator};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

pub struct GoogleTranslator {
    client: reqwest::Client,
    url: String,
}

impl GoogleTranslator {
    pub fn from_config(services: &ServicesConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = services.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            client: builder.build()?,
            url: services.translation_url.clone(),
        })
    }
}

/// Extract the translation from a `gtx` response.
///
/// The body is a nested array: element 0 holds one `[translated, original, ...]`
/// entry per sentence, element 2 the detected source language.
pub(crate) fn parse_gtx_response(body: &Value) -> Result<Translation> {
    let sentences = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| VoxlateError::translation("response has no sentence list"))?;

    let text: String = sentences
        .iter()
        .filter_map(|sentence| sentence.get(0).and_then(Value::as_str))
        .collect();

    let source_language = body
        .get(2)
        .and_then(Value::as_str)
        .map(|code| code.to_ascii_lowercase());

    Ok(Translation {
        text: text.trim().to_string(),
        source_language,
    })
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, target: LanguageCode) -> Result<Translation> {
        let target_code = target.google_code();
        tracing::debug!(target_lang = %target_code, chars = text.chars().count(), "requesting translation");

        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", target_code.as_str()),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| VoxlateError::translation(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VoxlateError::translation(format!(
                "translator returned {status}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| VoxlateError::translation(format!("malformed response: {e}")))?;

        parse_gtx_response(&body)
    }

    fn name(&self) -> &str {
        "google"
    }
}
