//! Speech synthesis through the Google Translate `translate_tts` endpoint.
//!
//! The endpoint speaks at most 100 characters per request and answers with
//! MP3. Longer text is split on word boundaries and the MP3 frames of each
//! part are concatenated, which players decode as one stream.

use crate::config::ServicesConfig;
use crate::defaults;
use crate::error::{Result, VoxlateError};
use crate::translate::languages::LanguageCode;
use crate::tts::synthesizer::{AudioFormat, SynthesizedAudio, Synthesizer};
use async_trait::async_trait;
use std::time::Duration;

pub struct GoogleSynthesizer {
    client: reqwest::Client,
    url: String,
}

impl GoogleSynthesizer {
    pub fn from_config(services: &ServicesConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = services.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            client: builder.build()?,
            url: services.synthesis_url.clone(),
        })
    }

    async fn fetch_chunk(
        &self,
        chunk: &str,
        language: &str,
        index: usize,
        total: usize,
    ) -> Result<Vec<u8>> {
        let index = index.to_string();
        let total = total.to_string();
        let textlen = chunk.chars().count().to_string();

        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", language),
                ("q", chunk),
                ("idx", index.as_str()),
                ("total", total.as_str()),
                ("textlen", textlen.as_str()),
            ])
            .send()
            .await
            .map_err(|e| VoxlateError::synthesis(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VoxlateError::synthesis(format!(
                "synthesizer returned {status}"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| VoxlateError::synthesis(format!("failed to read audio: {e}")))?;
        Ok(bytes.to_vec())
    }
}

/// Split text into pieces of at most `max_chars` characters.
///
/// Breaks at whitespace where possible; a single word longer than the limit
/// is cut mid-word.
pub(crate) fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() { word_len } else { word_len + 1 };
        if current_len + needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[async_trait]
impl Synthesizer for GoogleSynthesizer {
    async fn synthesize(&self, text: &str, language: LanguageCode) -> Result<SynthesizedAudio> {
        let chunks = chunk_text(text, defaults::SYNTHESIS_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(VoxlateError::synthesis("nothing to speak"));
        }

        let language = language.google_code();
        tracing::debug!(language = %language, chunks = chunks.len(), "requesting speech");

        let mut bytes = Vec::new();
        for (index, chunk) in chunks.iter().enumerate() {
            bytes.extend(
                self.fetch_chunk(chunk, &language, index, chunks.len())
                    .await?,
            );
        }

        Ok(SynthesizedAudio {
            bytes,
            format: AudioFormat::Mp3,
        })
    }

    fn name(&self) -> &str {
        "google"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_one_chunk() {
        assert_eq!(chunk_text("namaste duniya", 100), vec!["namaste duniya"]);
    }

    #[test]
    fn test_chunks_respect_limit_and_keep_words() {
        let text = "one two three four five six seven";
        let chunks = chunk_text(text, 10);
        assert_eq!(chunks, vec!["one two", "three four", "five six", "seven"]);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
    }

    #[test]
    fn test_long_word_is_split() {
        let chunks = chunk_text("ab abcdefghij cd", 4);
        assert_eq!(chunks, vec!["ab", "abcd", "efgh", "ij", "cd"]);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        // 6 chars per word, 18 bytes
        let chunks = chunk_text("नमस्ते नमस्ते", 6);
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn test_blank_text_has_no_chunks() {
        assert!(chunk_text("   \n", 100).is_empty());
    }

    #[tokio::test]
    async fn test_blank_text_is_synthesis_error() {
        let synthesizer = GoogleSynthesizer::from_config(&ServicesConfig::default()).unwrap();
        let result = synthesizer
            .synthesize("  ", LanguageCode::parse("hi").unwrap())
            .await;
        assert!(matches!(result, Err(VoxlateError::SynthesisFailed { .. })));
    }
}
