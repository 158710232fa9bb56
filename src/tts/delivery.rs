//! Where synthesized audio ends up.
//!
//! Served mode stores files under the public directory and hands back a URL;
//! the interactive loop plays through the speakers instead.

use crate::error::{Result, VoxlateError};
use crate::tts::synthesizer::SynthesizedAudio;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Reference to delivered audio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioRef {
    /// Already played on the local output device.
    Played,
    /// Stored and reachable at this URL path.
    Url(String),
}

impl AudioRef {
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Url(url) => Some(url),
            Self::Played => None,
        }
    }
}

/// Trait for handing synthesized audio to its consumer.
#[async_trait]
pub trait AudioDelivery: Send + Sync {
    /// Deliver `audio` under the artifact name `name` (no extension).
    async fn deliver(&self, audio: &SynthesizedAudio, name: &str) -> Result<AudioRef>;
}

/// Writes audio files into a directory served under a URL prefix.
#[derive(Debug, Clone)]
pub struct PublicStore {
    dir: PathBuf,
    url_prefix: String,
}

impl PublicStore {
    pub fn new(dir: impl Into<PathBuf>, url_prefix: &str) -> Self {
        Self {
            dir: dir.into(),
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl AudioDelivery for PublicStore {
    async fn deliver(&self, audio: &SynthesizedAudio, name: &str) -> Result<AudioRef> {
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(VoxlateError::Other(format!(
                "invalid audio artifact name: {name:?}"
            )));
        }

        let file_name = format!("{name}.{}", audio.format.extension());
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(&file_name);
        tokio::fs::write(&path, &audio.bytes).await?;

        tracing::debug!(path = %path.display(), bytes = audio.bytes.len(), "stored synthesized audio");
        Ok(AudioRef::Url(format!("{}/{file_name}", self.url_prefix)))
    }
}

/// Plays audio on the default output device and waits for it to finish.
#[cfg(feature = "playback")]
#[derive(Debug, Default, Clone, Copy)]
pub struct SpeakerPlayback;

#[cfg(feature = "playback")]
impl SpeakerPlayback {
    fn play_blocking(bytes: Vec<u8>) -> Result<()> {
        let playback_err = |message: String| VoxlateError::Playback { message };

        let mut stream = rodio::OutputStreamBuilder::open_default_stream()
            .map_err(|e| playback_err(format!("no output device: {e}")))?;
        stream.log_on_drop(false);

        let sink = rodio::Sink::connect_new(stream.mixer());
        let source = rodio::Decoder::new(std::io::Cursor::new(bytes))
            .map_err(|e| playback_err(format!("undecodable audio: {e}")))?;
        sink.append(source);
        sink.sleep_until_end();
        Ok(())
    }
}

#[cfg(feature = "playback")]
#[async_trait]
impl AudioDelivery for SpeakerPlayback {
    async fn deliver(&self, audio: &SynthesizedAudio, _name: &str) -> Result<AudioRef> {
        let bytes = audio.bytes.clone();
        tokio::task::spawn_blocking(move || Self::play_blocking(bytes))
            .await
            .map_err(|e| VoxlateError::Playback {
                message: format!("playback task failed: {e}"),
            })??;
        Ok(AudioRef::Played)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tts::synthesizer::AudioFormat;

    fn mp3(bytes: &[u8]) -> SynthesizedAudio {
        SynthesizedAudio {
            bytes: bytes.to_vec(),
            format: AudioFormat::Mp3,
        }
    }

    #[tokio::test]
    async fn test_public_store_writes_file_and_returns_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = PublicStore::new(dir.path().join("audio"), "/static/audio/");

        let reference = store.deliver(&mp3(b"ID3"), "preview_hi").await.unwrap();

        assert_eq!(
            reference,
            AudioRef::Url("/static/audio/preview_hi.mp3".to_string())
        );
        let written = std::fs::read(dir.path().join("audio/preview_hi.mp3")).unwrap();
        assert_eq!(written, b"ID3");
    }

    #[tokio::test]
    async fn test_public_store_overwrites_same_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = PublicStore::new(dir.path(), "/static");

        store.deliver(&mp3(b"first"), "preview_en").await.unwrap();
        store.deliver(&mp3(b"second"), "preview_en").await.unwrap();

        let written = std::fs::read(dir.path().join("preview_en.mp3")).unwrap();
        assert_eq!(written, b"second");
    }

    #[tokio::test]
    async fn test_public_store_rejects_path_like_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = PublicStore::new(dir.path(), "/static");

        for name in ["", "../escape", "a/b", ".hidden"] {
            assert!(store.deliver(&mp3(b"x"), name).await.is_err(), "{name}");
        }
    }

    #[test]
    fn test_audio_ref_url() {
        assert_eq!(AudioRef::Url("/a.mp3".into()).url(), Some("/a.mp3"));
        assert_eq!(AudioRef::Played.url(), None);
    }
}
