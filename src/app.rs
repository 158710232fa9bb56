//! Application entry points.
//!
//! Wires config into services, delivery and history for each way of
//! running the translator: HTTP server, microphone loop, single file.

use crate::audio::wav;
use crate::config::{Backend, Config};
use crate::defaults;
use crate::error::Result;
use crate::history::{self, JsonHistoryStore, SharedHistory, TranslationRecord};
use crate::pipeline::{Pipeline, PipelineConfig, PipelineOutput, Services, SynthesisPolicy};
use crate::server::{self, AppState};
use crate::stt::{HttpTranscriber, StubTranscriber};
use crate::translate::{GoogleTranslator, LanguageCode, StubTranslator};
use crate::tts::{GoogleSynthesizer, PublicStore, StubSynthesizer};
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Build the three speech services for the configured backend.
pub fn build_services(config: &Config) -> Result<Services> {
    match config.services.backend {
        Backend::Stub => {
            tracing::info!("using offline stub services");
            Ok(Services {
                transcriber: Arc::new(StubTranscriber::new()),
                translator: Arc::new(StubTranslator::new()),
                synthesizer: Arc::new(StubSynthesizer::new()),
            })
        }
        Backend::Remote => Ok(Services {
            transcriber: Arc::new(HttpTranscriber::from_config(
                &config.services,
                &config.translation.source_language,
            )?),
            translator: Arc::new(GoogleTranslator::from_config(&config.services)?),
            synthesizer: Arc::new(GoogleSynthesizer::from_config(&config.services)?),
        }),
    }
}

/// Open the history file named by the config.
pub fn open_history(config: &Config) -> SharedHistory {
    history::shared(JsonHistoryStore::open(config.history_path()))
}

/// Store for generated translations: `<public_dir>/audio`.
fn generated_audio_store(config: &Config) -> PublicStore {
    let prefix = config.server.public_url_prefix.trim_end_matches('/');
    PublicStore::new(
        config.server.public_dir.join(defaults::GENERATED_AUDIO_SUBDIR),
        &format!("{prefix}/{}", defaults::GENERATED_AUDIO_SUBDIR),
    )
}

/// Store for preview clips: the public directory itself.
fn preview_store(config: &Config) -> PublicStore {
    PublicStore::new(
        config.server.public_dir.clone(),
        config.server.public_url_prefix.trim_end_matches('/'),
    )
}

/// Pipeline used by the HTTP server.
///
/// Synthesis failures fail the request; translations reach the history
/// only when `server.record_history` is set.
pub fn server_pipeline(config: &Config, services: Services, history: SharedHistory) -> Pipeline {
    let pipeline_config = PipelineConfig {
        source_language: config.translation.source_language.clone(),
        synthesis: SynthesisPolicy::Required,
        record_history: config.server.record_history,
    };
    Pipeline::new(services, Arc::new(generated_audio_store(config)), pipeline_config)
        .with_preview_delivery(Arc::new(preview_store(config)))
        .with_history(history)
}

/// Run the HTTP server until Ctrl-C.
pub async fn run_serve(config: Config, quiet: bool) -> Result<()> {
    // Fail on a bad default target before accepting requests.
    LanguageCode::parse(&config.translation.target_language)?;

    let services = build_services(&config)?;
    let pipeline = server_pipeline(&config, services, open_history(&config));

    let state = AppState {
        pipeline: Arc::new(pipeline),
        default_target: config.translation.target_language.clone(),
    };
    let router = server::router(state, &config.server);

    let listener = TcpListener::bind(&config.server.bind).await?;
    if !quiet {
        eprintln!(
            "Serving on http://{} (public files from {})",
            listener.local_addr()?,
            config.server.public_dir.display()
        );
    }
    server::serve(listener, router).await
}

/// Validate and translate a single WAV file.
///
/// Audio is written to the public directory and the run is recorded in the
/// history.
pub async fn run_translate_file(config: &Config, path: &Path) -> Result<PipelineOutput> {
    let header = wav::validate_file(path)?;
    tracing::debug!(
        path = %path.display(),
        channels = header.channels,
        frame_rate = header.frame_rate,
        duration_ms = header.duration_ms(),
        "input file accepted"
    );

    let bytes = tokio::fs::read(path).await?;
    let services = build_services(config)?;
    let pipeline_config = PipelineConfig {
        source_language: config.translation.source_language.clone(),
        synthesis: SynthesisPolicy::Required,
        record_history: true,
    };
    let pipeline = Pipeline::new(services, Arc::new(generated_audio_store(config)), pipeline_config)
        .with_history(open_history(config));

    pipeline
        .run(bytes, &config.translation.target_language)
        .await
}

/// Most recent `count` history records, oldest first.
pub async fn recent_history(config: &Config, count: usize) -> Vec<TranslationRecord> {
    let history = open_history(config);
    let store = history.lock().await;
    store.recent(count)
}

/// Run the interactive microphone loop until the user quits.
#[cfg(feature = "cpal-audio")]
pub async fn run_listen(config: Config, quiet: bool) -> Result<()> {
    use crate::audio::capture::CpalAudioSource;
    use crate::audio::listener::{ListenerConfig, MicrophoneListener};
    use crate::interactive::{Controller, ControllerConfig, StdinCommands};
    use crate::output::{ConsoleEvents, render_banner};

    let target = LanguageCode::parse(&config.translation.target_language)?;

    let source = CpalAudioSource::new(config.audio.device.as_deref())?;
    let listener = MicrophoneListener::new(source, ListenerConfig::from(&config.audio));

    let services = build_services(&config)?;
    let history = open_history(&config);
    let pipeline_config = PipelineConfig {
        source_language: config.translation.source_language.clone(),
        synthesis: SynthesisPolicy::BestEffort,
        record_history: true,
    };
    let pipeline = Pipeline::new(services, listen_delivery(&config), pipeline_config)
        .with_history(Arc::clone(&history));

    if !quiet {
        render_banner(&config.translation.source_language, target.name());
    }

    let mut controller = Controller::new(
        Arc::new(pipeline),
        history,
        Box::new(listener),
        Box::new(StdinCommands::spawn()),
        Box::new(ConsoleEvents::new(quiet)),
        ControllerConfig::new(target.code(), &config.interactive, &config.history),
    );
    controller.run().await
}

/// Translations are spoken aloud when playback is available.
#[cfg(all(feature = "cpal-audio", feature = "playback"))]
fn listen_delivery(_config: &Config) -> Arc<dyn crate::tts::AudioDelivery> {
    Arc::new(crate::tts::SpeakerPlayback)
}

#[cfg(all(feature = "cpal-audio", not(feature = "playback")))]
fn listen_delivery(config: &Config) -> Arc<dyn crate::tts::AudioDelivery> {
    Arc::new(generated_audio_store(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VoxlateError;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn offline_config(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.services.backend = Backend::Stub;
        config.server.public_dir = dir.path().join("public");
        config.history.path = Some(dir.path().join("history.json"));
        config
    }

    fn write_wav(path: &Path, channels: u16, bits: u16) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 16000,
            bits_per_sample: bits,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..1600 {
            for _ in 0..channels {
                if bits == 8 {
                    writer.write_sample(0i8).unwrap();
                } else {
                    writer.write_sample(0i16).unwrap();
                }
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_generated_audio_store_layout() {
        let mut config = Config::default();
        config.server.public_dir = PathBuf::from("/srv/public");
        config.server.public_url_prefix = "/static/".to_string();

        let store = generated_audio_store(&config);
        assert_eq!(store.dir(), Path::new("/srv/public/audio"));

        let preview = preview_store(&config);
        assert_eq!(preview.dir(), Path::new("/srv/public"));
    }

    #[tokio::test]
    async fn test_translate_file_offline_records_history() {
        let dir = TempDir::new().unwrap();
        let mut config = offline_config(&dir);
        config.translation.target_language = "fr".to_string();
        let wav_path = dir.path().join("clip.wav");
        write_wav(&wav_path, 1, 16);

        let output = run_translate_file(&config, &wav_path).await.unwrap();

        assert_eq!(output.original_text, "hello world");
        assert_eq!(output.translated_text, "[fr] hello world");
        let url = output.audio.as_ref().and_then(|a| a.url()).unwrap();
        assert!(url.starts_with("/static/audio/translation_"), "got {url}");

        let records = recent_history(&config, 5).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].target_lang, "fr");
    }

    #[tokio::test]
    async fn test_translate_file_rejects_8bit() {
        let dir = TempDir::new().unwrap();
        let config = offline_config(&dir);
        let wav_path = dir.path().join("clip.wav");
        write_wav(&wav_path, 2, 8);

        let err = run_translate_file(&config, &wav_path).await.unwrap_err();
        assert!(matches!(err, VoxlateError::InvalidFormat(_)));
        assert!(recent_history(&config, 5).await.is_empty());
    }

    #[tokio::test]
    async fn test_run_serve_rejects_unknown_default_target() {
        let dir = TempDir::new().unwrap();
        let mut config = offline_config(&dir);
        config.translation.target_language = "klingon".to_string();

        let err = run_serve(config, true).await.unwrap_err();
        assert!(matches!(err, VoxlateError::UnsupportedLanguage { .. }));
    }
}
