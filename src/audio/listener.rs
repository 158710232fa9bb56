//! Utterance capture for the interactive loop.
//!
//! Calibrates a speech threshold from ambient noise, waits for speech to
//! start, and records until a stretch of trailing silence. The result is
//! encoded as a WAV [`AudioAsset`] so it goes through the same pipeline as
//! an upload.

use crate::audio::source::AudioSource;
use crate::audio::wav::AudioAsset;
use crate::config::AudioConfig;
use crate::error::{Result, VoxlateError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Silence kept before the first loud frame so soft onsets are not clipped.
const PRE_SPEECH_MS: u32 = 300;

/// Sleep while the device has nothing new for us.
const IDLE_SLEEP: Duration = Duration::from_millis(10);

/// Yields the next spoken utterance.
#[async_trait]
pub trait UtteranceSource: Send {
    /// Next utterance, or `None` when nothing was said before the phrase timeout.
    async fn next_utterance(&mut self) -> Result<Option<AudioAsset>>;
}

/// Thresholds and limits for utterance detection.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    pub calibration_ms: u32,
    pub min_threshold: f32,
    pub ambient_multiplier: f32,
    pub silence_duration_ms: u32,
    pub phrase_timeout: Duration,
    pub max_phrase: Duration,
}

impl From<&AudioConfig> for ListenerConfig {
    fn from(audio: &AudioConfig) -> Self {
        Self {
            calibration_ms: audio.calibration_ms,
            min_threshold: audio.min_threshold,
            ambient_multiplier: audio.ambient_multiplier,
            silence_duration_ms: audio.silence_duration_ms,
            phrase_timeout: Duration::from_secs(audio.phrase_timeout_secs),
            max_phrase: Duration::from_secs(audio.max_phrase_secs),
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self::from(&AudioConfig::default())
    }
}

/// RMS level of 16-bit samples, normalised to 0.0..=1.0.
pub fn rms_level(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples
        .iter()
        .map(|&s| {
            let v = f64::from(s) / 32768.0;
            v * v
        })
        .sum();
    (sum / samples.len() as f64).sqrt() as f32
}

fn samples_for(millis: u64, sample_rate: u32) -> usize {
    (u64::from(sample_rate) * millis / 1000) as usize
}

/// Blocking utterance recorder over any [`AudioSource`].
pub struct UtteranceRecorder<A: AudioSource> {
    source: A,
    config: ListenerConfig,
    threshold: Option<f32>,
}

impl<A: AudioSource> UtteranceRecorder<A> {
    pub fn new(source: A, config: ListenerConfig) -> Self {
        Self {
            source,
            config,
            threshold: None,
        }
    }

    /// The calibrated speech threshold, once calibration has run.
    pub fn threshold(&self) -> Option<f32> {
        self.threshold
    }

    /// Measure ambient noise and derive the speech threshold.
    ///
    /// The source is stopped again afterwards.
    pub fn calibrate(&mut self) -> Result<f32> {
        self.source.start()?;
        let result = self.measure_ambient();
        self.source.stop()?;
        result
    }

    fn measure_ambient(&mut self) -> Result<f32> {
        let rate = self.source.sample_rate();
        let wanted = samples_for(u64::from(self.config.calibration_ms), rate);
        let mut ambient = Vec::with_capacity(wanted);
        let mut last_data = Instant::now();

        while ambient.len() < wanted {
            let samples = self.source.read_samples()?;
            if samples.is_empty() {
                if last_data.elapsed() >= self.config.phrase_timeout {
                    break;
                }
                std::thread::sleep(IDLE_SLEEP);
                continue;
            }
            last_data = Instant::now();
            ambient.extend_from_slice(&samples);
        }

        let threshold =
            (rms_level(&ambient) * self.config.ambient_multiplier).max(self.config.min_threshold);
        tracing::debug!(threshold, ambient_samples = ambient.len(), "calibrated speech threshold");
        self.threshold = Some(threshold);
        Ok(threshold)
    }

    /// Record one utterance.
    ///
    /// Calibrates on first use. Audio buffered before the call is discarded.
    /// The source runs only for the duration of the call.
    pub fn record_utterance(&mut self) -> Result<Option<Vec<i16>>> {
        self.source.start()?;
        let result = self.capture_phrase();
        let stopped = self.source.stop();
        let samples = result?;
        stopped?;
        Ok(samples)
    }

    fn capture_phrase(&mut self) -> Result<Option<Vec<i16>>> {
        let threshold = match self.threshold {
            Some(t) => t,
            None => self.measure_ambient()?,
        };
        self.source.read_samples()?;

        let rate = self.source.sample_rate();
        let frame_len = (rate / 100).max(1) as usize;
        let silence_limit = samples_for(u64::from(self.config.silence_duration_ms), rate);
        let wait_limit = samples_for(self.config.phrase_timeout.as_millis() as u64, rate);
        let max_len = samples_for(self.config.max_phrase.as_millis() as u64, rate);
        let pre_roll_len = samples_for(u64::from(PRE_SPEECH_MS), rate);

        let mut pre_roll: VecDeque<i16> = VecDeque::with_capacity(pre_roll_len);
        let mut recorded: Vec<i16> = Vec::new();
        let mut speaking = false;
        let mut waited = 0usize;
        let mut trailing_silence = 0usize;
        let mut last_data = Instant::now();

        loop {
            let samples = self.source.read_samples()?;
            if samples.is_empty() {
                // Device went quiet: give back whatever we have.
                if last_data.elapsed() >= self.config.phrase_timeout {
                    return Ok(speaking.then_some(recorded));
                }
                std::thread::sleep(IDLE_SLEEP);
                continue;
            }
            last_data = Instant::now();

            for frame in samples.chunks(frame_len) {
                let loud = rms_level(frame) >= threshold;

                if !speaking {
                    if loud {
                        speaking = true;
                        recorded.extend(pre_roll.drain(..));
                        recorded.extend_from_slice(frame);
                    } else {
                        waited += frame.len();
                        if waited >= wait_limit {
                            return Ok(None);
                        }
                        pre_roll.extend(frame.iter().copied());
                        while pre_roll.len() > pre_roll_len {
                            pre_roll.pop_front();
                        }
                    }
                    continue;
                }

                recorded.extend_from_slice(frame);
                if loud {
                    trailing_silence = 0;
                } else {
                    trailing_silence += frame.len();
                    if trailing_silence >= silence_limit {
                        return Ok(Some(recorded));
                    }
                }
                if recorded.len() >= max_len {
                    return Ok(Some(recorded));
                }
            }
        }
    }

    pub fn into_source(self) -> A {
        self.source
    }
}

/// Async [`UtteranceSource`] running an [`UtteranceRecorder`] on the blocking pool.
pub struct MicrophoneListener<A: AudioSource + 'static> {
    recorder: Option<UtteranceRecorder<A>>,
}

impl<A: AudioSource + 'static> MicrophoneListener<A> {
    pub fn new(source: A, config: ListenerConfig) -> Self {
        Self {
            recorder: Some(UtteranceRecorder::new(source, config)),
        }
    }
}

#[async_trait]
impl<A: AudioSource + 'static> UtteranceSource for MicrophoneListener<A> {
    async fn next_utterance(&mut self) -> Result<Option<AudioAsset>> {
        let mut recorder = self
            .recorder
            .take()
            .ok_or_else(|| VoxlateError::AudioCapture {
                message: "microphone was lost by an earlier capture".to_string(),
            })?;

        let (recorder, result) = tokio::task::spawn_blocking(move || {
            let result = recorder.record_utterance();
            (recorder, result)
        })
        .await
        .map_err(|e| VoxlateError::AudioCapture {
            message: format!("capture task failed: {e}"),
        })?;

        let rate = recorder.source.sample_rate();
        self.recorder = Some(recorder);

        match result? {
            Some(samples) => Ok(Some(AudioAsset::from_samples(&samples, rate)?)),
            None => Ok(None),
        }
    }
}

/// Replays prepared assets; `None` entries simulate silence.
#[derive(Debug, Default)]
pub struct ScriptedUtterances {
    queue: VecDeque<Option<AudioAsset>>,
}

impl ScriptedUtterances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_utterance(mut self, asset: AudioAsset) -> Self {
        self.queue.push_back(Some(asset));
        self
    }

    pub fn with_silence(mut self) -> Self {
        self.queue.push_back(None);
        self
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

#[async_trait]
impl UtteranceSource for ScriptedUtterances {
    async fn next_utterance(&mut self) -> Result<Option<AudioAsset>> {
        Ok(self.queue.pop_front().flatten())
    }
}
