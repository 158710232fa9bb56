use crate::error::{Result, VoxlateError};
use std::collections::VecDeque;

/// Trait for audio input devices.
///
/// Allows swapping a real microphone for scripted samples in tests.
pub trait AudioSource: Send {
    /// Start capturing audio from the source.
    fn start(&mut self) -> Result<()>;

    /// Stop capturing audio from the source.
    fn stop(&mut self) -> Result<()>;

    /// Drain the samples captured since the last call.
    ///
    /// Returns 16-bit mono PCM at [`AudioSource::sample_rate`]. An empty
    /// vector means nothing new has arrived yet.
    fn read_samples(&mut self) -> Result<Vec<i16>>;

    /// Sample rate of the returned samples.
    fn sample_rate(&self) -> u32;
}

/// Scripted audio source for testing.
///
/// Each `read_samples` call returns the next queued chunk, then empty
/// vectors once the script is exhausted.
#[derive(Debug, Clone)]
pub struct MockAudioSource {
    is_started: bool,
    chunks: VecDeque<Vec<i16>>,
    sample_rate: u32,
    should_fail_start: bool,
    should_fail_read: bool,
    error_message: String,
}

impl MockAudioSource {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            is_started: false,
            chunks: VecDeque::new(),
            sample_rate,
            should_fail_start: false,
            should_fail_read: false,
            error_message: "mock audio error".to_string(),
        }
    }

    /// Queue a chunk of samples.
    pub fn with_chunk(mut self, samples: Vec<i16>) -> Self {
        self.chunks.push_back(samples);
        self
    }

    /// Queue `millis` of a constant-amplitude signal, split into 10 ms chunks.
    pub fn with_signal(mut self, amplitude: i16, millis: u32) -> Self {
        let per_chunk = (self.sample_rate / 100) as usize;
        let total = (self.sample_rate as u64 * u64::from(millis) / 1000) as usize;
        let mut remaining = total;
        while remaining > 0 {
            let n = remaining.min(per_chunk);
            self.chunks.push_back(vec![amplitude; n]);
            remaining -= n;
        }
        self
    }

    /// Configure the mock to fail on start
    pub fn with_start_failure(mut self) -> Self {
        self.should_fail_start = true;
        self
    }

    /// Configure the mock to fail on read
    pub fn with_read_failure(mut self) -> Self {
        self.should_fail_read = true;
        self
    }

    pub fn is_started(&self) -> bool {
        self.is_started
    }

    /// Chunks not yet consumed.
    pub fn remaining_chunks(&self) -> usize {
        self.chunks.len()
    }
}

impl AudioSource for MockAudioSource {
    fn start(&mut self) -> Result<()> {
        if self.should_fail_start {
            return Err(VoxlateError::AudioCapture {
                message: self.error_message.clone(),
            });
        }
        self.is_started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.is_started = false;
        Ok(())
    }

    fn read_samples(&mut self) -> Result<Vec<i16>> {
        if self.should_fail_read {
            return Err(VoxlateError::AudioCapture {
                message: self.error_message.clone(),
            });
        }
        Ok(self.chunks.pop_front().unwrap_or_default())
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_returns_chunks_in_order_then_empty() {
        let mut source = MockAudioSource::new(16000)
            .with_chunk(vec![1, 2])
            .with_chunk(vec![3]);

        assert_eq!(source.read_samples().unwrap(), vec![1, 2]);
        assert_eq!(source.read_samples().unwrap(), vec![3]);
        assert!(source.read_samples().unwrap().is_empty());
    }

    #[test]
    fn test_with_signal_splits_into_10ms_chunks() {
        let source = MockAudioSource::new(16000).with_signal(500, 105);
        // 1680 samples → 10 full chunks of 160 + one of 80
        assert_eq!(source.remaining_chunks(), 11);
    }

    #[test]
    fn test_start_stop_track_state() {
        let mut source = MockAudioSource::new(16000);
        assert!(!source.is_started());
        source.start().unwrap();
        assert!(source.is_started());
        source.stop().unwrap();
        assert!(!source.is_started());
    }

    #[test]
    fn test_failures_are_audio_capture_errors() {
        let mut source = MockAudioSource::new(16000)
            .with_start_failure()
            .with_read_failure();

        assert!(matches!(
            source.start(),
            Err(VoxlateError::AudioCapture { .. })
        ));
        assert!(matches!(
            source.read_samples(),
            Err(VoxlateError::AudioCapture { .. })
        ));
    }

    #[test]
    fn test_audio_source_is_object_safe() {
        let mut source: Box<dyn AudioSource> =
            Box::new(MockAudioSource::new(8000).with_chunk(vec![7]));
        assert_eq!(source.sample_rate(), 8000);
        assert_eq!(source.read_samples().unwrap(), vec![7]);
    }
}
