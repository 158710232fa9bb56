//! WAV header validation and PCM encoding.
//!
//! Uploads are checked here before any backend sees them. Only the RIFF/fmt
//! header is read; sample data is never decoded.

use crate::error::{Result, VoxlateError, WavRejection};
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;

/// Channel counts accepted for transcription.
const ACCEPTED_CHANNELS: [u16; 2] = [1, 2];

/// Accepted sample width in bytes (16-bit PCM).
const ACCEPTED_SAMPLE_WIDTH: u16 = 2;

/// Header metadata of a WAV file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub channels: u16,
    /// Bytes per sample, rounded up from the bit depth.
    pub sample_width: u16,
    pub frame_rate: u32,
    pub bits_per_sample: u16,
    /// Frames (samples per channel) declared by the data chunk.
    pub frames: u32,
}

impl WavHeader {
    /// Check the header against the supported formats.
    ///
    /// Channels are checked before sample width, so a stereo 8-bit file is
    /// reported as a width problem and a 6-channel 8-bit file as a channel problem.
    pub fn check(&self) -> std::result::Result<(), WavRejection> {
        if !ACCEPTED_CHANNELS.contains(&self.channels) {
            return Err(WavRejection::UnsupportedChannels(self.channels));
        }
        if self.sample_width != ACCEPTED_SAMPLE_WIDTH {
            return Err(WavRejection::UnsupportedSampleWidth(self.sample_width));
        }
        Ok(())
    }

    /// Audio duration in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        if self.frame_rate == 0 {
            return 0;
        }
        u64::from(self.frames) * 1000 / u64::from(self.frame_rate)
    }
}

/// Read the header of a WAV stream without validating its format.
pub fn inspect<R: Read>(reader: R) -> Result<WavHeader> {
    let wav_reader = hound::WavReader::new(reader).map_err(|e| {
        VoxlateError::InvalidFormat(WavRejection::UnreadableHeader(e.to_string()))
    })?;

    let spec = wav_reader.spec();
    Ok(WavHeader {
        channels: spec.channels,
        sample_width: spec.bits_per_sample.div_ceil(8),
        frame_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        frames: wav_reader.duration(),
    })
}

/// Read and validate the header of a WAV stream.
pub fn validate<R: Read>(reader: R) -> Result<WavHeader> {
    let header = inspect(reader)?;
    header.check().map_err(VoxlateError::InvalidFormat)?;
    Ok(header)
}

/// Validate a WAV file on disk. The file is only read.
pub fn validate_file(path: &Path) -> Result<WavHeader> {
    let file = File::open(path)?;
    validate(BufReader::new(file))
}

/// Validated audio ready for transcription.
#[derive(Debug, Clone)]
pub struct AudioAsset {
    bytes: Vec<u8>,
    header: WavHeader,
}

impl AudioAsset {
    /// Validate raw WAV bytes and wrap them.
    pub fn from_wav_bytes(bytes: Vec<u8>) -> Result<Self> {
        let header = validate(Cursor::new(&bytes))?;
        Ok(Self { bytes, header })
    }

    /// Encode 16-bit mono samples into a WAV asset.
    pub fn from_samples(samples: &[i16], sample_rate: u32) -> Result<Self> {
        Self::from_wav_bytes(encode_pcm16(samples, sample_rate)?)
    }

    pub fn header(&self) -> &WavHeader {
        &self.header
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Encode 16-bit mono PCM samples as a complete WAV file.
pub fn encode_pcm16(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let to_error = |e: hound::Error| VoxlateError::Other(format!("Failed to encode WAV: {e}"));

    let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    let mut writer = hound::WavWriter::new(&mut cursor, spec).map_err(to_error)?;
    for &sample in samples {
        writer.write_sample(sample).map_err(to_error)?;
    }
    writer.finalize().map_err(to_error)?;

    Ok(cursor.into_inner())
}

/// Simple linear interpolation resampling.
pub(crate) fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = (source_pos.floor() as usize).min(samples.len() - 1);
            let fraction = source_pos - source_idx as f64;

            if source_idx + 1 >= samples.len() {
                samples[source_idx]
            } else {
                let left = samples[source_idx] as f64;
                let right = samples[source_idx + 1] as f64;
                (left + (right - left) * fraction) as i16
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a canonical 44-byte PCM header followed by `data_len` zero bytes.
    fn raw_wav(channels: u16, bits: u16, sample_rate: u32, data_len: u32) -> Vec<u8> {
        let block_align = channels * bits.div_ceil(8);
        let byte_rate = sample_rate * u32::from(block_align);

        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&byte_rate.to_le_bytes());
        out.extend_from_slice(&block_align.to_le_bytes());
        out.extend_from_slice(&bits.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        out.extend(std::iter::repeat_n(0u8, data_len as usize));
        out
    }

    fn rejection(bytes: Vec<u8>) -> WavRejection {
        match AudioAsset::from_wav_bytes(bytes) {
            Err(VoxlateError::InvalidFormat(r)) => r,
            other => panic!("expected InvalidFormat, got {:?}", other.map(|a| *a.header())),
        }
    }

    #[test]
    fn accepts_mono_16bit() {
        let asset = AudioAsset::from_wav_bytes(raw_wav(1, 16, 16000, 3200)).unwrap();
        assert_eq!(asset.header().channels, 1);
        assert_eq!(asset.header().sample_width, 2);
        assert_eq!(asset.header().frame_rate, 16000);
        assert_eq!(asset.header().frames, 1600);
        assert_eq!(asset.header().duration_ms(), 100);
    }

    #[test]
    fn accepts_stereo_16bit_at_any_rate() {
        for rate in [8000, 22050, 44100, 48000] {
            let header = validate(Cursor::new(raw_wav(2, 16, rate, 0))).unwrap();
            assert_eq!(header.channels, 2);
            assert_eq!(header.frame_rate, rate);
        }
    }

    #[test]
    fn rejects_stereo_8bit_as_width_problem() {
        assert_eq!(
            rejection(raw_wav(2, 8, 16000, 0)),
            WavRejection::UnsupportedSampleWidth(1)
        );
    }

    #[test]
    fn rejects_24_and_32_bit() {
        assert_eq!(
            rejection(raw_wav(1, 24, 16000, 0)),
            WavRejection::UnsupportedSampleWidth(3)
        );
        assert_eq!(
            rejection(raw_wav(1, 32, 16000, 0)),
            WavRejection::UnsupportedSampleWidth(4)
        );
    }

    #[test]
    fn rejects_more_than_two_channels_before_width() {
        assert_eq!(
            rejection(raw_wav(3, 16, 16000, 0)),
            WavRejection::UnsupportedChannels(3)
        );
        assert_eq!(
            rejection(raw_wav(6, 8, 16000, 0)),
            WavRejection::UnsupportedChannels(6)
        );
    }

    #[test]
    fn garbage_is_unreadable_header() {
        let r = rejection(b"definitely not a wav file".to_vec());
        assert!(matches!(r, WavRejection::UnreadableHeader(_)));
    }

    #[test]
    fn empty_input_is_unreadable_header() {
        assert!(matches!(
            rejection(Vec::new()),
            WavRejection::UnreadableHeader(_)
        ));
    }

    #[test]
    fn truncated_header_is_unreadable() {
        let mut bytes = raw_wav(1, 16, 16000, 0);
        bytes.truncate(20);
        assert!(matches!(rejection(bytes), WavRejection::UnreadableHeader(_)));
    }

    #[test]
    fn header_check_matches_validation() {
        for channels in 0..=4u16 {
            for width in 1..=4u16 {
                let header = WavHeader {
                    channels,
                    sample_width: width,
                    frame_rate: 16000,
                    bits_per_sample: width * 8,
                    frames: 0,
                };
                let ok = (channels == 1 || channels == 2) && width == 2;
                assert_eq!(header.check().is_ok(), ok, "{channels}ch/{width}B");
            }
        }
    }

    #[test]
    fn validate_file_does_not_modify_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        let bytes = raw_wav(1, 16, 16000, 320);
        std::fs::write(&path, &bytes).unwrap();

        validate_file(&path).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), bytes);
    }

    #[test]
    fn validate_file_missing_is_io_error() {
        let result = validate_file(Path::new("/tmp/voxlate-missing-clip-98765.wav"));
        assert!(matches!(result, Err(VoxlateError::Io(_))));
    }

    #[test]
    fn encode_pcm16_produces_valid_asset() {
        let samples: Vec<i16> = (0..1600).map(|i| (i % 100) as i16).collect();
        let asset = AudioAsset::from_samples(&samples, 16000).unwrap();

        assert_eq!(asset.header().channels, 1);
        assert_eq!(asset.header().sample_width, 2);
        assert_eq!(asset.header().frames, 1600);
        assert_eq!(asset.bytes().len(), 44 + 3200);
    }

    #[test]
    fn resample_identity_same_rate() {
        let samples = vec![1i16, 2, 3];
        assert_eq!(resample(&samples, 16000, 16000), samples);
    }

    #[test]
    fn resample_downsample_halves_length() {
        let samples = vec![1000i16; 3200];
        let resampled = resample(&samples, 16000, 8000);
        assert_eq!(resampled.len(), 1600);
        assert!(resampled.iter().all(|&s| (999..=1001).contains(&s)));
    }

    #[test]
    fn resample_handles_empty_and_single() {
        assert!(resample(&[], 48000, 16000).is_empty());
        assert_eq!(resample(&[100i16], 16000, 8000), vec![100]);
    }
}
