//! Audio file I/O
//!
//! WAV import for sample layers and WAV export for rendered soundscapes.
//! Imported audio is converted to 32-bit float and resampled to the
//! engine's rate with linear interpolation.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::engine::buffer::{AudioBuffer, ChannelLayout};
use crate::error::{OverloadError, Result};

/// Export bit depth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitDepth {
    /// 16-bit signed integer PCM
    #[default]
    Int16,
    /// 32-bit float
    Float32,
}

/// Import a WAV file as an engine buffer
///
/// # Arguments
/// * `path` - Path to the WAV file
/// * `target_sample_rate` - Rate the engine renders at
///
/// # Errors
/// * `SampleNotFound` - If the file does not exist
/// * `InvalidAudio` - If the file is unreadable or has more than 2 channels
pub fn import_wav(path: &Path, target_sample_rate: u32) -> Result<AudioBuffer> {
    if !path.exists() {
        return Err(OverloadError::SampleNotFound {
            sample_ref: path.display().to_string(),
        });
    }

    let reader = WavReader::open(path).map_err(|e| OverloadError::InvalidAudio {
        reason: format!("Failed to open WAV file: {}", e),
    })?;

    let spec = reader.spec();
    let channels = spec.channels as usize;
    let layout = ChannelLayout::from_count(channels).ok_or_else(|| OverloadError::InvalidAudio {
        reason: format!("{}-channel audio (only mono/stereo supported)", channels),
    })?;

    let interleaved = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)?;
    let mut buffer = AudioBuffer::from_interleaved(&interleaved, layout, spec.sample_rate)?;

    if spec.sample_rate != target_sample_rate {
        let ratio = target_sample_rate as f64 / spec.sample_rate as f64;
        buffer.samples = buffer
            .samples
            .iter()
            .map(|channel| resample_linear(channel, ratio))
            .collect();
        buffer.sample_rate = target_sample_rate;
    }

    Ok(buffer)
}

/// Write a buffer to a WAV file
///
/// Samples are clamped to [-1, 1] before integer conversion.
pub fn export_wav(buffer: &AudioBuffer, path: &Path, bit_depth: BitDepth) -> Result<()> {
    let spec = WavSpec {
        channels: buffer.num_channels() as u16,
        sample_rate: buffer.sample_rate,
        bits_per_sample: match bit_depth {
            BitDepth::Int16 => 16,
            BitDepth::Float32 => 32,
        },
        sample_format: match bit_depth {
            BitDepth::Int16 => SampleFormat::Int,
            BitDepth::Float32 => SampleFormat::Float,
        },
    };

    let mut writer = WavWriter::create(path, spec)?;
    write_samples(&mut writer, buffer, bit_depth)?;
    writer.finalize()?;
    Ok(())
}

/// Streaming WAV writer for renders that arrive block by block
pub struct WavSink {
    writer: WavWriter<std::io::BufWriter<std::fs::File>>,
    bit_depth: BitDepth,
    frames_written: u64,
}

impl WavSink {
    /// Create a stereo sink at the given sample rate
    pub fn create(path: &Path, sample_rate: u32, bit_depth: BitDepth) -> Result<Self> {
        let spec = WavSpec {
            channels: 2,
            sample_rate,
            bits_per_sample: match bit_depth {
                BitDepth::Int16 => 16,
                BitDepth::Float32 => 32,
            },
            sample_format: match bit_depth {
                BitDepth::Int16 => SampleFormat::Int,
                BitDepth::Float32 => SampleFormat::Float,
            },
        };
        Ok(Self {
            writer: WavWriter::create(path, spec)?,
            bit_depth,
            frames_written: 0,
        })
    }

    /// Append one rendered block
    pub fn write(&mut self, buffer: &AudioBuffer) -> Result<()> {
        write_samples(&mut self.writer, buffer, self.bit_depth)?;
        self.frames_written += buffer.num_samples() as u64;
        Ok(())
    }

    /// Frames appended so far
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Flush the header and close the file
    pub fn finalize(self) -> Result<()> {
        self.writer.finalize()?;
        Ok(())
    }
}

// ============================================================================
// Internal helper functions
// ============================================================================

fn write_samples<W: std::io::Write + std::io::Seek>(
    writer: &mut WavWriter<W>,
    buffer: &AudioBuffer,
    bit_depth: BitDepth,
) -> Result<()> {
    for sample in buffer.to_interleaved() {
        match bit_depth {
            BitDepth::Int16 => {
                let scaled = (sample.clamp(-1.0, 1.0) * 32767.0) as i16;
                writer.write_sample(scaled)?;
            }
            BitDepth::Float32 => writer.write_sample(sample)?,
        }
    }
    Ok(())
}

/// Read samples from WAV reader and convert to f32
fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    let invalid = |e: hound::Error| OverloadError::InvalidAudio {
        reason: format!("Failed to read {}-bit samples: {}", bits_per_sample, e),
    };

    match (sample_format, bits_per_sample) {
        (SampleFormat::Float, _) => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(invalid),
        (SampleFormat::Int, 8) => reader
            .samples::<i8>()
            .map(|s| s.map(|v| v as f32 / 128.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(invalid),
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / 32768.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(invalid),
        (SampleFormat::Int, 24) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 8388608.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(invalid),
        (SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 2147483648.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(invalid),
        (SampleFormat::Int, bits) => Err(OverloadError::InvalidAudio {
            reason: format!("{}-bit integer audio is not supported", bits),
        }),
    }
}

/// Linear interpolation resampling
fn resample_linear(samples: &[f32], ratio: f64) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }

    let source_len = samples.len();
    let target_len = ((source_len as f64) * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(target_len);

    for i in 0..target_len {
        let src_pos = i as f64 / ratio;
        let src_idx = src_pos.floor() as usize;
        let frac = (src_pos - src_idx as f64) as f32;

        let sample = if src_idx + 1 < source_len {
            samples[src_idx] * (1.0 - frac) + samples[src_idx + 1] * frac
        } else if src_idx < source_len {
            samples[src_idx]
        } else {
            0.0
        };

        output.push(sample);
    }

    output
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use tempfile::tempdir;

    fn ramp_buffer(num_samples: usize, sample_rate: u32) -> AudioBuffer {
        let mut buffer = AudioBuffer::new(num_samples, ChannelLayout::Stereo, sample_rate);
        for i in 0..num_samples {
            let value = i as f32 / num_samples as f32 - 0.5;
            buffer.set_sample(0, i, value);
            buffer.set_sample(1, i, -value);
        }
        buffer
    }

    #[test]
    fn test_export_import_float() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ramp.wav");
        let buffer = ramp_buffer(480, 48000);

        export_wav(&buffer, &path, BitDepth::Float32).unwrap();
        let loaded = import_wav(&path, 48000).unwrap();

        assert_eq!(loaded.num_channels(), 2);
        assert_eq!(loaded.num_samples(), 480);
        assert_abs_diff_eq!(loaded.get_sample(0, 100).unwrap(), buffer.get_sample(0, 100).unwrap());
    }

    #[test]
    fn test_import_resamples() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("half_rate.wav");
        export_wav(&ramp_buffer(240, 24000), &path, BitDepth::Int16).unwrap();

        let loaded = import_wav(&path, 48000).unwrap();
        assert_eq!(loaded.sample_rate, 48000);
        assert_eq!(loaded.num_samples(), 480);
    }

    #[test]
    fn test_import_missing_file() {
        let result = import_wav(Path::new("/definitely/not/here.wav"), 48000);
        assert!(matches!(result, Err(OverloadError::SampleNotFound { .. })));
    }

    #[test]
    fn test_sink_counts_frames() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sink.wav");
        let mut sink = WavSink::create(&path, 48000, BitDepth::Int16).unwrap();

        sink.write(&ramp_buffer(128, 48000)).unwrap();
        sink.write(&ramp_buffer(64, 48000)).unwrap();
        assert_eq!(sink.frames_written(), 192);
        sink.finalize().unwrap();

        let loaded = import_wav(&path, 48000).unwrap();
        assert_eq!(loaded.num_samples(), 192);
    }
}
