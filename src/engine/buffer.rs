//! Audio Buffer
//!
//! Planar float buffers passed between the nodes of a layer graph.
//! Channel 0 is left (or mono), channel 1 is right.

use crate::error::{OverloadError, Result};

/// Sample rate nodes assume before `prepare` is called
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

// ============================================================================
// Channel Layout
// ============================================================================

/// Mono or stereo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    Mono,
    Stereo,
}

impl ChannelLayout {
    pub fn num_channels(&self) -> usize {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
        }
    }

    /// Layout for a WAV channel count; anything above stereo is unsupported
    pub fn from_count(count: usize) -> Option<Self> {
        match count {
            1 => Some(ChannelLayout::Mono),
            2 => Some(ChannelLayout::Stereo),
            _ => None,
        }
    }
}

// ============================================================================
// Audio Buffer
// ============================================================================

/// One block (or a whole render) of planar audio
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    /// One `Vec` per channel, all the same length
    pub samples: Vec<Vec<f32>>,
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Silent buffer of `num_samples` frames
    pub fn new(num_samples: usize, layout: ChannelLayout, sample_rate: u32) -> Self {
        Self {
            samples: vec![vec![0.0; num_samples]; layout.num_channels()],
            sample_rate,
        }
    }

    /// Split interleaved frames (as decoded from a WAV file) into channels
    ///
    /// # Errors
    /// `InvalidAudio` if the data does not hold a whole number of frames.
    pub fn from_interleaved(
        interleaved: &[f32],
        layout: ChannelLayout,
        sample_rate: u32,
    ) -> Result<Self> {
        let channels = layout.num_channels();
        if interleaved.len() % channels != 0 {
            return Err(OverloadError::InvalidAudio {
                reason: format!(
                    "{} samples do not split into {} channels",
                    interleaved.len(),
                    channels
                ),
            });
        }

        let mut samples = vec![Vec::with_capacity(interleaved.len() / channels); channels];
        for frame in interleaved.chunks_exact(channels) {
            for (channel, &sample) in samples.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Frames in channel order, ready for a WAV writer
    pub fn to_interleaved(&self) -> Vec<f32> {
        (0..self.num_samples())
            .flat_map(|i| self.samples.iter().map(move |channel| channel[i]))
            .collect()
    }

    #[inline]
    pub fn num_channels(&self) -> usize {
        self.samples.len()
    }

    /// Frames per channel
    #[inline]
    pub fn num_samples(&self) -> usize {
        self.samples.first().map_or(0, Vec::len)
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.num_samples() as f64 / self.sample_rate as f64
    }

    /// Panics if `index` is not a channel
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.samples[index]
    }

    /// Panics if `index` is not a channel
    #[inline]
    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.samples[index]
    }

    pub fn get_sample(&self, channel: usize, index: usize) -> Option<f32> {
        self.samples.get(channel)?.get(index).copied()
    }

    /// Write one sample; out-of-range writes are dropped and return false
    pub fn set_sample(&mut self, channel: usize, index: usize, value: f32) -> bool {
        match self.samples.get_mut(channel).and_then(|ch| ch.get_mut(index)) {
            Some(sample) => {
                *sample = value;
                true
            }
            None => false,
        }
    }

    /// Silence every channel in place
    pub fn clear(&mut self) {
        self.samples.iter_mut().for_each(|channel| channel.fill(0.0));
    }

    /// Grow or shrink every channel; new frames are silent
    pub fn resize(&mut self, num_samples: usize) {
        for channel in &mut self.samples {
            channel.resize(num_samples, 0.0);
        }
    }

    /// Sum `other` into this buffer.
    ///
    /// A mono source feeds every channel. The shorter length wins.
    pub fn mix_from(&mut self, other: &AudioBuffer) {
        let Some(last) = other.num_channels().checked_sub(1) else {
            return;
        };
        for (ch, channel) in self.samples.iter_mut().enumerate() {
            for (dst, src) in channel.iter_mut().zip(&other.samples[ch.min(last)]) {
                *dst += *src;
            }
        }
    }

    /// Largest absolute sample across all channels
    pub fn peak(&self) -> f32 {
        self.samples
            .iter()
            .flatten()
            .fold(0.0_f32, |peak, s| peak.max(s.abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_new_is_silent() {
        let buffer = AudioBuffer::new(64, ChannelLayout::Stereo, 48000);
        assert_eq!(buffer.num_channels(), 2);
        assert_eq!(buffer.num_samples(), 64);
        assert_eq!(buffer.peak(), 0.0);
    }

    #[test]
    fn test_interleaved_conversion() {
        let interleaved = [0.1, -0.1, 0.2, -0.2, 0.3, -0.3];
        let buffer = AudioBuffer::from_interleaved(&interleaved, ChannelLayout::Stereo, 48000)
            .unwrap();
        assert_eq!(buffer.num_samples(), 3);
        assert_eq!(buffer.channel(1), &[-0.1, -0.2, -0.3]);
        assert_eq!(buffer.to_interleaved(), interleaved.to_vec());
    }

    #[test]
    fn test_partial_frame_is_rejected() {
        let result = AudioBuffer::from_interleaved(&[0.1, 0.2, 0.3], ChannelLayout::Stereo, 48000);
        assert!(matches!(result, Err(OverloadError::InvalidAudio { .. })));
    }

    #[test]
    fn test_mix_from_spreads_mono() {
        let mut dst = AudioBuffer::new(4, ChannelLayout::Stereo, 48000);
        let mut src = AudioBuffer::new(4, ChannelLayout::Mono, 48000);
        src.channel_mut(0).fill(0.25);

        dst.mix_from(&src);
        dst.mix_from(&src);

        assert_abs_diff_eq!(dst.get_sample(0, 3).unwrap(), 0.5);
        assert_abs_diff_eq!(dst.get_sample(1, 0).unwrap(), 0.5);
    }

    #[test]
    fn test_peak_and_out_of_range_writes() {
        let mut buffer = AudioBuffer::new(8, ChannelLayout::Stereo, 48000);
        assert!(buffer.set_sample(1, 7, -0.75));
        assert!(!buffer.set_sample(2, 0, 1.0));
        assert!(!buffer.set_sample(0, 8, 1.0));
        assert_eq!(buffer.peak(), 0.75);
    }
}
