//! Layer sources
//!
//! Generators that feed a layer's chain: a sine oscillator, pink noise and a
//! one-shot sample player. Sources are mono and write the same signal to
//! every channel of the block. A stopped source renders silence.

use crate::engine::AudioBuffer;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::f64::consts::TAU;
use std::sync::Arc;

/// Oscillator frequency used when a layer spec gives none
pub const DEFAULT_FREQUENCY_HZ: f32 = 440.0;

/// Output scale for the pink noise filter bank
const PINK_NOISE_GAIN: f32 = 0.25;

// ============================================================================
// Oscillator
// ============================================================================

/// Sine oscillator
#[derive(Debug, Clone)]
pub struct Oscillator {
    frequency: f32,
    phase: f64,
}

impl Oscillator {
    pub fn new(frequency: f32) -> Self {
        Self {
            frequency: frequency.max(0.0),
            phase: 0.0,
        }
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    #[inline]
    fn next_sample(&mut self, sample_rate: u32) -> f32 {
        let out = (self.phase * TAU).sin() as f32;
        self.phase = (self.phase + self.frequency as f64 / sample_rate as f64).fract();
        out
    }
}

// ============================================================================
// Pink Noise
// ============================================================================

/// Pink noise from a 3-pole filtered white source (Paul Kellet)
#[derive(Debug, Clone)]
pub struct PinkNoise {
    rng: ChaCha8Rng,
    b0: f32,
    b1: f32,
    b2: f32,
}

impl PinkNoise {
    /// Create a generator drawing from `rng`
    pub fn new(rng: ChaCha8Rng) -> Self {
        Self {
            rng,
            b0: 0.0,
            b1: 0.0,
            b2: 0.0,
        }
    }

    #[inline]
    fn next_sample(&mut self) -> f32 {
        let white: f32 = self.rng.gen_range(-1.0..1.0);
        self.b0 = 0.99765 * self.b0 + white * 0.099_046;
        self.b1 = 0.96300 * self.b1 + white * 0.296_516_4;
        self.b2 = 0.57000 * self.b2 + white * 1.052_691_3;
        (self.b0 + self.b1 + self.b2 + white * 0.1848) * PINK_NOISE_GAIN
    }
}

// ============================================================================
// Sample Player
// ============================================================================

/// One-shot player over a shared mono sample
#[derive(Debug, Clone)]
pub struct SamplePlayer {
    sample: Arc<[f32]>,
    position: usize,
}

impl SamplePlayer {
    pub fn new(sample: Arc<[f32]>) -> Self {
        Self {
            sample,
            position: 0,
        }
    }

    /// Player with nothing loaded; renders silence
    pub fn silent() -> Self {
        Self::new(Arc::from(Vec::new()))
    }

    pub fn len(&self) -> usize {
        self.sample.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sample.is_empty()
    }

    /// Whether playback has run past the end
    pub fn is_finished(&self) -> bool {
        self.position >= self.sample.len()
    }

    fn rewind(&mut self) {
        self.position = 0;
    }

    #[inline]
    fn next_sample(&mut self) -> f32 {
        match self.sample.get(self.position) {
            Some(&s) => {
                self.position += 1;
                s
            }
            None => 0.0,
        }
    }
}

// ============================================================================
// Source Node
// ============================================================================

/// Generator variants a layer can be built on
#[derive(Debug, Clone)]
pub enum SourceKind {
    Oscillator(Oscillator),
    Noise(PinkNoise),
    Sample(SamplePlayer),
}

/// A layer's source generator plus its playback state
#[derive(Debug, Clone)]
pub struct SourceNode {
    kind: SourceKind,
    playing: bool,
}

impl SourceNode {
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            playing: false,
        }
    }

    pub fn kind(&self) -> &SourceKind {
        &self.kind
    }

    /// Begin producing signal. Samples restart from the top.
    pub fn start(&mut self) {
        if let SourceKind::Sample(player) = &mut self.kind {
            player.rewind();
        }
        self.playing = true;
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Overwrite `buffer` with the next block of signal
    pub fn render(&mut self, buffer: &mut AudioBuffer) {
        buffer.clear();
        if !self.playing {
            return;
        }

        let sample_rate = buffer.sample_rate;
        let num_samples = buffer.num_samples();
        for i in 0..num_samples {
            let value = match &mut self.kind {
                SourceKind::Oscillator(osc) => osc.next_sample(sample_rate),
                SourceKind::Noise(noise) => noise.next_sample(),
                SourceKind::Sample(player) => player.next_sample(),
            };
            for channel in buffer.samples.iter_mut() {
                channel[i] = value;
            }
        }

        if let SourceKind::Sample(player) = &self.kind {
            if player.is_finished() {
                self.playing = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ChannelLayout;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;

    fn block(num_samples: usize, sample_rate: u32) -> AudioBuffer {
        AudioBuffer::new(num_samples, ChannelLayout::Stereo, sample_rate)
    }

    #[test]
    fn test_stopped_source_is_silent() {
        let mut node = SourceNode::new(SourceKind::Oscillator(Oscillator::new(440.0)));
        let mut buffer = block(64, 48000);
        buffer.channel_mut(0).fill(0.3);
        node.render(&mut buffer);
        assert_eq!(buffer.peak(), 0.0);
    }

    #[test]
    fn test_oscillator_is_sine() {
        let mut node = SourceNode::new(SourceKind::Oscillator(Oscillator::new(250.0)));
        node.start();
        let mut buffer = block(8, 1000);
        node.render(&mut buffer);

        // 250 Hz at 1 kHz: quarter-cycle steps
        let expected = [0.0, 1.0, 0.0, -1.0];
        for (i, want) in expected.iter().enumerate() {
            assert_abs_diff_eq!(buffer.channel(0)[i], *want, epsilon = 1e-5);
            assert_abs_diff_eq!(buffer.channel(1)[i], *want, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_noise_is_seeded() {
        let render = |seed: u64| {
            let mut node = SourceNode::new(SourceKind::Noise(PinkNoise::new(
                ChaCha8Rng::seed_from_u64(seed),
            )));
            node.start();
            let mut buffer = block(256, 48000);
            node.render(&mut buffer);
            buffer.channel(0).to_vec()
        };

        assert_eq!(render(3), render(3));
        assert_ne!(render(3), render(4));
        assert!(render(3).iter().all(|s| s.is_finite() && s.abs() < 2.0));
    }

    #[test]
    fn test_sample_plays_once() {
        let sample: Arc<[f32]> = Arc::from(vec![0.5_f32, -0.5, 0.25]);
        let mut node = SourceNode::new(SourceKind::Sample(SamplePlayer::new(sample)));
        node.start();

        let mut buffer = block(5, 48000);
        node.render(&mut buffer);
        assert_eq!(&buffer.channel(0)[..5], &[0.5, -0.5, 0.25, 0.0, 0.0]);
        assert!(!node.is_playing());

        node.start();
        assert!(node.is_playing());
        node.render(&mut buffer);
        assert_eq!(buffer.channel(0)[0], 0.5);
    }

    #[test]
    fn test_silent_player() {
        let mut node = SourceNode::new(SourceKind::Sample(SamplePlayer::silent()));
        node.start();
        let mut buffer = block(16, 48000);
        node.render(&mut buffer);
        assert_eq!(buffer.peak(), 0.0);
    }
}
