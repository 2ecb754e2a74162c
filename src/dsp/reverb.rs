//! Reverb effect
//!
//! Freeverb topology:
//! - 8 parallel lowpass-feedback comb filters per channel
//! - 4 series allpass filters per channel for diffusion
//! - Stereo width control
//!
//! The decay time requested by a layer spec maps onto room size.

use crate::dsp::effect::{Effect, EffectKind};
use crate::engine::AudioBuffer;

// ============================================================================
// Freeverb Constants
// ============================================================================

/// Reference sample rate for Freeverb delays
const REFERENCE_SAMPLE_RATE: f64 = 44100.0;

/// Comb filter delays at 44100 Hz (8 filters)
const COMB_DELAYS: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];

/// Allpass filter delays at 44100 Hz (4 filters)
const ALLPASS_DELAYS: [usize; 4] = [556, 441, 341, 225];

/// Stereo spread offset in samples (for right channel)
const STEREO_SPREAD: usize = 23;

/// Fixed gain for allpass filters (standard Freeverb value)
const ALLPASS_GAIN: f32 = 0.5;

/// Input attenuation feeding the comb bank (standard Freeverb value)
const FIXED_GAIN: f32 = 0.015;

/// Scale factor for room size parameter to feedback
const ROOM_SCALE: f32 = 0.28;

/// Offset for room size parameter to feedback
const ROOM_OFFSET: f32 = 0.7;

/// Scale factor for damping parameter
const DAMP_SCALE: f32 = 0.4;

/// Decay time that maps onto the largest room
const MAX_DECAY_SECS: f32 = 4.0;

// ============================================================================
// Filter Components
// ============================================================================

/// Low-pass comb filter for Freeverb
#[derive(Debug, Clone)]
struct CombFilter {
    buffer: Vec<f32>,
    write_pos: usize,
    filter_state: f32,
    feedback: f32,
    damp1: f32,
    damp2: f32,
}

impl CombFilter {
    fn new(delay: usize) -> Self {
        Self {
            buffer: vec![0.0; delay.max(1)],
            write_pos: 0,
            filter_state: 0.0,
            feedback: 0.5,
            damp1: 0.5,
            damp2: 0.5,
        }
    }

    fn set_coefficients(&mut self, feedback: f32, damp1: f32, damp2: f32) {
        self.feedback = feedback;
        self.damp1 = damp1;
        self.damp2 = damp2;
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let output = self.buffer[self.write_pos];
        self.filter_state = output * self.damp1 + self.filter_state * self.damp2;
        self.buffer[self.write_pos] = input + self.filter_state * self.feedback;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
        output
    }
}

/// Allpass filter for Freeverb diffusion
#[derive(Debug, Clone)]
struct AllpassFilter {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl AllpassFilter {
    fn new(delay: usize) -> Self {
        Self {
            buffer: vec![0.0; delay.max(1)],
            write_pos: 0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let delayed = self.buffer[self.write_pos];
        let output = delayed - input;
        self.buffer[self.write_pos] = input + delayed * ALLPASS_GAIN;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
        output
    }
}

/// Comb and allpass bank for one channel
#[derive(Debug, Clone)]
struct Tank {
    combs: Vec<CombFilter>,
    allpasses: Vec<AllpassFilter>,
}

impl Tank {
    fn new(sample_rate: u32, spread: usize) -> Self {
        let scale = sample_rate as f64 / REFERENCE_SAMPLE_RATE;
        let scaled = |delay: usize| (((delay + spread) as f64) * scale) as usize;
        Self {
            combs: COMB_DELAYS.iter().map(|&d| CombFilter::new(scaled(d))).collect(),
            allpasses: ALLPASS_DELAYS
                .iter()
                .map(|&d| AllpassFilter::new(scaled(d)))
                .collect(),
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let mut output: f32 = self.combs.iter_mut().map(|comb| comb.process(input)).sum();
        for allpass in &mut self.allpasses {
            output = allpass.process(output);
        }
        output
    }
}

// ============================================================================
// Main Reverb Effect
// ============================================================================

/// Algorithmic reverb
#[derive(Debug, Clone)]
pub struct Reverb {
    /// Room size: 0 (tiny) to 1 (huge hall)
    room_size: f32,
    /// Damping: 0 (bright) to 1 (dark)
    damping: f32,
    /// Wet signal level: 0 to 1
    wet_level: f32,
    /// Dry signal level: 0 to 1
    dry_level: f32,
    /// Stereo width: 0 (mono) to 1 (full stereo)
    width: f32,
    sample_rate: u32,
    left: Tank,
    right: Tank,
}

impl Reverb {
    /// Create a fully wet reverb whose tail roughly matches `decay_secs`
    pub fn with_decay(decay_secs: f32) -> Self {
        let sample_rate = crate::engine::DEFAULT_SAMPLE_RATE;
        let mut reverb = Self {
            room_size: (decay_secs / MAX_DECAY_SECS).clamp(0.0, 1.0),
            damping: 0.5,
            wet_level: 1.0,
            dry_level: 0.0,
            width: 1.0,
            sample_rate,
            left: Tank::new(sample_rate, 0),
            right: Tank::new(sample_rate, STEREO_SPREAD),
        };
        reverb.update_coefficients();
        reverb
    }

    pub fn room_size(&self) -> f32 {
        self.room_size
    }

    /// Set room size (clamped to 0-1)
    pub fn set_room_size(&mut self, room_size: f32) {
        self.room_size = room_size.clamp(0.0, 1.0);
        self.update_coefficients();
    }

    /// Set damping (clamped to 0-1)
    pub fn set_damping(&mut self, damping: f32) {
        self.damping = damping.clamp(0.0, 1.0);
        self.update_coefficients();
    }

    /// Set wet and dry levels (each clamped to 0-1)
    pub fn set_mix(&mut self, wet_level: f32, dry_level: f32) {
        self.wet_level = wet_level.clamp(0.0, 1.0);
        self.dry_level = dry_level.clamp(0.0, 1.0);
    }

    fn update_coefficients(&mut self) {
        let feedback = self.room_size * ROOM_SCALE + ROOM_OFFSET;
        let damp2 = self.damping * DAMP_SCALE;
        let damp1 = 1.0 - damp2;
        for comb in self.left.combs.iter_mut().chain(self.right.combs.iter_mut()) {
            comb.set_coefficients(feedback, damp1, damp2);
        }
    }
}

impl Default for Reverb {
    fn default() -> Self {
        Self::with_decay(2.0)
    }
}

impl Effect for Reverb {
    fn kind(&self) -> EffectKind {
        EffectKind::Reverb
    }

    fn process(&mut self, buffer: &mut AudioBuffer) {
        let wet1 = self.wet_level * (1.0 + self.width) / 2.0;
        let wet2 = self.wet_level * (1.0 - self.width) / 2.0;
        let stereo = buffer.num_channels() > 1;

        for i in 0..buffer.num_samples() {
            let input_left = buffer.samples[0][i];
            let input_right = if stereo { buffer.samples[1][i] } else { input_left };
            let input = (input_left + input_right) * 0.5 * FIXED_GAIN;

            let out_left = self.left.process(input);
            let out_right = self.right.process(input);

            buffer.samples[0][i] =
                input_left * self.dry_level + out_left * wet1 + out_right * wet2;
            if stereo {
                buffer.samples[1][i] =
                    input_right * self.dry_level + out_right * wet1 + out_left * wet2;
            }
        }
    }

    fn prepare(&mut self, sample_rate: u32) {
        if sample_rate == self.sample_rate {
            return;
        }
        self.sample_rate = sample_rate;
        self.left = Tank::new(sample_rate, 0);
        self.right = Tank::new(sample_rate, STEREO_SPREAD);
        self.update_coefficients();
    }
}

// ============================================================================
// Tests
// ============================================================================
