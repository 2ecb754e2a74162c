//! Gain stage
//!
//! Linear gain with a ramped level, used for every layer's output and for
//! the master bus.

use crate::engine::{AudioBuffer, RampedParam};

// ============================================================================
// Gain Stage
// ============================================================================

/// Linear gain whose level glides instead of jumping
///
/// # Example
/// ```ignore
/// use overload::dsp::GainStage;
///
/// let mut gain = GainStage::new(0.4, 48000);
/// gain.ramp_to(0.6, 0.1); // glide over 100 ms
/// gain.process(&mut buffer);
/// ```
#[derive(Debug, Clone)]
pub struct GainStage {
    level: RampedParam,
    sample_rate: u32,
}

impl GainStage {
    /// Create a gain stage at a linear `level`
    pub fn new(level: f32, sample_rate: u32) -> Self {
        Self {
            level: RampedParam::new(level.max(0.0)),
            sample_rate: sample_rate.max(1),
        }
    }

    /// Current linear gain
    pub fn level(&self) -> f32 {
        self.level.value()
    }

    /// Linear gain the stage is gliding towards
    pub fn target(&self) -> f32 {
        self.level.target()
    }

    /// Whether a glide is in progress
    pub fn is_ramping(&self) -> bool {
        self.level.is_ramping()
    }

    /// Glide to `level` over `glide_secs`. Negative levels clamp to zero.
    pub fn ramp_to(&mut self, level: f32, glide_secs: f32) {
        self.level.ramp_to(level.max(0.0), glide_secs, self.sample_rate);
    }

    /// Jump straight to `level`
    pub fn set(&mut self, level: f32) {
        self.level.set(level.max(0.0));
    }

    pub fn prepare(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate.max(1);
    }

    /// Apply the gain in place, advancing any glide by the block length
    pub fn process(&mut self, buffer: &mut AudioBuffer) {
        let channels = buffer.num_channels();
        if !self.level.is_ramping() {
            let gain = self.level.value();
            for ch in 0..channels {
                buffer.channel_mut(ch).iter_mut().for_each(|s| *s *= gain);
            }
            return;
        }

        for i in 0..buffer.num_samples() {
            let gain = self.level.next_sample();
            for ch in 0..channels {
                buffer.samples[ch][i] *= gain;
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
