//! Distortion Effect
//!
//! Waveshaping distortion with the classic `(3 + k)·x·20° / (π + k·|x|)`
//! curve, where `k = amount * 100`. An amount of zero is a bypass.

use crate::dsp::effect::{Effect, EffectKind};
use crate::engine::AudioBuffer;
use std::f32::consts::PI;

// ============================================================================
// Constants
// ============================================================================

/// Minimum distortion amount
const MIN_AMOUNT: f32 = 0.0;

/// Maximum distortion amount
const MAX_AMOUNT: f32 = 1.0;

/// Twenty degrees in radians
const TWENTY_DEGREES: f32 = 20.0 * PI / 180.0;

// ============================================================================
// Waveshaping
// ============================================================================

/// Shape one sample with drive `k`
#[inline]
fn waveshape(x: f32, k: f32) -> f32 {
    if k <= 0.0 {
        return x;
    }
    (3.0 + k) * x * TWENTY_DEGREES / (PI + k * x.abs())
}

// ============================================================================
// Distortion Effect
// ============================================================================

/// Waveshaping distortion
///
/// # Parameters
/// - `amount`: Distortion intensity (0.0 to 1.0)
/// - `wet`: Dry/wet mix (0.0 = dry, 1.0 = wet)
#[derive(Debug, Clone)]
pub struct Distortion {
    amount: f32,
    wet: f32,
}

impl Distortion {
    /// Create a fully wet distortion with the given amount
    pub fn new(amount: f32) -> Self {
        Self {
            amount: amount.clamp(MIN_AMOUNT, MAX_AMOUNT),
            wet: 1.0,
        }
    }

    /// Set the distortion amount (clamped to 0-1)
    pub fn set_amount(&mut self, amount: f32) {
        self.amount = amount.clamp(MIN_AMOUNT, MAX_AMOUNT);
    }

    pub fn amount(&self) -> f32 {
        self.amount
    }

    /// Set the dry/wet mix (clamped to 0-1)
    pub fn set_wet(&mut self, wet: f32) {
        self.wet = wet.clamp(0.0, 1.0);
    }

    pub fn wet(&self) -> f32 {
        self.wet
    }

    /// Shape a single sample with the current settings
    pub fn shape(&self, x: f32) -> f32 {
        let shaped = waveshape(x, self.amount * 100.0);
        x * (1.0 - self.wet) + shaped * self.wet
    }
}

impl Default for Distortion {
    fn default() -> Self {
        Self::new(0.4)
    }
}

impl Effect for Distortion {
    fn kind(&self) -> EffectKind {
        EffectKind::Distortion
    }

    fn process(&mut self, buffer: &mut AudioBuffer) {
        if self.wet <= 0.0 {
            return;
        }

        for channel in 0..buffer.num_channels() {
            for sample in buffer.channel_mut(channel).iter_mut() {
                *sample = self.shape(*sample);
            }
        }
    }

    fn prepare(&mut self, _sample_rate: u32) {
        // Stateless waveshaper
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ChannelLayout;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_zero_amount_is_bypass() {
        let distortion = Distortion::new(0.0);
        assert_abs_diff_eq!(distortion.shape(0.3), 0.3);
        assert_abs_diff_eq!(distortion.shape(-0.8), -0.8);
    }

    #[test]
    fn test_curve_is_odd_and_bounded() {
        let distortion = Distortion::new(0.4);
        for &x in &[0.1_f32, 0.5, 0.9, 1.0] {
            assert_abs_diff_eq!(distortion.shape(-x), -distortion.shape(x), epsilon = 1e-6);
            assert!(distortion.shape(x).abs() <= 1.5);
        }
    }

    #[test]
    fn test_boosts_quiet_signals() {
        let distortion = Distortion::new(0.4);
        // Small inputs get driven harder than they came in
        assert!(distortion.shape(0.05) > 0.05);
    }

    #[test]
    fn test_amount_clamping() {
        let distortion = Distortion::new(4.0);
        assert_eq!(distortion.amount(), 1.0);
    }

    #[test]
    fn test_dry_mix_leaves_buffer() {
        let mut distortion = Distortion::new(0.8);
        distortion.set_wet(0.0);
        let mut buffer = AudioBuffer::new(16, ChannelLayout::Stereo, 48000);
        buffer.channel_mut(0).fill(0.5);

        distortion.process(&mut buffer);
        assert_eq!(buffer.get_sample(0, 7), Some(0.5));
    }

    #[test]
    fn test_default_kind() {
        assert_eq!(Distortion::default().kind(), EffectKind::Distortion);
    }
}
