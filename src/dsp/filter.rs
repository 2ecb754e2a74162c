//! Low-pass filter
//!
//! 12 dB/oct biquad low-pass (Audio EQ Cookbook) whose cutoff glides on a
//! `RampedParam`. Coefficients are recomputed every few samples while the
//! cutoff is moving.

use crate::engine::{AudioBuffer, RampedParam};
use std::f64::consts::PI;

/// Cutoff a freshly built layer filter starts at, in Hz
pub const DEFAULT_CUTOFF_HZ: f32 = 1000.0;

/// Resonance of the layer filter
const DEFAULT_Q: f64 = 1.0;

/// Samples between coefficient updates during a glide
const COEFF_UPDATE_INTERVAL: usize = 16;

/// Biquad filter coefficients, normalized by a0
#[derive(Debug, Clone, Copy, Default)]
struct BiquadCoeffs {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl BiquadCoeffs {
    fn low_pass(sample_rate: f64, frequency: f64, q: f64) -> Self {
        // Keep the cutoff below Nyquist
        let freq = frequency.clamp(10.0, sample_rate / 2.0 - 1.0);
        let w0 = 2.0 * PI * freq / sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q);

        let a0 = 1.0 + alpha;
        Self {
            b0: ((1.0 - cos_w0) / 2.0) / a0,
            b1: (1.0 - cos_w0) / a0,
            b2: ((1.0 - cos_w0) / 2.0) / a0,
            a1: (-2.0 * cos_w0) / a0,
            a2: (1.0 - alpha) / a0,
        }
    }
}

/// Biquad filter state for one channel
#[derive(Debug, Clone, Copy, Default)]
struct BiquadState {
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl BiquadState {
    #[inline]
    fn process(&mut self, input: f64, coeffs: &BiquadCoeffs) -> f64 {
        let output = coeffs.b0 * input + coeffs.b1 * self.x1 + coeffs.b2 * self.x2
            - coeffs.a1 * self.y1
            - coeffs.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }
}

/// Stereo low-pass filter with a ramped cutoff
#[derive(Debug, Clone)]
pub struct LowPassFilter {
    cutoff: RampedParam,
    q: f64,
    sample_rate: u32,
    coeffs: BiquadCoeffs,
    states: [BiquadState; 2],
}

impl LowPassFilter {
    /// Create a filter at `cutoff_hz`
    pub fn new(cutoff_hz: f32, sample_rate: u32) -> Self {
        let sample_rate = sample_rate.max(1);
        Self {
            cutoff: RampedParam::new(cutoff_hz),
            q: DEFAULT_Q,
            sample_rate,
            coeffs: BiquadCoeffs::low_pass(sample_rate as f64, cutoff_hz as f64, DEFAULT_Q),
            states: [BiquadState::default(); 2],
        }
    }

    /// Current cutoff in Hz
    pub fn cutoff(&self) -> f32 {
        self.cutoff.value()
    }

    /// Cutoff the filter is gliding towards
    pub fn target_cutoff(&self) -> f32 {
        self.cutoff.target()
    }

    /// Glide the cutoff to `hz` over `glide_secs`
    pub fn ramp_cutoff(&mut self, hz: f32, glide_secs: f32) {
        self.cutoff.ramp_to(hz, glide_secs, self.sample_rate);
        if !self.cutoff.is_ramping() {
            self.update_coefficients();
        }
    }

    pub fn prepare(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate.max(1);
        self.update_coefficients();
    }

    pub fn reset(&mut self) {
        self.states = [BiquadState::default(); 2];
    }

    fn update_coefficients(&mut self) {
        self.coeffs =
            BiquadCoeffs::low_pass(self.sample_rate as f64, self.cutoff.value() as f64, self.q);
    }

    /// Filter a block in place, advancing the cutoff ramp by its length
    pub fn process(&mut self, buffer: &mut AudioBuffer) {
        let channels = buffer.num_channels().min(2);
        for i in 0..buffer.num_samples() {
            if self.cutoff.is_ramping() {
                self.cutoff.advance(1);
                if i % COEFF_UPDATE_INTERVAL == 0 || !self.cutoff.is_ramping() {
                    self.update_coefficients();
                }
            }
            for ch in 0..channels {
                let input = buffer.samples[ch][i] as f64;
                buffer.samples[ch][i] = self.states[ch].process(input, &self.coeffs) as f32;
            }
        }
    }
}
