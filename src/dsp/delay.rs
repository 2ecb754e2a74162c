//! Delay Effect
//!
//! Stereo delay line with optional feedback. Layers use it as a pure,
//! fully wet echo: the output is the input pushed back by the delay time.

use crate::dsp::effect::{Effect, EffectKind};
use crate::engine::{AudioBuffer, DEFAULT_SAMPLE_RATE};

/// Longest supported delay time in seconds
const MAX_DELAY_SECS: f32 = 2.0;

/// Stereo delay effect
#[derive(Debug, Clone)]
pub struct Delay {
    /// Delay time in seconds (0.001-2.0)
    delay_secs: f32,
    /// Feedback amount (0-0.95)
    feedback: f32,
    /// Wet signal level (0-1)
    wet_level: f32,
    /// Dry signal level (0-1)
    dry_level: f32,
    buffer_l: Vec<f32>,
    buffer_r: Vec<f32>,
    write_pos: usize,
    sample_rate: u32,
}

impl Delay {
    /// Create a fully wet delay with no feedback
    ///
    /// # Arguments
    /// * `delay_secs` - Delay time (clamped to 1 ms - 2 s)
    pub fn new(delay_secs: f32) -> Self {
        let mut delay = Self {
            delay_secs: delay_secs.clamp(0.001, MAX_DELAY_SECS),
            feedback: 0.0,
            wet_level: 1.0,
            dry_level: 0.0,
            buffer_l: Vec::new(),
            buffer_r: Vec::new(),
            write_pos: 0,
            sample_rate: DEFAULT_SAMPLE_RATE,
        };
        delay.resize_buffers();
        delay
    }

    pub fn delay_secs(&self) -> f32 {
        self.delay_secs
    }

    /// Set delay time in seconds
    pub fn set_delay_secs(&mut self, secs: f32) {
        self.delay_secs = secs.clamp(0.001, MAX_DELAY_SECS);
        self.resize_buffers();
    }

    /// Set feedback amount (clamped to 0-0.95)
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, 0.95);
    }

    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    /// Set wet and dry levels (each clamped to 0-1)
    pub fn set_mix(&mut self, wet_level: f32, dry_level: f32) {
        self.wet_level = wet_level.clamp(0.0, 1.0);
        self.dry_level = dry_level.clamp(0.0, 1.0);
    }

    /// Delay in whole samples at the prepared rate
    pub fn delay_samples(&self) -> usize {
        ((self.delay_secs * self.sample_rate as f32).round() as usize).max(1)
    }

    fn resize_buffers(&mut self) {
        // The line holds exactly the delay, so a read before write yields x[n - d]
        let size = self.delay_samples();
        if self.buffer_l.len() != size {
            self.buffer_l = vec![0.0; size];
            self.buffer_r = vec![0.0; size];
            self.write_pos = 0;
        }
    }
}

impl Default for Delay {
    fn default() -> Self {
        Self::new(0.2)
    }
}

impl Effect for Delay {
    fn kind(&self) -> EffectKind {
        EffectKind::Delay
    }

    fn process(&mut self, buffer: &mut AudioBuffer) {
        if buffer.num_samples() == 0 || self.buffer_l.is_empty() {
            return;
        }

        let stereo = buffer.num_channels() > 1;
        let size = self.buffer_l.len();

        for i in 0..buffer.num_samples() {
            let input_l = buffer.samples[0][i];
            let input_r = if stereo { buffer.samples[1][i] } else { input_l };

            let delayed_l = self.buffer_l[self.write_pos];
            let delayed_r = self.buffer_r[self.write_pos];

            self.buffer_l[self.write_pos] = input_l + delayed_l * self.feedback;
            self.buffer_r[self.write_pos] = input_r + delayed_r * self.feedback;

            buffer.samples[0][i] = input_l * self.dry_level + delayed_l * self.wet_level;
            if stereo {
                buffer.samples[1][i] = input_r * self.dry_level + delayed_r * self.wet_level;
            }

            self.write_pos = (self.write_pos + 1) % size;
        }
    }

    fn prepare(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate.max(1);
        self.resize_buffers();
    }
}
