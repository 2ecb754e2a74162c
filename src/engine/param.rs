//! Ramped parameters
//!
//! A parameter that glides linearly to a new target over a fixed number of
//! samples instead of jumping, so gain and cutoff changes never click.

/// Linearly ramped scalar advanced once per rendered sample
#[derive(Debug, Clone, PartialEq)]
pub struct RampedParam {
    value: f32,
    start: f32,
    target: f32,
    total: u64,
    remaining: u64,
}

impl RampedParam {
    /// Create a settled parameter
    pub fn new(value: f32) -> Self {
        Self {
            value,
            start: value,
            target: value,
            total: 0,
            remaining: 0,
        }
    }

    /// Current value
    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Value the parameter is heading towards
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Whether a ramp is in progress
    #[inline]
    pub fn is_ramping(&self) -> bool {
        self.remaining > 0
    }

    /// Samples left before the current ramp settles
    pub fn remaining_samples(&self) -> u64 {
        self.remaining
    }

    /// Start a ramp from the current value to `target`.
    ///
    /// A ramp already in flight is replaced, starting from wherever it got
    /// to. A zero-length glide jumps immediately.
    pub fn ramp_to(&mut self, target: f32, glide_secs: f32, sample_rate: u32) {
        let samples = (glide_secs.max(0.0) * sample_rate as f32).round() as u64;
        if samples == 0 {
            self.set(target);
            return;
        }
        self.start = self.value;
        self.target = target;
        self.total = samples;
        self.remaining = samples;
    }

    /// Jump to `value`, cancelling any ramp
    pub fn set(&mut self, value: f32) {
        self.value = value;
        self.start = value;
        self.target = value;
        self.total = 0;
        self.remaining = 0;
    }

    /// Advance one sample and return the new value
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        self.advance(1);
        self.value
    }

    /// Advance several samples at once
    pub fn advance(&mut self, samples: u64) {
        if self.remaining == 0 {
            return;
        }
        if samples >= self.remaining {
            self.value = self.target;
            self.remaining = 0;
            return;
        }
        self.remaining -= samples;
        let progress = (self.total - self.remaining) as f32 / self.total as f32;
        self.value = self.start + (self.target - self.start) * progress;
    }
}

impl Default for RampedParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_ramp_reaches_target_exactly() {
        let mut param = RampedParam::new(0.4);
        param.ramp_to(0.6, 0.1, 1000);
        assert_eq!(param.remaining_samples(), 100);

        for _ in 0..99 {
            param.next_sample();
        }
        assert!(param.is_ramping());
        assert_eq!(param.next_sample(), 0.6);
        assert!(!param.is_ramping());
    }

    #[test]
    fn test_ramp_is_monotonic() {
        let mut param = RampedParam::new(1000.0);
        param.ramp_to(3000.0, 0.2, 48000);
        let mut previous = param.value();
        while param.is_ramping() {
            let value = param.next_sample();
            assert!(value >= previous - 1e-3);
            previous = value;
        }
        assert_eq!(param.value(), 3000.0);
    }

    #[test]
    fn test_retarget_mid_ramp_starts_from_current() {
        let mut param = RampedParam::new(0.0);
        param.ramp_to(1.0, 1.0, 100);
        param.advance(50);
        assert_abs_diff_eq!(param.value(), 0.5, epsilon = 1e-5);

        param.ramp_to(0.0, 0.5, 100);
        param.advance(25);
        assert_abs_diff_eq!(param.value(), 0.25, epsilon = 1e-5);
    }

    #[test]
    fn test_zero_glide_jumps() {
        let mut param = RampedParam::new(0.2);
        param.ramp_to(0.9, 0.0, 48000);
        assert_eq!(param.value(), 0.9);
        assert!(!param.is_ramping());
    }

    #[test]
    fn test_advance_past_end_settles() {
        let mut param = RampedParam::new(0.0);
        param.ramp_to(2.0, 0.01, 48000);
        param.advance(10_000);
        assert_eq!(param.value(), 2.0);
        param.advance(10);
        assert_eq!(param.value(), 2.0);
    }
}
