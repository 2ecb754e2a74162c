//! Audio backend abstraction
//!
//! The soundscape engine never talks to an output device directly. It asks a
//! backend to resume (which platforms typically gate behind a user gesture)
//! and is then pulled for audio at the backend's rate.

use crate::error::{OverloadError, Result};

/// Device-side contract the soundscape engine renders for
pub trait AudioBackend: Send {
    /// Resume or unlock output. Idempotent once running.
    fn resume(&mut self) -> Result<()>;

    /// Whether audio is currently flowing
    fn is_running(&self) -> bool;

    /// Output sample rate in Hz
    fn sample_rate(&self) -> u32;

    /// Human-readable backend name for logs
    fn name(&self) -> &str;
}

/// Pull-driven backend that renders into memory.
///
/// A gesture-locked backend refuses to resume until the host reports a
/// user interaction, mirroring browser autoplay policies.
#[derive(Debug, Clone)]
pub struct OfflineBackend {
    sample_rate: u32,
    running: bool,
    gesture_required: bool,
    gesture_granted: bool,
}

impl OfflineBackend {
    /// Create a backend that resumes immediately
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            running: false,
            gesture_required: false,
            gesture_granted: false,
        }
    }

    /// Create a backend that needs `grant_gesture` before it can resume
    pub fn gesture_locked(sample_rate: u32) -> Self {
        Self {
            gesture_required: true,
            ..Self::new(sample_rate)
        }
    }

    /// Record a user interaction
    pub fn grant_gesture(&mut self) {
        self.gesture_granted = true;
    }

    /// Suspend output, as a platform would on focus loss
    pub fn suspend(&mut self) {
        self.running = false;
    }
}

impl AudioBackend for OfflineBackend {
    fn resume(&mut self) -> Result<()> {
        if self.running {
            return Ok(());
        }
        if self.sample_rate == 0 {
            return Err(OverloadError::BackendUnavailable {
                reason: "sample rate is zero".to_string(),
            });
        }
        if self.gesture_required && !self.gesture_granted {
            return Err(OverloadError::BackendUnavailable {
                reason: "audio output requires a user gesture".to_string(),
            });
        }
        self.running = true;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn name(&self) -> &str {
        "offline"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_is_idempotent() {
        let mut backend = OfflineBackend::new(48000);
        assert!(!backend.is_running());
        backend.resume().unwrap();
        backend.resume().unwrap();
        assert!(backend.is_running());
    }

    #[test]
    fn test_gesture_lock() {
        let mut backend = OfflineBackend::gesture_locked(48000);
        let err = backend.resume().unwrap_err();
        assert!(err.is_recoverable());
        assert!(!backend.is_running());

        backend.grant_gesture();
        backend.resume().unwrap();
        assert!(backend.is_running());
    }
}
