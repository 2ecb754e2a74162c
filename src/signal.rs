//! Stress signal
//!
//! The single scalar coupling the audio and visual engines. A host
//! publishes into a one-slot watch channel; each engine keeps its own
//! receiver and applies whatever value is newest when it next looks.
//! There is no ordering guarantee between engines, only convergence once
//! publishing stops.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::watch;

/// A stress value clamped to [0, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f32", into = "f32")]
pub struct StressLevel(f32);

impl StressLevel {
    /// No stress
    pub const CALM: StressLevel = StressLevel(0.0);

    /// Full overload
    pub const PEAK: StressLevel = StressLevel(1.0);

    /// Clamp any input into range; NaN counts as calm
    pub fn new(level: f32) -> Self {
        if level.is_nan() {
            return Self::CALM;
        }
        Self(level.clamp(0.0, 1.0))
    }

    /// The raw value in [0, 1]
    pub fn value(self) -> f32 {
        self.0
    }
}

impl From<f32> for StressLevel {
    fn from(level: f32) -> Self {
        Self::new(level)
    }
}

impl From<f64> for StressLevel {
    fn from(level: f64) -> Self {
        Self::new(level as f32)
    }
}

impl From<StressLevel> for f32 {
    fn from(level: StressLevel) -> Self {
        level.0
    }
}

impl fmt::Display for StressLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0}%", self.0 * 100.0)
    }
}

/// Publishing side of the stress channel, owned by the host
#[derive(Debug)]
pub struct StressSignal {
    sender: watch::Sender<StressLevel>,
}

impl StressSignal {
    /// Create a signal starting at zero stress
    pub fn new() -> Self {
        let (sender, _) = watch::channel(StressLevel::CALM);
        Self { sender }
    }

    /// Publish a new level, replacing whatever was pending
    pub fn publish(&self, level: impl Into<StressLevel>) -> StressLevel {
        let level = level.into();
        self.sender.send_replace(level);
        level
    }

    /// Create a receiver for one engine
    pub fn subscribe(&self) -> StressReceiver {
        StressReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of attached receivers
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for StressSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Consuming side of the stress channel, one per engine
#[derive(Debug, Clone)]
pub struct StressReceiver {
    receiver: watch::Receiver<StressLevel>,
}

impl StressReceiver {
    /// Take the newest level if it was published since the last poll.
    ///
    /// A level published just before the publisher was dropped is still
    /// delivered once.
    pub fn poll(&mut self) -> Option<StressLevel> {
        let current = self.receiver.borrow_and_update();
        if current.has_changed() {
            Some(*current)
        } else {
            None
        }
    }
}
