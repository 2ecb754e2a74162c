//! Demo phase controller
//!
//! Drives the stress level for a scripted run: a linear build-up to 70%,
//! then a fluctuating peak that climbs towards (and is capped at) 90%.

/// Stress reached at the end of the build-up
pub const BUILD_TARGET: f32 = 0.7;

/// Ceiling during the peak
pub const PEAK_CAP: f32 = 0.9;

/// Where the scripted run is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Building,
    Peak,
    Complete,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Building => "building",
            Phase::Peak => "peak",
            Phase::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// Stress script for a run of fixed length
#[derive(Debug, Clone)]
pub struct PhaseController {
    build_ms: u64,
    peak_ms: u64,
}

impl PhaseController {
    pub fn new(build_ms: u64, peak_ms: u64) -> Self {
        Self {
            build_ms: build_ms.max(1),
            peak_ms: peak_ms.max(1),
        }
    }

    /// Split a run into two thirds build-up and one third peak
    pub fn for_duration(total_ms: u64) -> Self {
        let build_ms = total_ms * 2 / 3;
        Self::new(build_ms, total_ms - build_ms)
    }

    pub fn total_ms(&self) -> u64 {
        self.build_ms + self.peak_ms
    }

    pub fn phase_at(&self, elapsed_ms: u64) -> Phase {
        if elapsed_ms < self.build_ms {
            Phase::Building
        } else if elapsed_ms < self.total_ms() {
            Phase::Peak
        } else {
            Phase::Complete
        }
    }

    /// Stress at `elapsed_ms` into the run
    pub fn stress_at(&self, elapsed_ms: u64) -> f32 {
        match self.phase_at(elapsed_ms) {
            Phase::Building => {
                let progress = elapsed_ms as f32 / self.build_ms as f32;
                progress * BUILD_TARGET
            }
            Phase::Peak | Phase::Complete => {
                let peak_elapsed = (elapsed_ms - self.build_ms).min(self.peak_ms);
                let progress = peak_elapsed as f32 / self.peak_ms as f32;
                let fluctuation = (peak_elapsed as f32 * 0.01).sin() * 0.1;
                (BUILD_TARGET + fluctuation + progress * 0.2).min(PEAK_CAP)
            }
        }
    }
}
