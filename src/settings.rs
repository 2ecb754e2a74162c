//! Engine settings
//!
//! Tunables shared by both engines. Defaults reproduce the behaviour the
//! simulation was authored against; hosts may load overrides from JSON.

use crate::error::{OverloadError, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables for the audio and visual engines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Audio sample rate in Hz
    pub sample_rate: u32,
    /// Frames rendered per audio block
    pub block_size: usize,
    /// Glide applied to layer gains on stress updates (seconds)
    pub gain_glide_secs: f32,
    /// Glide applied to the low-pass cutoff on stress updates (seconds)
    pub filter_glide_secs: f32,
    /// Glide applied to explicit volume changes (seconds)
    pub volume_glide_secs: f32,
    /// Initial master gain
    pub master_gain: f32,
    /// Particles per unit of intensity at zero stress
    pub particle_base_count: usize,
    /// Shortest particle lifespan in frames
    pub particle_life_min: f32,
    /// Longest particle lifespan in frames
    pub particle_life_max: f32,
    /// Seed for every random source; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            block_size: 512,
            gain_glide_secs: 0.1,
            filter_glide_secs: 0.2,
            volume_glide_secs: 0.1,
            master_gain: 0.7,
            particle_base_count: 20,
            particle_life_min: 60.0,
            particle_life_max: 180.0,
            seed: None,
        }
    }
}

impl EngineSettings {
    /// Default settings with a fixed seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Parse settings from a JSON document; missing fields take defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Random source for one consumer; distinct streams stay independent
    /// under the same seed
    pub fn rng(&self, stream: u64) -> ChaCha8Rng {
        match self.seed {
            Some(seed) => {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                rng.set_stream(stream);
                rng
            }
            None => ChaCha8Rng::from_entropy(),
        }
    }

    /// Reject settings no engine can run with
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| {
            Err(OverloadError::InvalidSettings {
                reason: reason.to_string(),
            })
        };

        if self.sample_rate == 0 {
            return invalid("sample_rate must be positive");
        }
        if self.block_size == 0 {
            return invalid("block_size must be positive");
        }
        for glide in [
            self.gain_glide_secs,
            self.filter_glide_secs,
            self.volume_glide_secs,
        ] {
            if !glide.is_finite() || glide < 0.0 {
                return invalid("glide times must be finite and non-negative");
            }
        }
        if !(self.particle_life_min > 0.0 && self.particle_life_min <= self.particle_life_max) {
            return invalid("particle life range must satisfy 0 < min <= max");
        }
        Ok(())
    }
}
