//! Soundscape Module
//!
//! Layered procedural audio whose intensity tracks the stress level:
//! - Config data model and presets
//! - Per-layer node graphs
//! - The layer engine

pub mod config;
pub mod engine;
pub mod layer;

pub use crate::dsp::EffectKind;
pub use config::{LayerSpec, SoundscapeConfig, SourceType, PRESET_NAMES};
pub use engine::{AudioLayerEngine, EngineState};
pub use layer::AudioLayer;

use crate::engine::{export_wav, AudioBuffer, BitDepth};
use crate::error::Result;
use std::path::Path;

/// Write rendered audio as 16-bit PCM
pub fn write_wav(buffer: &AudioBuffer, path: &Path) -> Result<()> {
    export_wav(buffer, path, BitDepth::Int16)
}
