//! Overload - Stress-Coupled Sensory Simulation Engines
//!
//! Overload renders a sensory-overload simulation from one scalar input:
//! 1. Audio Layer Engine - Procedural soundscape layers whose gain and
//!    brightness track the stress level
//! 2. Visual Stimulus Engine - Flicker, particles, distortion and overlay
//!    stimuli drawn onto a software surface, one frame per host callback
//!
//! # Architecture
//!
//! Both engines subscribe to a `StressSignal`. The host publishes levels
//! into it; each engine applies the newest value at its next block or
//! frame. Each soundscape layer is a node graph:
//! - Source: oscillator, pink noise or a sample
//! - Effects: distortion, reverb, delay (always in that order)
//! - Low-pass filter and gain, summed into the master gain

pub mod cli;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod registry;
pub mod settings;
pub mod signal;
pub mod soundscape;
pub mod visual;

pub use error::{OverloadError, Result};
pub use settings::EngineSettings;
pub use signal::{StressLevel, StressReceiver, StressSignal};
pub use soundscape::{AudioLayerEngine, LayerSpec, SoundscapeConfig};
pub use visual::{VisualConfig, VisualStimulus, VisualStimulusEngine};
