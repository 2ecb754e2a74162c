//! Visual Module
//!
//! Stress-driven visual stimuli on a software surface:
//! - Colours and the RGBA8 surface
//! - Frame scheduling for the cooperative render loop
//! - Particle pool and per-kind stimulus renderers
//! - The stimulus engine

pub mod color;
pub mod config;
pub mod engine;
pub mod particles;
pub mod scheduler;
pub mod stimulus;
pub mod surface;

pub use color::Color;
pub use config::{StimulusKind, VisualConfig, VisualStimulus};
pub use engine::{FrameReport, StimulusOutcome, VisualStimulusEngine};
pub use particles::{ParticleStyle, ParticleSystem};
pub use scheduler::{FrameScheduler, FrameToken, ManualFrameScheduler};
pub use stimulus::flicker_active;
pub use surface::{Surface, SurfaceSpec};
