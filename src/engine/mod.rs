//! Audio Engine Module
//!
//! Rendering plumbing shared by the soundscape graph:
//! - Audio buffer management
//! - Backend abstraction (device unlock, sample rate)
//! - Ramped parameters
//! - WAV I/O

pub mod backend;
pub mod buffer;
pub mod io;
pub mod param;

pub use backend::{AudioBackend, OfflineBackend};
pub use buffer::{AudioBuffer, ChannelLayout, DEFAULT_SAMPLE_RATE};
pub use io::{export_wav, import_wav, BitDepth, WavSink};
pub use param::RampedParam;
