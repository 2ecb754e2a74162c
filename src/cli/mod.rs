//! CLI Module
//!
//! Command-line host for the overload engines.

pub mod commands;
pub mod phases;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Overload - stress-coupled soundscape and visual stimulus renderer
#[derive(Parser, Debug)]
#[command(name = "overload")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Which half of a preset to print
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PresetKind {
    Audio,
    Visual,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the built-in preset configs as JSON
    #[command(name = "presets")]
    Presets {
        /// Only print audio or visual presets
        #[arg(short, long, value_enum)]
        kind: Option<PresetKind>,
    },

    /// Run a scripted session and write the soundscape to a WAV file
    #[command(name = "render")]
    Render(RenderArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct RenderArgs {
    /// Built-in preset for both engines
    #[arg(short, long, default_value = "sensory_overload")]
    pub preset: String,

    /// Soundscape config JSON (overrides the preset's audio half)
    #[arg(long)]
    pub soundscape: Option<PathBuf>,

    /// Visual config JSON (overrides the preset's visual half)
    #[arg(long)]
    pub visual: Option<PathBuf>,

    /// Engine settings JSON
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Length of the run in seconds
    #[arg(short, long, default_value_t = 9.0)]
    pub seconds: f32,

    /// Output WAV path
    #[arg(short, long, default_value = "overload.wav")]
    pub output: PathBuf,

    /// Seed for every random source (overrides the settings file)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Master volume, 0 to 1
    #[arg(long, default_value_t = 0.7)]
    pub volume: f32,

    /// Surface width in logical units
    #[arg(long, default_value_t = 320.0)]
    pub width: f32,

    /// Surface height in logical units
    #[arg(long, default_value_t = 180.0)]
    pub height: f32,

    /// Device pixel ratio of the surface
    #[arg(long, default_value_t = 1.0)]
    pub dpr: f32,

    /// Pace the run against the wall clock instead of rendering flat out
    #[arg(long)]
    pub realtime: bool,
}
