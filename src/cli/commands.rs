//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use sha2::{Digest, Sha256};
use tokio::sync::Barrier;

use super::phases::{Phase, PhaseController};
use super::{PresetKind, RenderArgs};
use crate::engine::{BitDepth, WavSink};
use crate::settings::EngineSettings;
use crate::signal::StressSignal;
use crate::soundscape::{AudioLayerEngine, SoundscapeConfig, PRESET_NAMES};
use crate::visual::{
    FrameReport, ManualFrameScheduler, StimulusOutcome, SurfaceSpec, VisualConfig,
    VisualStimulusEngine,
};

/// Host tick: stress is published and both engines advance once per tick
const TICK_MS: u64 = 100;

/// Display refresh rate the demo host simulates
const FRAMES_PER_SECOND: u64 = 60;

/// Print every preset as pretty JSON.
pub fn list_presets(kind: Option<PresetKind>) -> Result<()> {
    for name in PRESET_NAMES {
        println!("== {} ==", name);
        if kind != Some(PresetKind::Visual) {
            if let Some(config) = SoundscapeConfig::preset(name) {
                println!("{}", config.to_json_pretty()?);
            }
        }
        if kind != Some(PresetKind::Audio) {
            if let Some(config) = VisualConfig::preset(name) {
                println!("{}", config.to_json_pretty()?);
            }
        }
    }
    Ok(())
}

/// Run a scripted session and report what was produced.
pub fn render(args: &RenderArgs) -> Result<()> {
    let settings = load_settings(args)?;
    let (soundscape, visual) = load_configs(args)?;

    if !(args.seconds.is_finite() && args.seconds > 0.0) {
        bail!("--seconds must be positive, got {}", args.seconds);
    }
    let total_ms = (args.seconds * 1000.0).round() as u64;

    info!(
        "Rendering {:.1}s of '{}' to {}",
        args.seconds,
        args.preset,
        args.output.display()
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("Failed to start the host runtime")?;
    let summary = runtime.block_on(run_session(
        args, settings, &soundscape, &visual, total_ms,
    ))?;

    let digest = sha256_file(&args.output)?;

    println!("Session started: {}", summary.started_at.to_rfc3339());
    println!(
        "Audio: {} frames ({:.2}s) -> {}",
        summary.audio_frames,
        summary.audio_frames as f64 / summary.sample_rate as f64,
        args.output.display()
    );
    if summary.audio_peak > 1.0 {
        warn!(
            "Audio peaked at {:.2} and was clipped in the WAV file",
            summary.audio_peak
        );
    }
    println!(
        "Visual: {} frames, flicker on {} frames, up to {} particles",
        summary.visual_frames, summary.flicker_frames, summary.max_particles
    );
    println!("Peak stress: {:.0}%", summary.peak_stress * 100.0);
    if !summary.skipped.is_empty() {
        println!("Skipped stimuli: {:?}", summary.skipped);
    }
    println!("SHA-256: {}", digest);

    Ok(())
}

// ============================================================================
// Session
// ============================================================================

/// What one scripted session produced
#[derive(Debug, Clone)]
struct SessionSummary {
    started_at: DateTime<Utc>,
    sample_rate: u32,
    audio_frames: u64,
    audio_peak: f32,
    visual_frames: u64,
    flicker_frames: u64,
    max_particles: usize,
    peak_stress: f32,
    skipped: BTreeSet<String>,
}

/// Running totals over the visual frame reports
#[derive(Debug, Default)]
struct VisualStats {
    frames: u64,
    flicker_frames: u64,
    max_particles: usize,
    skipped: BTreeSet<String>,
}

impl VisualStats {
    fn record(&mut self, report: &FrameReport, flicker_ids: &BTreeSet<String>) {
        self.frames += 1;
        self.max_particles = self.max_particles.max(report.particle_count);
        if report
            .outcomes
            .iter()
            .any(|(id, outcome)| flicker_ids.contains(id) && *outcome == StimulusOutcome::Drawn)
        {
            self.flicker_frames += 1;
        }
        self.skipped.extend(report.skipped().map(str::to_string));
    }
}

/// Run both engines off one stress signal.
///
/// Three cooperative tasks share the current thread: the phase controller
/// publishes a level each tick, then the audio and visual tasks each
/// advance by one tick. A barrier keeps them in lockstep so a seeded run
/// renders identically every time.
async fn run_session(
    args: &RenderArgs,
    settings: EngineSettings,
    soundscape: &SoundscapeConfig,
    visual_config: &VisualConfig,
    total_ms: u64,
) -> Result<SessionSummary> {
    let started_at = Utc::now();
    let sample_rate = settings.sample_rate;

    let mut audio = AudioLayerEngine::new(settings.clone());
    with_hints(audio.initialize()).context("Audio backend refused to start")?;
    with_hints(audio.create_soundscape(soundscape)).context("Failed to build soundscape")?;
    audio.set_master_volume(args.volume);

    let scheduler = ManualFrameScheduler::new();
    let host = scheduler.clone();
    let mut visual = with_hints(VisualStimulusEngine::new(
        SurfaceSpec::new(args.width, args.height, args.dpr),
        scheduler,
        &settings,
    ))
    .context("Failed to acquire drawing surface")?;
    visual.apply_config(visual_config);
    let flicker_ids: BTreeSet<String> = visual_config
        .stimuli
        .iter()
        .filter(|s| s.kind == crate::visual::StimulusKind::Flicker)
        .map(|s| s.id.clone())
        .collect();

    let signal = StressSignal::new();
    audio.attach_stress(signal.subscribe());
    visual.attach_stress(signal.subscribe());
    debug!("Stress signal feeding {} engines", signal.receiver_count());

    let mut sink = WavSink::create(&args.output, sample_rate, BitDepth::Int16)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;

    audio.start_all_layers();
    visual.start();

    let controller = PhaseController::for_duration(total_ms);
    let ticks = total_ms.div_ceil(TICK_MS);
    let audio_frames_per_tick = (sample_rate as u64 * TICK_MS / 1000) as usize;
    let visual_frames_per_tick = FRAMES_PER_SECOND * TICK_MS / 1000;
    let barrier = Barrier::new(3);

    let control_task = async {
        let mut pacing = tokio::time::interval(Duration::from_millis(TICK_MS));
        let mut phase = None;
        let mut peak_stress = 0.0_f32;
        for tick in 0..ticks {
            if args.realtime {
                pacing.tick().await;
            }
            let elapsed_ms = tick * TICK_MS;
            let current = controller.phase_at(elapsed_ms);
            if phase != Some(current) {
                info!("Phase: {} at {:.1}s", current, elapsed_ms as f32 / 1000.0);
                phase = Some(current);
            }
            let level = signal.publish(controller.stress_at(elapsed_ms));
            peak_stress = peak_stress.max(level.value());
            if elapsed_ms % 1000 == 0 {
                debug!("Stress {} at {:.1}s", level, elapsed_ms as f32 / 1000.0);
            }

            barrier.wait().await;
            barrier.wait().await;
        }
        debug!("Phase: {}", Phase::Complete);
        peak_stress
    };

    let audio_task = async {
        let mut outcome = Ok(());
        let mut peak = 0.0_f32;
        for _ in 0..ticks {
            barrier.wait().await;
            let block = audio.render(audio_frames_per_tick);
            peak = peak.max(block.peak());
            if outcome.is_ok() {
                outcome = sink.write(&block);
            }
            barrier.wait().await;
        }
        (outcome, peak)
    };

    let visual_task = async {
        let mut stats = VisualStats::default();
        for _ in 0..ticks {
            barrier.wait().await;
            for _ in 0..visual_frames_per_tick {
                for token in host.take_pending() {
                    if let Some(report) = visual.on_animation_frame(token) {
                        stats.record(&report, &flicker_ids);
                    }
                }
            }
            barrier.wait().await;
        }
        stats
    };

    let (peak_stress, (audio_outcome, audio_peak), stats) =
        tokio::join!(control_task, audio_task, visual_task);
    audio_outcome.context("Failed while writing audio")?;

    visual.stop();
    audio.stop_all_layers();
    let audio_frames = sink.frames_written();
    sink.finalize().context("Failed to finalize WAV file")?;

    if !stats.skipped.is_empty() {
        warn!("Unrecognised stimuli were skipped: {:?}", stats.skipped);
    }

    audio.dispose();
    visual.dispose();

    Ok(SessionSummary {
        started_at,
        sample_rate,
        audio_frames,
        audio_peak,
        visual_frames: stats.frames,
        flicker_frames: stats.flicker_frames,
        max_particles: stats.max_particles,
        peak_stress,
        skipped: stats.skipped,
    })
}

// ============================================================================
// Helpers
// ============================================================================

fn load_settings(args: &RenderArgs) -> Result<EngineSettings> {
    let mut settings = match &args.settings {
        Some(path) => EngineSettings::from_path(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => EngineSettings::default(),
    };
    if args.seed.is_some() {
        settings.seed = args.seed;
    }
    settings.validate()?;
    Ok(settings)
}

fn load_configs(args: &RenderArgs) -> Result<(SoundscapeConfig, VisualConfig)> {
    let soundscape = match &args.soundscape {
        Some(path) => SoundscapeConfig::from_path(path)
            .with_context(|| format!("Failed to load soundscape from {}", path.display()))?,
        None => match SoundscapeConfig::preset(&args.preset) {
            Some(config) => config,
            None => bail!(
                "Unknown preset '{}' (expected one of {:?})",
                args.preset,
                PRESET_NAMES
            ),
        },
    };

    let visual = match &args.visual {
        Some(path) => VisualConfig::from_path(path)
            .with_context(|| format!("Failed to load visual config from {}", path.display()))?,
        None => match VisualConfig::preset(&args.preset) {
            Some(config) => config,
            None => bail!(
                "Unknown preset '{}' (expected one of {:?})",
                args.preset,
                PRESET_NAMES
            ),
        },
    };

    Ok((soundscape, visual))
}

/// Log what the user can do about an engine error before it is wrapped
fn with_hints<T>(result: crate::Result<T>) -> crate::Result<T> {
    if let Err(err) = &result {
        for hint in err.recovery_suggestions() {
            warn!("[{}] {}", err.error_code(), hint);
        }
    }
    result
}

fn sha256_file(path: &Path) -> Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let digest = Sha256::digest(&bytes);
    Ok(digest.iter().map(|b| format!("{:02x}", b)).collect())
}
