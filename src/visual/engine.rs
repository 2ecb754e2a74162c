//! Visual Stimulus Engine
//!
//! Renders a stack of stimuli onto a surface once per display refresh.
//! The loop is cooperative: each iteration runs to completion, then asks
//! the frame scheduler for the next callback. Stress is read at the start
//! of each frame and never triggers a redraw by itself.

use super::color::Color;
use super::config::{
    StimulusKind, VisualConfig, VisualStimulus, DEFAULT_FLICKER_COLOR, DEFAULT_FLICKER_FREQUENCY,
    DEFAULT_FLICKER_OPACITY, DEFAULT_OVERLAY_COLOR, DEFAULT_OVERLAY_OPACITY,
    DEFAULT_PARTICLE_COLOR, DEFAULT_PARTICLE_SIZE, DEFAULT_PARTICLE_SPEED,
};
use super::particles::{ParticleStyle, ParticleSystem};
use super::scheduler::{FrameScheduler, FrameToken, ManualFrameScheduler};
use super::stimulus::{
    apply_distortion, effective_intensity, flicker_active, render_overlay, render_shake,
};
use super::surface::{Surface, SurfaceSpec};
use crate::error::Result;
use crate::registry::Registry;
use crate::settings::EngineSettings;
use crate::signal::{StressLevel, StressReceiver};
use log::{debug, trace};
use rand_chacha::ChaCha8Rng;

/// Random stream for particle spawning
const PARTICLE_STREAM: u64 = 1;

/// Random stream for shake offsets
const SHAKE_STREAM: u64 = 2;

// ============================================================================
// Frame Report
// ============================================================================

/// What one stimulus did during a frame
#[derive(Debug, Clone, PartialEq)]
pub enum StimulusOutcome {
    /// Painted onto the surface
    Drawn,
    /// Ran but had nothing to paint this frame
    Idle,
    /// Kind not recognised; nothing rendered
    Skipped { kind: String },
    /// Shake offset that was computed; it is never applied
    Shake { dx: f32, dy: f32 },
}

/// Summary of one rendered frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    /// Frame counter after this frame (the first frame is 1)
    pub frame: u64,
    /// Stress the frame was rendered at
    pub stress: StressLevel,
    /// Per-stimulus outcomes in draw order
    pub outcomes: Vec<(String, StimulusOutcome)>,
    /// Live particles once the frame finished
    pub particle_count: usize,
}

impl FrameReport {
    pub fn outcome(&self, id: &str) -> Option<&StimulusOutcome> {
        self.outcomes
            .iter()
            .find(|(stimulus_id, _)| stimulus_id == id)
            .map(|(_, outcome)| outcome)
    }

    /// Ids of stimuli whose kind was not recognised
    pub fn skipped(&self) -> impl Iterator<Item = &str> {
        self.outcomes.iter().filter_map(|(id, outcome)| match outcome {
            StimulusOutcome::Skipped { .. } => Some(id.as_str()),
            _ => None,
        })
    }
}

// ============================================================================
// Visual Stimulus Engine
// ============================================================================

/// Per-frame renderer for a stack of visual stimuli
pub struct VisualStimulusEngine<S: FrameScheduler = ManualFrameScheduler> {
    surface: Surface,
    scheduler: S,
    stimuli: Registry<VisualStimulus>,
    particles: ParticleSystem,
    shake_rng: ChaCha8Rng,
    stress: StressLevel,
    stress_rx: Option<StressReceiver>,
    frame: u64,
    running: bool,
    pending: Option<FrameToken>,
}

impl<S: FrameScheduler> VisualStimulusEngine<S> {
    /// Acquire a surface for `spec` and build an idle engine around it.
    ///
    /// # Errors
    /// `SurfaceUnavailable` if the surface cannot be backed.
    pub fn new(spec: SurfaceSpec, scheduler: S, settings: &EngineSettings) -> Result<Self> {
        let surface = Surface::new(spec)?;
        debug!(
            "[VISUAL] Surface {}x{} at {}x ({}x{} px)",
            spec.width,
            spec.height,
            spec.device_pixel_ratio,
            surface.pixel_width(),
            surface.pixel_height()
        );
        Ok(Self {
            surface,
            scheduler,
            stimuli: Registry::new(),
            particles: ParticleSystem::new(settings.rng(PARTICLE_STREAM), settings),
            shake_rng: settings.rng(SHAKE_STREAM),
            stress: StressLevel::CALM,
            stress_rx: None,
            frame: 0,
            running: false,
            pending: None,
        })
    }

    // ------------------------------------------------------------------------
    // Stimulus Registry
    // ------------------------------------------------------------------------

    /// Add a stimulus; an existing one with the same id is replaced in place
    pub fn add_stimulus(&mut self, stimulus: VisualStimulus) {
        let id = stimulus.id.clone();
        if self.stimuli.insert(id.clone(), stimulus).is_some() {
            debug!("[VISUAL] Replaced stimulus '{}'", id);
        } else {
            debug!("[VISUAL] Added stimulus '{}'", id);
        }
    }

    /// Remove a stimulus; unknown ids are ignored
    pub fn remove_stimulus(&mut self, id: &str) -> Option<VisualStimulus> {
        let removed = self.stimuli.remove(id);
        if removed.is_some() {
            debug!("[VISUAL] Removed stimulus '{}'", id);
        }
        removed
    }

    /// Drop every stimulus and every particle
    pub fn clear_all_stimuli(&mut self) {
        self.stimuli.clear();
        self.particles.clear();
    }

    /// Replace the stimulus stack with `config`'s
    pub fn apply_config(&mut self, config: &VisualConfig) {
        self.clear_all_stimuli();
        for stimulus in &config.stimuli {
            self.add_stimulus(stimulus.clone());
        }
    }

    pub fn stimulus(&self, id: &str) -> Option<&VisualStimulus> {
        self.stimuli.get(id)
    }

    /// Stimulus ids in draw order
    pub fn stimulus_ids(&self) -> Vec<String> {
        self.stimuli.ids().map(str::to_string).collect()
    }

    pub fn stimulus_count(&self) -> usize {
        self.stimuli.len()
    }

    // ------------------------------------------------------------------------
    // Stress
    // ------------------------------------------------------------------------

    /// Store the stress level; it applies from the next frame
    pub fn update_stress_level(&mut self, level: impl Into<StressLevel>) {
        self.stress = level.into();
    }

    /// Feed stress from a channel; polled at the start of every frame
    pub fn attach_stress(&mut self, receiver: StressReceiver) {
        self.stress_rx = Some(receiver);
    }

    pub fn stress_level(&self) -> StressLevel {
        self.stress
    }

    // ------------------------------------------------------------------------
    // Render Loop
    // ------------------------------------------------------------------------

    /// Start the loop. Does nothing if already running.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.pending = Some(self.scheduler.request_frame());
        debug!("[VISUAL] Render loop started");
    }

    /// Stop the loop and cancel the pending frame. Safe when not running.
    pub fn stop(&mut self) {
        self.running = false;
        if let Some(token) = self.pending.take() {
            self.scheduler.cancel_frame(token);
            debug!("[VISUAL] Render loop stopped at frame {}", self.frame);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Token of the frame the loop is waiting on
    pub fn pending_frame(&self) -> Option<FrameToken> {
        self.pending
    }

    /// Frame callback from the host.
    ///
    /// Renders one frame and schedules the next if `token` is the one the
    /// loop is waiting on. Stale or cancelled tokens return `None`.
    pub fn on_animation_frame(&mut self, token: FrameToken) -> Option<FrameReport> {
        if !self.running || self.pending != Some(token) {
            trace!("[VISUAL] Ignoring stale frame token {:?}", token);
            return None;
        }
        self.pending = None;
        let report = self.render_frame();
        self.pending = Some(self.scheduler.request_frame());
        Some(report)
    }

    /// Run exactly one loop iteration, whether or not the loop is running
    pub fn render_frame(&mut self) -> FrameReport {
        if let Some(level) = self.stress_rx.as_mut().and_then(StressReceiver::poll) {
            self.stress = level;
        }

        self.frame += 1;
        self.surface.clear();

        let stress = self.stress.value();
        let mut outcomes = Vec::with_capacity(self.stimuli.len());
        for (id, stimulus) in self.stimuli.iter() {
            let outcome = match &stimulus.kind {
                StimulusKind::Flicker => {
                    render_flicker(&mut self.surface, self.frame, stimulus, stress)
                }
                StimulusKind::Particle => {
                    render_particles(&mut self.surface, &mut self.particles, stimulus, stress)
                }
                StimulusKind::Distortion => {
                    let intensity = effective_intensity(stimulus.intensity, stress);
                    if apply_distortion(&mut self.surface, self.frame, intensity) {
                        StimulusOutcome::Drawn
                    } else {
                        StimulusOutcome::Idle
                    }
                }
                StimulusKind::Overlay => {
                    render_overlay(
                        &mut self.surface,
                        stimulus.color.unwrap_or(DEFAULT_OVERLAY_COLOR),
                        stimulus.opacity.unwrap_or(DEFAULT_OVERLAY_OPACITY),
                        stress,
                    );
                    StimulusOutcome::Drawn
                }
                StimulusKind::Shake => {
                    let (dx, dy) = render_shake(
                        &mut self.surface,
                        &mut self.shake_rng,
                        stimulus.intensity,
                        stress,
                    );
                    StimulusOutcome::Shake { dx, dy }
                }
                StimulusKind::Other(kind) => StimulusOutcome::Skipped { kind: kind.clone() },
            };
            outcomes.push((id.to_string(), outcome));
        }

        self.particles.retire_dead();
        trace!(
            "[VISUAL] Frame {} at stress {} ({} particles)",
            self.frame,
            self.stress,
            self.particles.len()
        );

        FrameReport {
            frame: self.frame,
            stress: self.stress,
            outcomes,
            particle_count: self.particles.len(),
        }
    }

    /// Stop and drop every stimulus. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        self.stop();
        self.clear_all_stimuli();
        self.stress_rx = None;
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Frames rendered so far
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }
}

impl<S: FrameScheduler> std::fmt::Debug for VisualStimulusEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisualStimulusEngine")
            .field("stimuli", &self.stimulus_ids())
            .field("frame", &self.frame)
            .field("running", &self.running)
            .field("stress", &self.stress)
            .finish()
    }
}

fn render_flicker(
    surface: &mut Surface,
    frame: u64,
    stimulus: &VisualStimulus,
    stress: f32,
) -> StimulusOutcome {
    let frequency = stimulus.frequency.unwrap_or(DEFAULT_FLICKER_FREQUENCY);
    if !flicker_active(frame, frequency, stimulus.intensity, stress) {
        return StimulusOutcome::Idle;
    }
    let color: Color = stimulus.color.unwrap_or(DEFAULT_FLICKER_COLOR);
    surface.fill(color.with_opacity(stimulus.opacity.unwrap_or(DEFAULT_FLICKER_OPACITY)));
    StimulusOutcome::Drawn
}

fn render_particles(
    surface: &mut Surface,
    particles: &mut ParticleSystem,
    stimulus: &VisualStimulus,
    stress: f32,
) -> StimulusOutcome {
    let target = particles.target_count(stimulus.intensity, stress);
    let style = ParticleStyle {
        size: stimulus.size.unwrap_or(DEFAULT_PARTICLE_SIZE),
        color: stimulus.color.unwrap_or(DEFAULT_PARTICLE_COLOR),
        speed: stimulus.speed.unwrap_or(DEFAULT_PARTICLE_SPEED),
    };
    particles.resize(target, surface.width(), surface.height(), style);
    particles.step_and_draw(surface);

    if particles.is_empty() {
        StimulusOutcome::Idle
    } else {
        StimulusOutcome::Drawn
    }
}

// ============================================================================
// Tests
// ============================================================================
