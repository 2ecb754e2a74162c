//! Audio Layer Engine
//!
//! Builds a soundscape out of named layers and couples their loudness and
//! brightness to the stress level:
//!
//! ```text
//! source -> [distortion] -> [reverb] -> [delay] -> low-pass -> gain -> master
//! ```
//!
//! ## Lifecycle
//!
//! ```text
//! Uninitialized --initialize--> Empty <--create_soundscape / clear_all_layers--> Populated
//! ```
//!
//! Starting and stopping layers toggles playback only; it never moves the
//! state machine. Audio is pulled with [`AudioLayerEngine::render`] and is
//! silent until the backend runs.

use super::config::{LayerSpec, SoundscapeConfig, SourceType};
use super::layer::AudioLayer;
use crate::dsp::{
    create_effect, EffectChain, GainStage, LowPassFilter, Oscillator, PinkNoise, SamplePlayer,
    SourceKind, SourceNode, DEFAULT_CUTOFF_HZ, DEFAULT_FREQUENCY_HZ,
};
use crate::engine::{
    import_wav, AudioBackend, AudioBuffer, ChannelLayout, OfflineBackend,
};
use crate::error::{OverloadError, Result};
use crate::registry::Registry;
use crate::settings::EngineSettings;
use crate::signal::{StressLevel, StressReceiver};
use log::{debug, warn};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Gain boost at full stress (gain = volume * (1 + STRESS_GAIN_SCALE * stress))
pub const STRESS_GAIN_SCALE: f32 = 0.5;

/// Cutoff added at full stress, on top of the resting cutoff
pub const STRESS_CUTOFF_RANGE_HZ: f32 = 2000.0;

/// First random stream handed to noise layers
const NOISE_STREAM_BASE: u64 = 0x100;

// ============================================================================
// Engine State
// ============================================================================

/// Where the engine is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Backend not yet unlocked
    Uninitialized,
    /// Initialized with no layers
    Empty,
    /// Initialized with at least one layer
    Populated,
}

// ============================================================================
// Audio Layer Engine
// ============================================================================

/// Multi-layer procedural soundscape driven by the stress level
pub struct AudioLayerEngine<B: AudioBackend = OfflineBackend> {
    settings: EngineSettings,
    backend: B,
    initialized: bool,
    layers: Registry<AudioLayer>,
    master: GainStage,
    stress: StressLevel,
    stress_rx: Option<StressReceiver>,
    samples: HashMap<String, Arc<[f32]>>,
    soundscape: Option<SoundscapeConfig>,
    next_noise_stream: u64,
    frames_rendered: u64,
}

impl AudioLayerEngine<OfflineBackend> {
    /// Create an engine rendering offline at the configured sample rate
    pub fn new(settings: EngineSettings) -> Self {
        let backend = OfflineBackend::new(settings.sample_rate);
        Self::with_backend(settings, backend)
    }
}

impl<B: AudioBackend> AudioLayerEngine<B> {
    /// Create an engine on top of an explicit backend
    pub fn with_backend(settings: EngineSettings, backend: B) -> Self {
        let master = GainStage::new(settings.master_gain, backend.sample_rate());
        Self {
            settings,
            backend,
            initialized: false,
            layers: Registry::new(),
            master,
            stress: StressLevel::CALM,
            stress_rx: None,
            samples: HashMap::new(),
            soundscape: None,
            next_noise_stream: NOISE_STREAM_BASE,
            frames_rendered: 0,
        }
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Unlock the backend. A second call once initialized is a no-op.
    ///
    /// # Errors
    /// `BackendUnavailable` if the backend refuses to start; the host should
    /// retry, typically after a user interaction.
    pub fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        self.backend.resume()?;
        self.initialized = true;
        debug!(
            "[SOUNDSCAPE] Initialized on {} at {} Hz",
            self.backend.name(),
            self.backend.sample_rate()
        );
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn state(&self) -> EngineState {
        if !self.initialized {
            EngineState::Uninitialized
        } else if self.layers.is_empty() {
            EngineState::Empty
        } else {
            EngineState::Populated
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Stop and release everything. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        self.stop_all_layers();
        self.clear_all_layers();
        self.soundscape = None;
        self.stress_rx = None;
    }

    // ------------------------------------------------------------------------
    // Graph Construction
    // ------------------------------------------------------------------------

    /// Replace the current soundscape with `config`.
    ///
    /// Existing layers are disposed first. If a layer spec is invalid the
    /// layers before it stay registered, no soundscape is recorded and the
    /// error is returned.
    pub fn create_soundscape(&mut self, config: &SoundscapeConfig) -> Result<()> {
        self.clear_all_layers();
        self.soundscape = None;
        for (id, spec) in &config.layers {
            self.add_layer(id, spec)?;
        }
        self.soundscape = Some(config.clone());
        debug!("[SOUNDSCAPE] Created soundscape with {} layers", self.layers.len());
        Ok(())
    }

    /// Build the node graph for `spec` and register it under `id`.
    ///
    /// An existing layer with the same id is disposed and replaced.
    ///
    /// # Errors
    /// `UnknownSourceType` for a source type the engine cannot build.
    /// Nothing is registered in that case.
    pub fn add_layer(&mut self, id: &str, spec: &LayerSpec) -> Result<()> {
        let sample_rate = self.backend.sample_rate();
        let source = self.build_source(id, spec)?;

        let mut effects = EffectChain::new(sample_rate);
        for &kind in &spec.effects {
            effects.add(create_effect(kind));
        }

        let volume = spec.volume.clamp(0.0, 1.0);
        let layer = AudioLayer::new(
            id,
            source,
            effects,
            LowPassFilter::new(DEFAULT_CUTOFF_HZ, sample_rate),
            GainStage::new(volume, sample_rate),
            sample_rate,
        );

        if let Some(mut previous) = self.layers.insert(id, layer) {
            previous.dispose();
            debug!("[SOUNDSCAPE] Replaced layer '{}'", id);
        } else {
            debug!(
                "[SOUNDSCAPE] Added {} layer '{}' (effects: {:?})",
                spec.source_type, id, spec.effects
            );
        }
        Ok(())
    }

    fn build_source(&mut self, id: &str, spec: &LayerSpec) -> Result<SourceNode> {
        let kind = match &spec.source_type {
            SourceType::Oscillator => SourceKind::Oscillator(Oscillator::new(
                spec.frequency.unwrap_or(DEFAULT_FREQUENCY_HZ),
            )),
            SourceType::Noise => {
                let rng = self.settings.rng(self.next_noise_stream);
                self.next_noise_stream += 1;
                SourceKind::Noise(PinkNoise::new(rng))
            }
            SourceType::Sample => SourceKind::Sample(self.resolve_sample(id, spec)),
            SourceType::Other(name) => {
                return Err(OverloadError::UnknownSourceType {
                    layer_id: id.to_string(),
                    source_type: name.clone(),
                })
            }
        };
        Ok(SourceNode::new(kind))
    }

    /// Look up a sample in the bank, falling back to a WAV path on disk.
    /// Anything unresolvable plays silence.
    fn resolve_sample(&mut self, id: &str, spec: &LayerSpec) -> SamplePlayer {
        let Some(sample_ref) = spec.sample_ref.as_deref() else {
            warn!("[SOUNDSCAPE] Sample layer '{}' has no sample reference", id);
            return SamplePlayer::silent();
        };

        if let Some(sample) = self.samples.get(sample_ref) {
            return SamplePlayer::new(Arc::clone(sample));
        }

        match import_wav(Path::new(sample_ref), self.backend.sample_rate()) {
            Ok(buffer) => {
                let sample = downmix(&buffer);
                self.samples.insert(sample_ref.to_string(), Arc::clone(&sample));
                SamplePlayer::new(sample)
            }
            Err(e) => {
                warn!(
                    "[SOUNDSCAPE] Layer '{}' will be silent: {} ({})",
                    id,
                    e,
                    e.error_code()
                );
                SamplePlayer::silent()
            }
        }
    }

    /// Make a decoded buffer available to sample layers under `name`
    pub fn register_sample(&mut self, name: impl Into<String>, buffer: &AudioBuffer) {
        let name = name.into();
        debug!(
            "[SOUNDSCAPE] Registered sample '{}' ({:.2}s)",
            name,
            buffer.duration_secs()
        );
        self.samples.insert(name, downmix(buffer));
    }

    /// Remove one layer, releasing its nodes. Unknown ids are ignored.
    pub fn remove_layer(&mut self, id: &str) -> bool {
        match self.layers.remove(id) {
            Some(mut layer) => {
                layer.dispose();
                debug!("[SOUNDSCAPE] Removed layer '{}'", id);
                true
            }
            None => false,
        }
    }

    /// Release every node in every layer. Safe on an empty engine.
    pub fn clear_all_layers(&mut self) {
        let mut released = 0;
        for (_, mut layer) in self.layers.drain() {
            released += layer.dispose();
        }
        if released > 0 {
            debug!("[SOUNDSCAPE] Cleared layers ({} nodes released)", released);
        }
    }

    // ------------------------------------------------------------------------
    // Playback
    // ------------------------------------------------------------------------

    /// Start a layer's source; unknown ids are ignored
    pub fn start_layer(&mut self, id: &str) {
        if let Some(layer) = self.layers.get_mut(id) {
            layer.start();
        }
    }

    /// Stop a layer's source; unknown ids are ignored
    pub fn stop_layer(&mut self, id: &str) {
        if let Some(layer) = self.layers.get_mut(id) {
            layer.stop();
        }
    }

    pub fn start_all_layers(&mut self) {
        self.layers.values_mut().for_each(AudioLayer::start);
    }

    pub fn stop_all_layers(&mut self) {
        self.layers.values_mut().for_each(AudioLayer::stop);
    }

    // ------------------------------------------------------------------------
    // Modulation
    // ------------------------------------------------------------------------

    /// Store the stress level and glide every layer towards it.
    ///
    /// Each layer's gain ramps from its current level to
    /// `gain * (1 + 0.5 * stress)` and its cutoff to `1000 + 2000 * stress` Hz.
    pub fn update_stress_level(&mut self, level: impl Into<StressLevel>) {
        self.stress = level.into();
        let stress = self.stress.value();
        let gain_factor = 1.0 + stress * STRESS_GAIN_SCALE;
        let cutoff = DEFAULT_CUTOFF_HZ + stress * STRESS_CUTOFF_RANGE_HZ;

        for layer in self.layers.values_mut() {
            let target = layer.gain().level() * gain_factor;
            layer.gain_mut().ramp_to(target, self.settings.gain_glide_secs);
            layer
                .filter_mut()
                .ramp_cutoff(cutoff, self.settings.filter_glide_secs);
        }
    }

    /// Feed stress from a channel; polled at every block boundary
    pub fn attach_stress(&mut self, receiver: StressReceiver) {
        self.stress_rx = Some(receiver);
    }

    /// Glide a layer's gain to `volume` (clamped to 0-1). Unknown ids are
    /// ignored.
    pub fn set_layer_volume(&mut self, id: &str, volume: f32) {
        let glide = self.settings.volume_glide_secs;
        if let Some(layer) = self.layers.get_mut(id) {
            layer.gain_mut().ramp_to(volume.clamp(0.0, 1.0), glide);
        }
    }

    /// Glide the master gain to `volume` (clamped to 0-1)
    pub fn set_master_volume(&mut self, volume: f32) {
        self.master
            .ramp_to(volume.clamp(0.0, 1.0), self.settings.volume_glide_secs);
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    /// Pull `frames` of stereo audio.
    ///
    /// While the backend is not running this returns silence and the
    /// engine's clock (ramps, oscillators) does not advance.
    pub fn render(&mut self, frames: usize) -> AudioBuffer {
        let sample_rate = self.backend.sample_rate();
        let mut output = AudioBuffer::new(frames, ChannelLayout::Stereo, sample_rate);
        if !self.backend.is_running() || frames == 0 {
            return output;
        }

        let block_size = self.settings.block_size.max(1);
        let mut block = AudioBuffer::new(block_size, ChannelLayout::Stereo, sample_rate);
        let mut offset = 0;
        while offset < frames {
            let len = block_size.min(frames - offset);
            self.poll_stress();

            block.resize(len);
            block.clear();
            for layer in self.layers.values_mut() {
                layer.render_into(&mut block, len);
            }
            self.master.process(&mut block);

            for (out, src) in output.samples.iter_mut().zip(block.samples.iter()) {
                out[offset..offset + len].copy_from_slice(&src[..len]);
            }
            offset += len;
        }

        self.frames_rendered += frames as u64;
        output
    }

    fn poll_stress(&mut self) {
        let latest = self.stress_rx.as_mut().and_then(StressReceiver::poll);
        if let Some(level) = latest {
            self.update_stress_level(level);
        }
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Layer ids in registration order
    pub fn layer_ids(&self) -> Vec<String> {
        self.layers.ids().map(str::to_string).collect()
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn has_layer(&self, id: &str) -> bool {
        self.layers.contains(id)
    }

    pub fn layer(&self, id: &str) -> Option<&AudioLayer> {
        self.layers.get(id)
    }

    /// Current linear gain of a layer
    pub fn layer_gain(&self, id: &str) -> Option<f32> {
        self.layers.get(id).map(|layer| layer.gain().level())
    }

    /// Current low-pass cutoff of a layer in Hz
    pub fn layer_cutoff(&self, id: &str) -> Option<f32> {
        self.layers.get(id).map(|layer| layer.filter().cutoff())
    }

    pub fn is_layer_playing(&self, id: &str) -> bool {
        self.layers.get(id).is_some_and(AudioLayer::is_playing)
    }

    /// Current master gain
    pub fn master_volume(&self) -> f32 {
        self.master.level()
    }

    pub fn stress_level(&self) -> StressLevel {
        self.stress
    }

    /// The config the current soundscape was built from
    pub fn soundscape(&self) -> Option<&SoundscapeConfig> {
        self.soundscape.as_ref()
    }

    /// Total frames rendered while the backend was running
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }
}

impl<B: AudioBackend> std::fmt::Debug for AudioLayerEngine<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioLayerEngine")
            .field("backend", &self.backend.name())
            .field("state", &self.state())
            .field("layers", &self.layer_ids())
            .field("stress", &self.stress)
            .finish()
    }
}

/// Average every channel into one shared mono sample
fn downmix(buffer: &AudioBuffer) -> Arc<[f32]> {
    let channels = buffer.num_channels().max(1) as f32;
    (0..buffer.num_samples())
        .map(|i| buffer.samples.iter().map(|ch| ch[i]).sum::<f32>() / channels)
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::EffectKind;
    use approx::assert_abs_diff_eq;

    fn engine() -> AudioLayerEngine {
        let mut engine = AudioLayerEngine::new(EngineSettings::seeded(11));
        engine.initialize().unwrap();
        engine
    }

    /// Render long enough for every glide to settle
    fn settle(engine: &mut AudioLayerEngine) {
        let frames = engine.settings().sample_rate as usize / 2;
        engine.render(frames);
    }

    #[test]
    fn test_state_machine() {
        let mut engine = AudioLayerEngine::new(EngineSettings::seeded(1));
        assert_eq!(engine.state(), EngineState::Uninitialized);

        engine.initialize().unwrap();
        assert_eq!(engine.state(), EngineState::Empty);
        engine.initialize().unwrap();

        engine
            .create_soundscape(&SoundscapeConfig::cognitive_load())
            .unwrap();
        assert_eq!(engine.state(), EngineState::Populated);

        engine.start_all_layers();
        assert_eq!(engine.state(), EngineState::Populated);

        engine.clear_all_layers();
        assert_eq!(engine.state(), EngineState::Empty);
    }

    #[test]
    fn test_gesture_locked_backend() {
        let settings = EngineSettings::seeded(1);
        let backend = OfflineBackend::gesture_locked(settings.sample_rate);
        let mut engine = AudioLayerEngine::with_backend(settings, backend);

        let err = engine.initialize().unwrap_err();
        assert_eq!(err.error_code(), "BACKEND_UNAVAILABLE");
        assert!(err.is_recoverable());
        assert_eq!(engine.state(), EngineState::Uninitialized);

        engine.backend_mut().grant_gesture();
        engine.initialize().unwrap();
        assert_eq!(engine.state(), EngineState::Empty);
    }

    #[test]
    fn test_unknown_source_type_registers_nothing() {
        let mut engine = engine();
        let spec = LayerSpec {
            source_type: SourceType::from("bogus"),
            frequency: None,
            sample_ref: None,
            volume: 0.5,
            effects: [EffectKind::Reverb].into_iter().collect(),
        };

        let err = engine.add_layer("broken", &spec).unwrap_err();
        assert!(matches!(err, OverloadError::UnknownSourceType { .. }));
        assert!(!err.is_recoverable());
        assert!(!engine.has_layer("broken"));
        assert_eq!(engine.layer_count(), 0);
    }

    #[test]
    fn test_effect_chain_order() {
        let mut engine = engine();
        let spec = LayerSpec::noise(0.5).with_effects([
            EffectKind::Delay,
            EffectKind::Reverb,
            EffectKind::Distortion,
        ]);
        engine.add_layer("all", &spec).unwrap();

        let kinds = engine.layer("all").unwrap().effects().kinds();
        assert_eq!(
            kinds,
            vec![EffectKind::Distortion, EffectKind::Reverb, EffectKind::Delay]
        );
    }

    #[test]
    fn test_stress_ramp_converges() {
        let mut engine = engine();
        engine
            .add_layer("hum", &LayerSpec::oscillator(120.0, 0.4))
            .unwrap();
        engine.start_all_layers();

        let previous = engine.layer_gain("hum").unwrap();
        engine.update_stress_level(1.0);
        // Ramps, not jumps
        assert_abs_diff_eq!(engine.layer_gain("hum").unwrap(), previous);

        settle(&mut engine);
        assert_abs_diff_eq!(engine.layer_gain("hum").unwrap(), previous * 1.5, epsilon = 1e-5);
        assert_abs_diff_eq!(engine.layer_cutoff("hum").unwrap(), 3000.0, epsilon = 1e-2);
    }

    #[test]
    fn test_stress_scales_current_gain() {
        let mut engine = engine();
        engine.add_layer("hum", &LayerSpec::oscillator(60.0, 0.4)).unwrap();

        engine.update_stress_level(0.5);
        settle(&mut engine);
        let settled = engine.layer_gain("hum").unwrap();
        assert_abs_diff_eq!(settled, 0.5, epsilon = 1e-5);

        engine.update_stress_level(1.0);
        settle(&mut engine);
        assert_abs_diff_eq!(engine.layer_gain("hum").unwrap(), settled * 1.5, epsilon = 1e-5);
    }

    #[test]
    fn test_layer_volume_ignores_stress() {
        let mut engine = engine();
        engine.add_layer("hum", &LayerSpec::oscillator(60.0, 0.4)).unwrap();
        engine.update_stress_level(1.0);
        settle(&mut engine);

        engine.set_layer_volume("hum", 0.3);
        settle(&mut engine);
        assert_abs_diff_eq!(engine.layer_gain("hum").unwrap(), 0.3, epsilon = 1e-5);
    }

    #[test]
    fn test_final_stress_applies_after_publisher_drop() {
        let mut engine = engine();
        let signal = crate::signal::StressSignal::new();
        engine.attach_stress(signal.subscribe());

        signal.publish(0.8);
        drop(signal);
        engine.render(512);

        assert_eq!(engine.stress_level(), StressLevel::new(0.8));
    }

    #[test]
    fn test_stress_is_clamped() {
        let mut engine = engine();
        engine.update_stress_level(3.0);
        assert_eq!(engine.stress_level().value(), 1.0);
        engine.update_stress_level(-1.0);
        assert_eq!(engine.stress_level().value(), 0.0);
    }

    #[test]
    fn test_volume_ramps() {
        let mut engine = engine();
        engine.add_layer("a", &LayerSpec::noise(0.2)).unwrap();
        engine.set_layer_volume("a", 0.8);
        engine.set_master_volume(2.0);
        engine.set_layer_volume("missing", 0.1);

        settle(&mut engine);
        assert_abs_diff_eq!(engine.layer_gain("a").unwrap(), 0.8, epsilon = 1e-5);
        assert_abs_diff_eq!(engine.master_volume(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_render_silent_until_running() {
        let mut engine = AudioLayerEngine::new(EngineSettings::seeded(2));
        engine.add_layer("hum", &LayerSpec::oscillator(440.0, 1.0)).unwrap();
        engine.start_all_layers();
        engine.update_stress_level(1.0);

        let buffer = engine.render(1024);
        assert_eq!(buffer.peak(), 0.0);
        assert_eq!(engine.frames_rendered(), 0);
        // Clock frozen: the ramp has not moved
        assert_abs_diff_eq!(engine.layer_gain("hum").unwrap(), 1.0);

        engine.initialize().unwrap();
        let buffer = engine.render(1024);
        assert!(buffer.peak() > 0.0);
        assert_eq!(engine.frames_rendered(), 1024);
    }

    #[test]
    fn test_start_stop_layers() {
        let mut engine = engine();
        engine
            .create_soundscape(&SoundscapeConfig::sensory_overload())
            .unwrap();

        engine.start_layer("crowd");
        engine.start_layer("nobody");
        assert!(engine.is_layer_playing("crowd"));
        assert!(!engine.is_layer_playing("traffic"));

        engine.start_all_layers();
        assert!(engine.layer_ids().iter().all(|id| engine.is_layer_playing(id)));

        engine.stop_layer("crowd");
        assert!(!engine.is_layer_playing("crowd"));
        engine.stop_all_layers();
        engine.stop_all_layers();
        assert!(!engine.is_layer_playing("traffic"));
    }

    #[test]
    fn test_create_soundscape_replaces_layers() {
        let mut engine = engine();
        engine
            .create_soundscape(&SoundscapeConfig::sensory_overload())
            .unwrap();
        engine
            .create_soundscape(&SoundscapeConfig::cognitive_load())
            .unwrap();

        let mut ids = engine.layer_ids();
        ids.sort();
        assert_eq!(ids, vec!["mental_fog".to_string(), "pressure".to_string()]);
        assert_eq!(engine.soundscape(), Some(&SoundscapeConfig::cognitive_load()));
    }

    #[test]
    fn test_failed_soundscape_forgets_previous_config() {
        let mut engine = engine();
        engine
            .create_soundscape(&SoundscapeConfig::cognitive_load())
            .unwrap();

        let broken = SoundscapeConfig::new(0.5, 1.0)
            .with_layer("a_hum", LayerSpec::oscillator(100.0, 0.3))
            .with_layer(
                "b_grains",
                LayerSpec {
                    source_type: SourceType::from("granular"),
                    ..LayerSpec::noise(0.3)
                },
            );
        let err = engine.create_soundscape(&broken).unwrap_err();

        assert!(matches!(err, OverloadError::UnknownSourceType { .. }));
        assert!(engine.soundscape().is_none());
        assert_eq!(engine.layer_ids(), vec!["a_hum".to_string()]);
    }

    #[test]
    fn test_clear_and_dispose_are_idempotent() {
        let mut engine = engine();
        engine.clear_all_layers();
        engine.clear_all_layers();
        assert_eq!(engine.layer_count(), 0);

        engine.create_soundscape(&SoundscapeConfig::meltdown()).unwrap();
        engine.dispose();
        engine.dispose();
        assert_eq!(engine.layer_count(), 0);
        assert!(engine.soundscape().is_none());
    }

    #[test]
    fn test_remove_layer() {
        let mut engine = engine();
        engine.add_layer("a", &LayerSpec::noise(0.3)).unwrap();
        assert!(engine.remove_layer("a"));
        assert!(!engine.remove_layer("a"));
    }

    #[test]
    fn test_missing_sample_plays_silence() {
        let mut engine = engine();
        engine
            .add_layer("rain", &LayerSpec::sample("no/such/file.wav", 1.0))
            .unwrap();
        engine.start_all_layers();
        assert_eq!(engine.render(512).peak(), 0.0);
    }

    #[test]
    fn test_registered_sample_plays() {
        let mut engine = engine();
        let mut clip = AudioBuffer::new(256, ChannelLayout::Mono, 48000);
        clip.channel_mut(0).fill(0.5);
        engine.register_sample("clap", &clip);

        engine.add_layer("clap", &LayerSpec::sample("clap", 1.0)).unwrap();
        engine.start_layer("clap");
        assert!(engine.render(512).peak() > 0.0);
    }

    #[test]
    fn test_attached_stress_applies_at_block_boundary() {
        let mut engine = engine();
        engine.add_layer("hum", &LayerSpec::oscillator(100.0, 0.4)).unwrap();

        let signal = crate::signal::StressSignal::new();
        engine.attach_stress(signal.subscribe());
        signal.publish(1.0);
        assert_eq!(engine.stress_level().value(), 0.0);

        settle(&mut engine);
        assert_eq!(engine.stress_level().value(), 1.0);
        assert_abs_diff_eq!(engine.layer_gain("hum").unwrap(), 0.6, epsilon = 1e-5);
    }

    #[test]
    fn test_seeded_render_is_reproducible() {
        let render = || {
            let mut engine = engine();
            engine.create_soundscape(&SoundscapeConfig::meltdown()).unwrap();
            engine.start_all_layers();
            engine.update_stress_level(0.7);
            engine.render(4096).to_interleaved()
        };
        assert_eq!(render(), render());
    }
}
