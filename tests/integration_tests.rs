//! Integration Tests
//!
//! End-to-end tests driving both engines through the public API.

use approx::assert_abs_diff_eq;
use pretty_assertions::assert_eq;

use overload::engine::{import_wav, OfflineBackend};
use overload::soundscape::{write_wav, AudioLayerEngine, LayerSpec, SoundscapeConfig};
use overload::visual::{
    ManualFrameScheduler, StimulusOutcome, SurfaceSpec, VisualConfig, VisualStimulusEngine,
};
use overload::{EngineSettings, OverloadError, StressLevel, StressSignal};

const SAMPLE_RATE: u32 = 48_000;

fn audio_engine(seed: u64) -> AudioLayerEngine {
    let mut engine = AudioLayerEngine::new(EngineSettings::seeded(seed));
    engine.initialize().unwrap();
    engine
}

fn visual_engine(seed: u64) -> VisualStimulusEngine {
    VisualStimulusEngine::new(
        SurfaceSpec::new(64.0, 48.0, 1.0),
        ManualFrameScheduler::new(),
        &EngineSettings::seeded(seed),
    )
    .unwrap()
}

// === Soundscape Tests ===

#[test]
fn test_crowd_soundscape_end_to_end() {
    let config = SoundscapeConfig::from_json_str(
        r#"{
            "baseVolume": 0.6,
            "stressMultiplier": 1.5,
            "layers": {
                "crowd": { "sourceType": "noise", "volume": 0.4, "effects": ["distortion"] }
            }
        }"#,
    )
    .unwrap();

    let mut engine = audio_engine(3);
    engine.create_soundscape(&config).unwrap();
    engine.start_all_layers();
    engine.update_stress_level(0.5);

    // Half a second is well past every glide
    let output = engine.render(SAMPLE_RATE as usize / 2);

    assert_eq!(engine.layer_ids(), vec!["crowd".to_string()]);
    assert!(engine.is_layer_playing("crowd"));
    let gain = engine.layer_gain("crowd").unwrap();
    assert!(gain > 0.4, "gain should ramp above the base volume, got {gain}");
    assert_abs_diff_eq!(gain, 0.5, epsilon = 1e-3);
    assert!(output.peak() > 0.0);
}

#[test]
fn test_unknown_source_type_registers_nothing() {
    let spec: LayerSpec =
        serde_json::from_str(r#"{ "type": "granular", "volume": 0.5 }"#).unwrap();

    let mut engine = audio_engine(1);
    let err = engine.add_layer("grains", &spec).unwrap_err();

    assert!(matches!(err, OverloadError::UnknownSourceType { .. }));
    assert_eq!(err.error_code(), "UNKNOWN_SOURCE_TYPE");
    assert_eq!(engine.layer_count(), 0);
}

#[test]
fn test_gesture_locked_backend_recovers() {
    let mut engine = AudioLayerEngine::with_backend(
        EngineSettings::default(),
        OfflineBackend::gesture_locked(SAMPLE_RATE),
    );

    let err = engine.initialize().unwrap_err();
    assert!(err.is_recoverable());
    assert!(!engine.is_initialized());

    engine.backend_mut().grant_gesture();
    engine.initialize().unwrap();
    assert!(engine.is_initialized());
}

#[test]
fn test_wav_export_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cognitive_load.wav");

    let mut engine = audio_engine(11);
    engine
        .create_soundscape(&SoundscapeConfig::cognitive_load())
        .unwrap();
    engine.start_all_layers();
    let rendered = engine.render(4_800);
    write_wav(&rendered, &path).unwrap();

    let loaded = import_wav(&path, SAMPLE_RATE).unwrap();
    assert_eq!(loaded.num_channels(), 2);
    assert_eq!(loaded.num_samples(), 4_800);
    for (original, read) in rendered.samples[0].iter().zip(&loaded.samples[0]) {
        assert_abs_diff_eq!(original.clamp(-1.0, 1.0), *read, epsilon = 1e-3);
    }
}

#[test]
fn test_seeded_soundscapes_match() {
    let mut first = audio_engine(42);
    let mut second = audio_engine(42);
    for engine in [&mut first, &mut second] {
        engine
            .create_soundscape(&SoundscapeConfig::sensory_overload())
            .unwrap();
        engine.start_all_layers();
        engine.update_stress_level(0.6);
    }

    let a = first.render(4_096);
    let b = second.render(4_096);
    assert_eq!(a.samples, b.samples);
}

// === Visual Tests ===

#[test]
fn test_seeded_visuals_match() {
    let mut first = visual_engine(9);
    let mut second = visual_engine(9);
    for engine in [&mut first, &mut second] {
        engine.apply_config(&VisualConfig::meltdown());
        engine.update_stress_level(0.7);
    }

    for _ in 0..10 {
        let a = first.render_frame();
        let b = second.render_frame();
        assert_eq!(a, b);
    }
    assert_eq!(first.surface().pixels(), second.surface().pixels());
}

#[test]
fn test_unknown_stimulus_kind_is_skipped() {
    let config = VisualConfig::from_json_str(
        r##"{
            "stimuli": [
                { "id": "vortex", "type": "vortex", "intensity": 1.0 },
                { "id": "wash", "type": "overlay", "intensity": 0.5, "color": "#ff0000" }
            ],
            "stressMultiplier": 1.0
        }"##,
    )
    .unwrap();

    let mut engine = visual_engine(2);
    engine.apply_config(&config);
    let report = engine.render_frame();

    assert_eq!(report.skipped().collect::<Vec<_>>(), vec!["vortex"]);
    assert_eq!(report.outcome("wash"), Some(&StimulusOutcome::Drawn));
}

// === Coupling Tests ===

#[test]
fn test_shared_signal_converges_both_engines() {
    let signal = StressSignal::new();
    let mut audio = audio_engine(5);
    let mut visual = visual_engine(5);
    audio
        .create_soundscape(&SoundscapeConfig::sensory_overload())
        .unwrap();
    visual.apply_config(&VisualConfig::sensory_overload());
    audio.attach_stress(signal.subscribe());
    visual.attach_stress(signal.subscribe());
    assert_eq!(signal.receiver_count(), 2);

    // Only the newest level matters
    signal.publish(0.2);
    signal.publish(0.4);
    signal.publish(0.8);

    audio.render(256);
    visual.render_frame();

    assert_eq!(audio.stress_level(), StressLevel::new(0.8));
    assert_eq!(visual.stress_level(), StressLevel::new(0.8));
}

#[test]
fn test_host_frame_loop() {
    let mut visual = visual_engine(8);
    let host = visual.scheduler().clone();
    visual.apply_config(&VisualConfig::cognitive_load());
    visual.start();

    let mut frames = 0;
    for _ in 0..5 {
        for token in host.take_pending() {
            if visual.on_animation_frame(token).is_some() {
                frames += 1;
            }
        }
    }
    assert_eq!(frames, 5);
    assert_eq!(visual.frame_count(), 5);

    visual.stop();
    assert!(host.take_pending().is_empty());
    visual.dispose();
    assert_eq!(visual.stimulus_count(), 0);
}
