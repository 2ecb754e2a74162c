//! Soundscape configuration
//!
//! Serde data model for a soundscape: named layers, each a source type, an
//! optional frequency or sample reference, a volume and a set of effects.
//! Field names follow the camelCase JSON the configs are authored in.

use crate::dsp::EffectKind;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

// ============================================================================
// Source Type
// ============================================================================

/// Generator a layer is built on.
///
/// Unrecognized names parse into `Other` so the engine, not the parser,
/// decides what to do with them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SourceType {
    Oscillator,
    Noise,
    Sample,
    Other(String),
}

impl SourceType {
    pub fn as_str(&self) -> &str {
        match self {
            SourceType::Oscillator => "oscillator",
            SourceType::Noise => "noise",
            SourceType::Sample => "sample",
            SourceType::Other(name) => name,
        }
    }
}

impl From<String> for SourceType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "oscillator" => SourceType::Oscillator,
            "noise" => SourceType::Noise,
            "sample" => SourceType::Sample,
            _ => SourceType::Other(name),
        }
    }
}

impl From<&str> for SourceType {
    fn from(name: &str) -> Self {
        SourceType::from(name.to_string())
    }
}

impl From<SourceType> for String {
    fn from(source_type: SourceType) -> Self {
        source_type.as_str().to_string()
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Layer Spec
// ============================================================================

/// One layer of a soundscape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerSpec {
    #[serde(alias = "type")]
    pub source_type: SourceType,
    /// Oscillator frequency in Hz (440 when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<f32>,
    /// Registered sample name or WAV path, for sample layers
    #[serde(default, alias = "url", skip_serializing_if = "Option::is_none")]
    pub sample_ref: Option<String>,
    /// Linear layer gain, 0 to 1
    pub volume: f32,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub effects: BTreeSet<EffectKind>,
}

impl LayerSpec {
    pub fn oscillator(frequency: f32, volume: f32) -> Self {
        Self {
            source_type: SourceType::Oscillator,
            frequency: Some(frequency),
            sample_ref: None,
            volume,
            effects: BTreeSet::new(),
        }
    }

    pub fn noise(volume: f32) -> Self {
        Self {
            source_type: SourceType::Noise,
            frequency: None,
            sample_ref: None,
            volume,
            effects: BTreeSet::new(),
        }
    }

    pub fn sample(sample_ref: impl Into<String>, volume: f32) -> Self {
        Self {
            source_type: SourceType::Sample,
            frequency: None,
            sample_ref: Some(sample_ref.into()),
            volume,
            effects: BTreeSet::new(),
        }
    }

    /// Add effects to the layer (builder style)
    pub fn with_effects(mut self, effects: impl IntoIterator<Item = EffectKind>) -> Self {
        self.effects.extend(effects);
        self
    }
}

// ============================================================================
// Soundscape Config
// ============================================================================

/// A complete soundscape: layers keyed by id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundscapeConfig {
    /// Carried for hosts; the engine does not read it
    pub base_volume: f32,
    /// Carried for hosts; the engine does not read it
    pub stress_multiplier: f32,
    pub layers: BTreeMap<String, LayerSpec>,
}

impl SoundscapeConfig {
    pub fn new(base_volume: f32, stress_multiplier: f32) -> Self {
        Self {
            base_volume,
            stress_multiplier,
            layers: BTreeMap::new(),
        }
    }

    /// Add a layer (builder style); a repeated id replaces the earlier spec
    pub fn with_layer(mut self, id: impl Into<String>, spec: LayerSpec) -> Self {
        self.layers.insert(id.into(), spec);
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    // ------------------------------------------------------------------------
    // Presets
    // ------------------------------------------------------------------------

    /// Crowded, fluorescent-lit public space
    pub fn sensory_overload() -> Self {
        Self::new(0.6, 1.5)
            .with_layer(
                "crowd",
                LayerSpec::noise(0.4).with_effects([EffectKind::Distortion]),
            )
            .with_layer(
                "fluorescent",
                LayerSpec::oscillator(120.0, 0.2).with_effects([EffectKind::Distortion]),
            )
            .with_layer("air_conditioner", LayerSpec::oscillator(60.0, 0.3))
            .with_layer(
                "traffic",
                LayerSpec::noise(0.5).with_effects([EffectKind::Delay]),
            )
    }

    /// Low, foggy drone
    pub fn cognitive_load() -> Self {
        Self::new(0.4, 1.2)
            .with_layer(
                "mental_fog",
                LayerSpec::noise(0.3).with_effects([EffectKind::Reverb]),
            )
            .with_layer("pressure", LayerSpec::oscillator(40.0, 0.2))
    }

    /// Everything at once
    pub fn meltdown() -> Self {
        Self::new(0.8, 2.0)
            .with_layer(
                "overwhelming",
                LayerSpec::noise(0.7).with_effects([EffectKind::Distortion, EffectKind::Delay]),
            )
            .with_layer("heartbeat", LayerSpec::oscillator(80.0, 0.5))
            .with_layer(
                "chaos",
                LayerSpec::noise(0.6).with_effects([EffectKind::Distortion, EffectKind::Reverb]),
            )
    }

    /// Look up a preset by name
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "sensory_overload" => Some(Self::sensory_overload()),
            "cognitive_load" => Some(Self::cognitive_load()),
            "meltdown" => Some(Self::meltdown()),
            _ => None,
        }
    }
}

/// Names accepted by the preset constructors
pub const PRESET_NAMES: [&str; 3] = ["sensory_overload", "cognitive_load", "meltdown"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_camel_case() {
        let json = r#"{
            "baseVolume": 0.6,
            "stressMultiplier": 1.5,
            "layers": {
                "crowd": { "sourceType": "noise", "volume": 0.4, "effects": ["distortion"] },
                "hum": { "sourceType": "oscillator", "frequency": 120, "volume": 0.2 }
            }
        }"#;
        let config = SoundscapeConfig::from_json_str(json).unwrap();

        assert_eq!(config.layers.len(), 2);
        let crowd = &config.layers["crowd"];
        assert_eq!(crowd.source_type, SourceType::Noise);
        assert!(crowd.effects.contains(&EffectKind::Distortion));
        assert_eq!(config.layers["hum"].frequency, Some(120.0));
    }

    #[test]
    fn test_legacy_type_field() {
        let spec: LayerSpec =
            serde_json::from_str(r#"{ "type": "sample", "url": "rain.wav", "volume": 0.5 }"#)
                .unwrap();
        assert_eq!(spec.source_type, SourceType::Sample);
        assert_eq!(spec.sample_ref.as_deref(), Some("rain.wav"));
    }

    #[test]
    fn test_unknown_source_type_parses_as_other() {
        let spec: LayerSpec =
            serde_json::from_str(r#"{ "sourceType": "bogus", "volume": 0.5 }"#).unwrap();
        assert_eq!(spec.source_type, SourceType::Other("bogus".into()));
    }

    #[test]
    fn test_unknown_effect_is_parse_error() {
        let result: std::result::Result<LayerSpec, _> = serde_json::from_str(
            r#"{ "sourceType": "noise", "volume": 0.5, "effects": ["chorus"] }"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_presets() {
        let overload = SoundscapeConfig::sensory_overload();
        assert_eq!(overload.layers.len(), 4);
        assert_eq!(overload.layers["fluorescent"].frequency, Some(120.0));

        for name in PRESET_NAMES {
            assert!(SoundscapeConfig::preset(name).is_some(), "{name}");
        }
        assert!(SoundscapeConfig::preset("calm").is_none());
    }

    #[test]
    fn test_json_round_trip_keeps_names() {
        let json = SoundscapeConfig::meltdown().to_json_pretty().unwrap();
        assert!(json.contains("\"sourceType\": \"noise\""));
        assert!(json.contains("\"stressMultiplier\""));
        assert_eq!(SoundscapeConfig::from_json_str(&json).unwrap(), SoundscapeConfig::meltdown());
    }
}
