//! Visual configuration
//!
//! Serde data model for stimuli and the preset stacks. A stimulus keeps
//! its optional fields optional; renderers fill in defaults at draw time.

use super::color::Color;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Flicker cycles when a stimulus gives no frequency
pub const DEFAULT_FLICKER_FREQUENCY: f32 = 10.0;
/// Flicker fill opacity when none is given
pub const DEFAULT_FLICKER_OPACITY: f32 = 0.3;
/// Overlay wash opacity when none is given
pub const DEFAULT_OVERLAY_OPACITY: f32 = 0.1;
/// Particle radius in logical units when none is given
pub const DEFAULT_PARTICLE_SIZE: f32 = 2.0;
/// Particle speed when none is given
pub const DEFAULT_PARTICLE_SPEED: f32 = 1.0;

pub const DEFAULT_FLICKER_COLOR: Color = Color::WHITE;
pub const DEFAULT_OVERLAY_COLOR: Color = Color::RED;
pub const DEFAULT_PARTICLE_COLOR: Color = Color::rgb(0x33, 0x33, 0x33);

// ============================================================================
// Stimulus Kind
// ============================================================================

/// Algorithm a stimulus is rendered with.
///
/// Unknown names parse into `Other`; the engine skips them at render time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StimulusKind {
    Flicker,
    Particle,
    Distortion,
    Overlay,
    Shake,
    Other(String),
}

impl StimulusKind {
    pub fn as_str(&self) -> &str {
        match self {
            StimulusKind::Flicker => "flicker",
            StimulusKind::Particle => "particle",
            StimulusKind::Distortion => "distortion",
            StimulusKind::Overlay => "overlay",
            StimulusKind::Shake => "shake",
            StimulusKind::Other(name) => name,
        }
    }
}

impl From<String> for StimulusKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "flicker" => StimulusKind::Flicker,
            "particle" => StimulusKind::Particle,
            "distortion" => StimulusKind::Distortion,
            "overlay" => StimulusKind::Overlay,
            "shake" => StimulusKind::Shake,
            _ => StimulusKind::Other(name),
        }
    }
}

impl From<&str> for StimulusKind {
    fn from(name: &str) -> Self {
        StimulusKind::from(name.to_string())
    }
}

impl From<StimulusKind> for String {
    fn from(kind: StimulusKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for StimulusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Visual Stimulus
// ============================================================================

/// One named visual effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualStimulus {
    pub id: String,
    #[serde(rename = "type", alias = "kind")]
    pub kind: StimulusKind,
    /// Strength in [0, 1]
    pub intensity: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
}

impl VisualStimulus {
    /// A stimulus with every optional field left to its default
    pub fn new(id: impl Into<String>, kind: impl Into<StimulusKind>, intensity: f32) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            intensity,
            color: None,
            frequency: None,
            size: None,
            opacity: None,
            speed: None,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_frequency(mut self, frequency: f32) -> Self {
        self.frequency = Some(frequency);
        self
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = Some(speed);
        self
    }
}

// ============================================================================
// Visual Config
// ============================================================================

/// A stack of stimuli drawn in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualConfig {
    pub stimuli: Vec<VisualStimulus>,
    /// Carried for hosts; the engine does not read it
    pub stress_multiplier: f32,
    /// Carried for hosts; the engine clears to transparent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<Color>,
}

impl VisualConfig {
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

    pub fn sensory_overload() -> Self {
        Self {
            stress_multiplier: 1.5,
            background_color: Some(Color::rgb(0xf0, 0xf0, 0xf0)),
            stimuli: vec![
                VisualStimulus::new("fluorescent_flicker", StimulusKind::Flicker, 0.6)
                    .with_frequency(15.0)
                    .with_color(Color::WHITE)
                    .with_opacity(0.4),
                VisualStimulus::new("visual_noise", StimulusKind::Particle, 0.8)
                    .with_color(Color::rgb(0x33, 0x33, 0x33))
                    .with_size(2.0)
                    .with_speed(3.0),
                VisualStimulus::new("red_overlay", StimulusKind::Overlay, 0.3)
                    .with_color(Color::rgb(0xff, 0x44, 0x44))
                    .with_opacity(0.1),
            ],
        }
    }

    pub fn cognitive_load() -> Self {
        Self {
            stress_multiplier: 1.2,
            background_color: Some(Color::rgb(0xe8, 0xe8, 0xe8)),
            stimuli: vec![
                VisualStimulus::new("mental_fog", StimulusKind::Overlay, 0.4)
                    .with_color(Color::rgb(0x88, 0x88, 0x88))
                    .with_opacity(0.2),
                VisualStimulus::new("distraction_particles", StimulusKind::Particle, 0.3)
                    .with_color(Color::rgb(0x66, 0x66, 0x66))
                    .with_size(1.0)
                    .with_speed(1.0),
            ],
        }
    }

    pub fn meltdown() -> Self {
        Self {
            stress_multiplier: 2.0,
            background_color: Some(Color::rgb(0x40, 0, 0)),
            stimuli: vec![
                VisualStimulus::new("overwhelming_flicker", StimulusKind::Flicker, 0.9)
                    .with_frequency(25.0)
                    .with_color(Color::RED)
                    .with_opacity(0.6),
                VisualStimulus::new("chaos_particles", StimulusKind::Particle, 1.0)
                    .with_color(Color::rgb(0xff, 0x66, 0x66))
                    .with_size(4.0)
                    .with_speed(8.0),
                VisualStimulus::new("screen_shake", StimulusKind::Shake, 0.8),
                VisualStimulus::new("distortion", StimulusKind::Distortion, 0.5),
            ],
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stimulus() {
        let json = r##"{
            "id": "strobe",
            "type": "flicker",
            "intensity": 0.6,
            "frequency": 15,
            "color": "#ffffff",
            "opacity": 0.4
        }"##;
        let stimulus: VisualStimulus = serde_json::from_str(json).unwrap();
        assert_eq!(stimulus.kind, StimulusKind::Flicker);
        assert_eq!(stimulus.color, Some(Color::WHITE));
        assert_eq!(stimulus.size, None);
    }

    #[test]
    fn test_unknown_kind_parses_as_other() {
        let stimulus: VisualStimulus =
            serde_json::from_str(r#"{ "id": "x", "type": "vortex", "intensity": 1 }"#).unwrap();
        assert_eq!(stimulus.kind, StimulusKind::Other("vortex".into()));
    }

    #[test]
    fn test_bad_colour_is_parse_error() {
        let result = serde_json::from_str::<VisualStimulus>(
            r#"{ "id": "x", "type": "overlay", "intensity": 1, "color": "crimson" }"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_config_round_trip() {
        let json = VisualConfig::meltdown().to_json_pretty().unwrap();
        assert!(json.contains("\"type\": \"shake\""));
        assert!(json.contains("\"backgroundColor\": \"#400000\""));
        assert_eq!(VisualConfig::from_json_str(&json).unwrap(), VisualConfig::meltdown());
    }

    #[test]
    fn test_presets() {
        assert_eq!(VisualConfig::sensory_overload().stimuli.len(), 3);
        assert_eq!(VisualConfig::cognitive_load().stimuli.len(), 2);
        assert_eq!(VisualConfig::meltdown().stimuli.len(), 4);
        assert!(VisualConfig::preset("nope").is_none());
    }
}
