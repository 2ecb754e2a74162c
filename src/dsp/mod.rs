//! DSP Node Library
//!
//! The building blocks of a soundscape layer: sources, the effect nodes a
//! layer may route through, and the filter and gain stages every layer ends
//! with. Effect nodes implement the `Effect` trait for uniform processing.

mod chain;
mod delay;
mod distortion;
mod effect;
mod filter;
mod gain;
mod reverb;
mod source;

pub use chain::EffectChain;
pub use delay::Delay;
pub use distortion::Distortion;
pub use effect::{Effect, EffectKind};
pub use filter::{LowPassFilter, DEFAULT_CUTOFF_HZ};
pub use gain::GainStage;
pub use reverb::Reverb;
pub use source::{
    Oscillator, PinkNoise, SamplePlayer, SourceKind, SourceNode, DEFAULT_FREQUENCY_HZ,
};

/// Build the default node for an effect category
pub fn create_effect(kind: EffectKind) -> Box<dyn Effect> {
    match kind {
        EffectKind::Distortion => Box::new(Distortion::default()),
        EffectKind::Reverb => Box::new(Reverb::default()),
        EffectKind::Delay => Box::new(Delay::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_effect_matches_kind() {
        for kind in EffectKind::CHAIN_ORDER {
            assert_eq!(create_effect(kind).kind(), kind);
        }
    }
}
