//! Effect trait definition
//!
//! Base trait for the effect nodes a layer can route through.

use crate::engine::AudioBuffer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Effect categories a layer spec may request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    Distortion,
    Reverb,
    Delay,
}

impl EffectKind {
    /// All kinds in signal-chain order
    pub const CHAIN_ORDER: [EffectKind; 3] =
        [EffectKind::Distortion, EffectKind::Reverb, EffectKind::Delay];

    /// Position in the chain (lower = earlier)
    pub fn chain_position(self) -> usize {
        match self {
            EffectKind::Distortion => 0,
            EffectKind::Reverb => 1,
            EffectKind::Delay => 2,
        }
    }

    /// String identifier
    pub fn as_str(self) -> &'static str {
        match self {
            EffectKind::Distortion => "distortion",
            EffectKind::Reverb => "reverb",
            EffectKind::Delay => "delay",
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base trait for all effect nodes
///
/// Effects process stereo buffers in-place, block by block.
pub trait Effect: Send {
    /// Process audio buffer in-place
    fn process(&mut self, buffer: &mut AudioBuffer);

    /// Prepare the effect for processing at `sample_rate`
    fn prepare(&mut self, sample_rate: u32);

    /// Effect category
    fn kind(&self) -> EffectKind;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_order_is_sorted() {
        let positions: Vec<usize> = EffectKind::CHAIN_ORDER
            .iter()
            .map(|k| k.chain_position())
            .collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn test_kind_serde_names() {
        let kind: EffectKind = serde_json::from_str("\"reverb\"").unwrap();
        assert_eq!(kind, EffectKind::Reverb);
        assert_eq!(serde_json::to_string(&EffectKind::Delay).unwrap(), "\"delay\"");
    }
}
