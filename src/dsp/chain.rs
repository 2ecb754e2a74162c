//! Effect Chain management
//!
//! Effects are processed in chain order (index 0 first). Inserting an effect
//! places it at its category's position:
//! 1. Distortion
//! 2. Reverb
//! 3. Delay

use super::{Effect, EffectKind};
use crate::engine::AudioBuffer;

/// Ordered chain of effect nodes for one layer
pub struct EffectChain {
    effects: Vec<Box<dyn Effect>>,
    sample_rate: u32,
}

impl EffectChain {
    /// Create a new empty effect chain
    pub fn new(sample_rate: u32) -> Self {
        Self {
            effects: Vec::new(),
            sample_rate,
        }
    }

    /// Prepare all effects for a new sample rate
    pub fn prepare(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
        for effect in &mut self.effects {
            effect.prepare(sample_rate);
        }
    }

    /// Add an effect at its category's position
    pub fn add(&mut self, mut effect: Box<dyn Effect>) {
        effect.prepare(self.sample_rate);
        let position = self.recommended_position(effect.kind());
        self.effects.insert(position, effect);
    }

    /// Process the entire chain
    pub fn process(&mut self, buffer: &mut AudioBuffer) {
        for effect in &mut self.effects {
            effect.process(buffer);
        }
    }

    /// Drop every node, returning how many were released
    pub fn dispose(&mut self) -> usize {
        let count = self.effects.len();
        self.effects.clear();
        count
    }

    /// Get the number of effects in the chain
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Check if the chain is empty
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Effect kinds in processing order
    pub fn kinds(&self) -> Vec<EffectKind> {
        self.effects.iter().map(|e| e.kind()).collect()
    }

    fn recommended_position(&self, kind: EffectKind) -> usize {
        self.effects
            .iter()
            .position(|existing| existing.kind().chain_position() > kind.chain_position())
            .unwrap_or(self.effects.len())
    }
}

impl std::fmt::Debug for EffectChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectChain")
            .field("kinds", &self.kinds())
            .field("sample_rate", &self.sample_rate)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::{Delay, Distortion, Reverb};

    #[test]
    fn test_chain_new() {
        let chain = EffectChain::new(48000);
        assert!(chain.is_empty());
        assert_eq!(chain.len(), 0);
    }

    #[test]
    fn test_chain_orders_by_kind() {
        let mut chain = EffectChain::new(48000);
        chain.add(Box::new(Delay::new(0.2)));
        chain.add(Box::new(Distortion::new(0.4)));
        chain.add(Box::new(Reverb::with_decay(2.0)));

        assert_eq!(
            chain.kinds(),
            vec![EffectKind::Distortion, EffectKind::Reverb, EffectKind::Delay]
        );
    }

    #[test]
    fn test_dispose_counts_nodes() {
        let mut chain = EffectChain::new(48000);
        chain.add(Box::new(Distortion::new(0.4)));
        chain.add(Box::new(Delay::new(0.2)));

        assert_eq!(chain.dispose(), 2);
        assert!(chain.is_empty());
        assert_eq!(chain.dispose(), 0);
    }
}
