//! Audio layer
//!
//! One source routed through its effect chain, a low-pass filter and a gain
//! stage. The engine owns every layer exclusively.

use crate::dsp::{EffectChain, GainStage, LowPassFilter, SourceNode};
use crate::engine::{AudioBuffer, ChannelLayout};

/// Runtime node graph for one soundscape layer
#[derive(Debug)]
pub struct AudioLayer {
    id: String,
    source: SourceNode,
    effects: EffectChain,
    filter: LowPassFilter,
    gain: GainStage,
    scratch: AudioBuffer,
}

impl AudioLayer {
    pub fn new(
        id: impl Into<String>,
        source: SourceNode,
        effects: EffectChain,
        filter: LowPassFilter,
        gain: GainStage,
        sample_rate: u32,
    ) -> Self {
        Self {
            id: id.into(),
            source,
            effects,
            filter,
            gain,
            scratch: AudioBuffer::new(0, ChannelLayout::Stereo, sample_rate),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn start(&mut self) {
        self.source.start();
    }

    pub fn stop(&mut self) {
        self.source.stop();
    }

    pub fn is_playing(&self) -> bool {
        self.source.is_playing()
    }

    pub fn source(&self) -> &SourceNode {
        &self.source
    }

    pub fn effects(&self) -> &EffectChain {
        &self.effects
    }

    pub fn gain(&self) -> &GainStage {
        &self.gain
    }

    pub fn gain_mut(&mut self) -> &mut GainStage {
        &mut self.gain
    }

    pub fn filter(&self) -> &LowPassFilter {
        &self.filter
    }

    pub fn filter_mut(&mut self) -> &mut LowPassFilter {
        &mut self.filter
    }

    /// Render `num_samples` of this layer and add them into `mix`.
    ///
    /// Effects, filter and gain run even while the source is stopped so
    /// tails decay and ramps keep time.
    pub fn render_into(&mut self, mix: &mut AudioBuffer, num_samples: usize) {
        if self.scratch.num_samples() != num_samples {
            self.scratch.resize(num_samples);
        }
        if self.scratch.sample_rate != mix.sample_rate {
            self.scratch.sample_rate = mix.sample_rate;
            self.effects.prepare(mix.sample_rate);
        }

        self.source.render(&mut self.scratch);
        self.effects.process(&mut self.scratch);
        self.filter.process(&mut self.scratch);
        self.gain.process(&mut self.scratch);
        mix.mix_from(&self.scratch);
    }

    /// Release every node; returns the number of nodes released
    pub fn dispose(&mut self) -> usize {
        self.source.stop();
        // source + filter + gain, plus whatever effects were wired
        3 + self.effects.dispose()
    }
}
