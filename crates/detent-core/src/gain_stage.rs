//! Smoothed gain with an optional dry/wet mix.
//!
//! Per sample, both smoothers advance once and every channel is scaled by
//! `1 + mix * (gain - 1)`, a lerp from unity to the gain. With the mix left
//! at 1.0 this is plain gain.

use crate::buffer::AudioBuffer;
use crate::sample::Sample;
use crate::smoothing::{Smoother, DEFAULT_TIME_CONSTANT_MS};

/// Gain stage state. Lives on the audio thread.
#[derive(Debug, Clone)]
pub struct GainStage {
    gain: Smoother,
    mix: Smoother,
}

impl GainStage {
    /// Create a gain stage with the given smoothing time constant.
    pub fn new(time_constant_ms: f64) -> Self {
        let mut gain = Smoother::new(time_constant_ms);
        let mut mix = Smoother::new(time_constant_ms);
        gain.snap(1.0);
        mix.snap(1.0);
        Self { gain, mix }
    }

    /// Recompute smoothing poles for a sample rate.
    pub fn prepare(&mut self, sample_rate: f64) {
        self.gain.set_sample_rate(sample_rate);
        self.mix.set_sample_rate(sample_rate);
    }

    /// Ramp toward new gain and mix values.
    #[inline]
    pub fn set_targets(&mut self, gain: f64, mix: f64) {
        self.gain.set_target(gain);
        self.mix.set_target(mix);
    }

    /// Jump to gain and mix values without a ramp.
    #[inline]
    pub fn snap(&mut self, gain: f64, mix: f64) {
        self.gain.snap(gain);
        self.mix.snap(mix);
    }

    /// Smoothed gain state.
    pub fn gain(&self) -> &Smoother {
        &self.gain
    }

    /// Smoothed mix state.
    pub fn mix(&self) -> &Smoother {
        &self.mix
    }

    /// Next per-sample factor.
    #[inline]
    fn next_factor(&mut self) -> f64 {
        let gain = self.gain.next();
        let mix = self.mix.next();
        1.0 + mix * (gain - 1.0)
    }

    /// Scale the buffer in place.
    ///
    /// O(samples x channels), allocation-free, and a no-op on an empty block.
    pub fn process<S: Sample>(&mut self, buffer: &mut AudioBuffer<'_, S>) {
        for index in 0..buffer.num_samples() {
            let factor = S::from_f64(self.next_factor());
            for channel in buffer.channels_mut() {
                channel[index] = channel[index] * factor;
            }
        }
    }
}

impl Default for GainStage {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_CONSTANT_MS)
    }
}
