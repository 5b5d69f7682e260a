//! One-pole parameter smoothing for avoiding zipper noise.
//!
//! [`Smoother`] turns a target value that jumps once per block into a
//! per-sample exponential ramp. The pole is derived from a fixed time
//! constant and the sample rate, so the audible ramp speed does not depend
//! on block size.
//!
//! ```ignore
//! let mut gain = Smoother::new(DEFAULT_TIME_CONSTANT_MS);
//! gain.set_sample_rate(48000.0);
//! gain.snap(0.5);
//! gain.set_target(1.0);
//! let value = gain.next(); // per sample
//! ```
//!
//! # Thread Safety
//!
//! `Smoother` needs `&mut self` to advance and lives on the audio thread.
//! It reads nothing shared; the processor feeds it targets read from the
//! store.

/// Default smoothing time constant in milliseconds.
pub const DEFAULT_TIME_CONSTANT_MS: f64 = 50.0;

/// Distance below which the smoothed value jumps to the target.
///
/// Stops the tail of the exponential from dragging through denormals.
pub const SNAP_THRESHOLD: f64 = 0.001;

/// One-pole coefficient for a time constant (seconds) at a sample rate.
///
/// Returns 0.0 (no smoothing) when either argument is not positive.
#[inline]
pub fn tau_to_pole(tau_seconds: f64, sample_rate: f64) -> f64 {
    let samples_per_tau = tau_seconds * sample_rate;
    if samples_per_tau > 0.0 {
        (-1.0 / samples_per_tau).exp()
    } else {
        0.0
    }
}

/// A one-pole exponential smoother.
///
/// Per sample: `current = target + pole * (current - target)`.
#[derive(Debug, Clone)]
pub struct Smoother {
    time_constant_ms: f64,
    sample_rate: f64,
    pole: f64,
    current: f64,
    target: f64,
}

impl Smoother {
    /// Create a smoother with the given time constant.
    ///
    /// Until [`set_sample_rate()`](Self::set_sample_rate) is called the
    /// pole is 0.0 and every step lands on the target.
    pub fn new(time_constant_ms: f64) -> Self {
        Self {
            time_constant_ms,
            sample_rate: 0.0,
            pole: 0.0,
            current: 0.0,
            target: 0.0,
        }
    }

    /// Set the sample rate and recompute the pole.
    ///
    /// Also snaps to the current target: a trajectory computed at the old
    /// rate has no meaning at the new one.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.pole = tau_to_pole(self.time_constant_ms / 1000.0, sample_rate);
        self.current = self.target;
    }

    /// Set a new target. The ramp starts on the next [`next()`](Self::next).
    #[inline]
    pub fn set_target(&mut self, target: f64) {
        self.target = target;
    }

    /// Jump straight to `value`, bypassing the ramp.
    ///
    /// Use after a state reload or reset.
    #[inline]
    pub fn snap(&mut self, value: f64) {
        self.target = value;
        self.current = value;
    }

    /// Advance one sample and return the smoothed value.
    #[inline]
    pub fn next(&mut self) -> f64 {
        self.current = self.target + self.pole * (self.current - self.target);
        if (self.current - self.target).abs() < SNAP_THRESHOLD {
            self.current = self.target;
        }
        self.current
    }

    /// Advance `samples` samples in closed form.
    pub fn skip(&mut self, samples: usize) {
        if samples == 0 {
            return;
        }
        let decay = self.pole.powi(samples.min(i32::MAX as usize) as i32);
        self.current = self.target + (self.current - self.target) * decay;
        if (self.current - self.target).abs() < SNAP_THRESHOLD {
            self.current = self.target;
        }
    }

    /// Fill a slice with successive smoothed values.
    pub fn fill(&mut self, out: &mut [f64]) {
        for value in out.iter_mut() {
            *value = self.next();
        }
    }

    /// Current smoothed value without advancing.
    #[inline]
    pub fn current(&self) -> f64 {
        self.current
    }

    /// Current target.
    #[inline]
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Pole coefficient in use.
    #[inline]
    pub fn pole(&self) -> f64 {
        self.pole
    }

    /// Sample rate the pole was computed for (0.0 before prepare).
    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Returns true if still moving toward the target.
    #[inline]
    pub fn is_smoothing(&self) -> bool {
        self.current != self.target
    }
}

impl Default for Smoother {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_CONSTANT_MS)
    }
}
