//! Range mapping for parameter normalization.
//!
//! [`ParameterRange`] maps between plain values (natural units like %, dB)
//! and normalized values (0.0 to 1.0) used by hosts and slider widgets.
//! It also snaps plain values onto the legal grid before they are stored.
//!
//! # Example
//!
//! ```ignore
//! use detent_core::ParameterRange;
//!
//! let mix = ParameterRange::new(0.0, 100.0);
//! assert_eq!(mix.normalize(50.0), 0.5);
//! assert_eq!(mix.denormalize(0.25), 25.0);
//!
//! // Discrete switch with two positions
//! let mode = ParameterRange::new(0.0, 1.0).with_step(1.0);
//! assert_eq!(mode.snap(0.7), 1.0);
//!
//! // Skew < 1.0 gives more slider travel to the low end
//! let time = ParameterRange::new(1.0, 1000.0).with_skew(0.3);
//! ```

/// Numeric range of a parameter: bounds, step granularity, skew.
///
/// `Copy` and buildable in `const` context so descriptor tables can be
/// `static`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterRange {
    /// Minimum plain value.
    pub min: f64,
    /// Maximum plain value.
    pub max: f64,
    /// Step granularity in plain units. 0.0 = continuous.
    pub step: f64,
    /// Skew exponent applied to the normalized proportion. 1.0 = linear.
    pub skew: f64,
}

impl ParameterRange {
    /// Continuous linear range.
    pub const fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            step: 0.0,
            skew: 1.0,
        }
    }

    /// Set the step granularity (0.0 = continuous).
    pub const fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    /// Set the skew exponent (must be positive).
    pub const fn with_skew(mut self, skew: f64) -> Self {
        self.skew = skew;
        self
    }

    /// Width of the range in plain units.
    #[inline]
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Number of discrete steps, or 0 for a continuous range.
    pub fn step_count(&self) -> usize {
        if self.step > 0.0 && self.span() > 0.0 {
            (self.span() / self.step).round() as usize
        } else {
            0
        }
    }

    /// Clamp into bounds and round onto the step grid.
    ///
    /// Non-finite input collapses to the minimum so a malformed host value
    /// can never reach storage.
    pub fn snap(&self, plain: f64) -> f64 {
        if !plain.is_finite() {
            return self.min;
        }
        let clamped = plain.clamp(self.min, self.max);
        if self.step > 0.0 {
            let stepped = self.min + self.step * ((clamped - self.min) / self.step).round();
            stepped.clamp(self.min, self.max)
        } else {
            clamped
        }
    }

    /// Convert a plain value to normalized (0.0-1.0).
    ///
    /// Values outside the range are clamped.
    pub fn normalize(&self, plain: f64) -> f64 {
        let span = self.span();
        if span <= 0.0 || !plain.is_finite() {
            return 0.0;
        }
        let proportion = ((plain - self.min) / span).clamp(0.0, 1.0);
        if self.is_skewed() {
            proportion.powf(self.skew)
        } else {
            proportion
        }
    }

    /// Convert a normalized value (0.0-1.0) to plain.
    ///
    /// Values outside 0.0-1.0 are clamped. The result is not snapped.
    pub fn denormalize(&self, normalized: f64) -> f64 {
        let mut proportion = if normalized.is_finite() {
            normalized.clamp(0.0, 1.0)
        } else {
            0.0
        };
        if self.is_skewed() && proportion > 0.0 {
            proportion = (proportion.ln() / self.skew).exp();
        }
        self.min + self.span() * proportion
    }

    /// Check the bounds, step and skew. Returns the first problem found.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.min.is_finite() || !self.max.is_finite() {
            Err("bounds must be finite")
        } else if self.min > self.max {
            Err("min is greater than max")
        } else if !(self.step >= 0.0 && self.step.is_finite()) {
            Err("step must be finite and not negative")
        } else if !(self.skew > 0.0 && self.skew.is_finite()) {
            Err("skew must be positive")
        } else {
            Ok(())
        }
    }

    #[inline]
    fn is_skewed(&self) -> bool {
        self.skew > 0.0 && (self.skew - 1.0).abs() > f64::EPSILON
    }
}
