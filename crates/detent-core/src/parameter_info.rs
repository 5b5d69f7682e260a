//! Parameter descriptors.
//!
//! A plugin describes its controls with a `&'static [ParameterInfo]` table.
//! Descriptors are pure data: the store reads them for ranges, defaults and
//! formatting but never mutates them.
//!
//! # Example
//!
//! ```ignore
//! use detent_core::{Formatter, ParameterInfo, ParameterRange};
//!
//! pub static PARAMETERS: &[ParameterInfo] = &[
//!     ParameterInfo::new("MIX", ParameterRange::new(0.0, 100.0))
//!         .with_nickname("Mix")
//!         .with_default(50.0)
//!         .with_formatter(Formatter::Suffixed { precision: 2, suffix: "%" }),
//! ];
//! ```

use detent_utils::fnv1a_32;

use crate::parameter_format::Formatter;
use crate::parameter_range::ParameterRange;
use crate::types::{ParameterId, ParameterValue};

/// Metadata describing a single parameter or property.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterInfo {
    /// Stable identifier, the FNV-1a hash of `name`.
    pub id: ParameterId,
    /// Stable name used as the snapshot key (e.g., "GAIN").
    pub name: &'static str,
    /// Display name for constrained UIs (e.g., "Gain").
    pub nickname: &'static str,
    /// Longer help text.
    pub tooltip: &'static str,
    /// Legal values and their normalized mapping.
    pub range: ParameterRange,
    /// Default value in plain units.
    pub default: ParameterValue,
    /// Host-visible and undoable when true; a plugin-only property otherwise.
    pub automatable: bool,
    /// Value/text conversion rule.
    pub formatter: Formatter,
    /// Names of parameters whose current values the formatter reads.
    pub dependencies: &'static [&'static str],
}

impl ParameterInfo {
    /// Create an automatable parameter defaulting to its range minimum.
    pub const fn new(name: &'static str, range: ParameterRange) -> Self {
        Self {
            id: fnv1a_32(name),
            name,
            nickname: name,
            tooltip: "",
            range,
            default: range.min,
            automatable: true,
            formatter: Formatter::Numeric { precision: 2 },
            dependencies: &[],
        }
    }

    /// Create a non-automatable property.
    pub const fn property(name: &'static str, range: ParameterRange) -> Self {
        Self::new(name, range).with_automatable(false)
    }

    /// Set the display nickname.
    pub const fn with_nickname(mut self, nickname: &'static str) -> Self {
        self.nickname = nickname;
        self
    }

    /// Set the tooltip text.
    pub const fn with_tooltip(mut self, tooltip: &'static str) -> Self {
        self.tooltip = tooltip;
        self
    }

    /// Set the default value (plain units).
    pub const fn with_default(mut self, default: ParameterValue) -> Self {
        self.default = default;
        self
    }

    /// Set whether the host may automate this parameter.
    pub const fn with_automatable(mut self, automatable: bool) -> Self {
        self.automatable = automatable;
        self
    }

    /// Set the formatting rule.
    pub const fn with_formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = formatter;
        self
    }

    /// Set the names of parameters the formatter depends on.
    pub const fn with_dependencies(mut self, dependencies: &'static [&'static str]) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Default value snapped into the range.
    pub fn snapped_default(&self) -> ParameterValue {
        self.range.snap(self.default)
    }

    /// Default value in normalized form (0.0 to 1.0).
    pub fn default_normalized(&self) -> ParameterValue {
        self.range.normalize(self.snapped_default())
    }
}
