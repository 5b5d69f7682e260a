//! Parameter value formatting and parsing.
//!
//! This module provides the [`Formatter`] enum for converting between
//! plain parameter values and display strings. Each parameter carries one
//! formatter in its descriptor; conversion is a single `match`, so there
//! are no per-parameter closures to build at startup.
//!
//! # Example
//!
//! ```ignore
//! use detent_core::{CustomFormat, Formatter};
//!
//! let mix = Formatter::Suffixed { precision: 2, suffix: "%" };
//! assert_eq!(mix.format(50.0, 0, &[]), "50.00 %");
//! assert_eq!(mix.parse("37.5 %"), 37.5);
//!
//! let gain = Formatter::Custom(CustomFormat::GainDisplay { full_scale: 100.0 });
//! assert_eq!(gain.format(50.0, 0, &[0.0]), "-6.02 dB"); // decibel mode
//! assert_eq!(gain.format(50.0, 0, &[1.0]), "x0.50");    // amplitude mode
//! ```
//!
//! Parsing never fails: anything a variant does not recognise falls back to
//! [`parse_leading_float`], and the store clamps the result afterwards.

/// Decimal places used when a value is shown numerically as a fallback.
pub const FALLBACK_PRECISION: usize = 2;

/// Parameter value formatter.
///
/// Defines how plain parameter values are converted to display strings
/// and parsed back from user input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Formatter {
    /// Plain number with configurable precision (e.g., "1.23").
    Numeric {
        /// Number of decimal places.
        precision: usize,
    },

    /// Number followed by a space and a unit suffix (e.g., "50.00 %").
    Suffixed {
        /// Number of decimal places.
        precision: usize,
        /// Unit label appended after a space.
        suffix: &'static str,
    },

    /// Indexed string table for switches and enumerations.
    ///
    /// The plain value's integer part selects the name. Indices outside
    /// the table are shown numerically.
    Choices {
        /// One display name per step, in index order.
        names: &'static [&'static str],
        /// Unit label appended after a space (usually empty).
        suffix: &'static str,
    },

    /// Bespoke rule; see [`CustomFormat`].
    Custom(CustomFormat),
}

/// Closed set of formatting rules that need more than a suffix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CustomFormat {
    /// Gain shown either in decibels or as an amplitude multiplier.
    ///
    /// The plain value divided by `full_scale` is the linear amplitude.
    /// The first dependency value selects the unit: below 0.5 shows
    /// "-6.02 dB" (or "-inf dB" for silence), otherwise "x0.50".
    GainDisplay {
        /// Plain value that corresponds to unity gain.
        full_scale: f64,
    },
}

impl Formatter {
    /// Format a plain value to a display string.
    ///
    /// `max_len` truncates the result to that many characters when
    /// non-zero. `dependencies` holds the current plain values of the
    /// parameters listed in the descriptor's dependency list, in order.
    pub fn format(&self, value: f64, max_len: usize, dependencies: &[f64]) -> String {
        let text = match self {
            Formatter::Numeric { precision } => format!("{:.prec$}", value, prec = *precision),

            Formatter::Suffixed { precision, suffix } => {
                with_suffix(format!("{:.prec$}", value, prec = *precision), suffix)
            }

            Formatter::Choices { names, suffix } => {
                let label = choice_index(value, names.len())
                    .map(|index| names[index].to_string())
                    .unwrap_or_else(|| format!("{:.prec$}", value, prec = FALLBACK_PRECISION));
                with_suffix(label, suffix)
            }

            Formatter::Custom(custom) => custom.format(value, dependencies),
        };

        truncate(text, max_len)
    }

    /// Parse a display string to a plain value.
    ///
    /// Accepts text with or without the unit suffix. Unrecognised text is
    /// read with [`parse_leading_float`]; the caller clamps the result.
    pub fn parse(&self, text: &str) -> f64 {
        match self {
            Formatter::Numeric { .. } => parse_leading_float(text),

            Formatter::Suffixed { suffix, .. } => parse_leading_float(strip_suffix(text, suffix)),

            Formatter::Choices { names, suffix } => {
                let label = strip_suffix(text, suffix).trim();
                match names.iter().position(|name| name.eq_ignore_ascii_case(label)) {
                    Some(index) => index as f64,
                    None => {
                        log::debug!("No choice named {:?}, parsing as a number", label);
                        parse_leading_float(label)
                    }
                }
            }

            Formatter::Custom(custom) => custom.parse(text),
        }
    }

    /// Unit label for this formatter (for host display).
    pub fn suffix(&self) -> &'static str {
        match self {
            Formatter::Numeric { .. } => "",
            Formatter::Suffixed { suffix, .. } => *suffix,
            Formatter::Choices { suffix, .. } => *suffix,
            Formatter::Custom(CustomFormat::GainDisplay { .. }) => "dB",
        }
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Formatter::Numeric {
            precision: FALLBACK_PRECISION,
        }
    }
}

impl CustomFormat {
    fn format(&self, value: f64, dependencies: &[f64]) -> String {
        match self {
            CustomFormat::GainDisplay { full_scale } => {
                let amplitude = value / full_scale;
                let decibel_mode = dependencies.first().copied().unwrap_or(0.0) < 0.5;
                if decibel_mode {
                    if amplitude <= 0.0 {
                        "-inf dB".to_string()
                    } else {
                        format!("{:.2} dB", gain_to_db(amplitude))
                    }
                } else {
                    format!("x{:.2}", amplitude)
                }
            }
        }
    }

    fn parse(&self, text: &str) -> f64 {
        match self {
            CustomFormat::GainDisplay { full_scale } => {
                let text = text.trim();
                if text.get(..4).is_some_and(|head| head.eq_ignore_ascii_case("-inf")) {
                    return 0.0;
                }
                if let Some(amplitude) = text.strip_prefix(['x', 'X']) {
                    return parse_leading_float(amplitude) * full_scale;
                }
                db_to_gain(parse_leading_float(text)) * full_scale
            }
        }
    }
}

/// Read the longest numeric prefix of `text` (after leading whitespace).
///
/// `"12.5 dB"` gives 12.5, `"-3e2x"` gives -300.0, and text with no numeric
/// prefix gives 0.0.
pub fn parse_leading_float(text: &str) -> f64 {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        end = frac_end;
    }
    if digits == 0 {
        return 0.0;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    text[..end].parse().unwrap_or(0.0)
}

/// Convert linear amplitude to decibels.
#[inline]
pub fn gain_to_db(gain: f64) -> f64 {
    20.0 * gain.log10()
}

/// Convert decibels to linear amplitude.
#[inline]
pub fn db_to_gain(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

fn choice_index(value: f64, count: usize) -> Option<usize> {
    if value.is_finite() && value >= 0.0 && (value as usize) < count {
        Some(value as usize)
    } else {
        None
    }
}

fn with_suffix(text: String, suffix: &str) -> String {
    if suffix.is_empty() {
        text
    } else {
        format!("{} {}", text, suffix)
    }
}

/// Cut everything from the first `" " + suffix` onwards.
fn strip_suffix<'a>(text: &'a str, suffix: &str) -> &'a str {
    if suffix.is_empty() {
        return text;
    }
    let marker = format!(" {}", suffix);
    match text.find(&marker) {
        Some(index) => &text[..index],
        None => text,
    }
}

fn truncate(text: String, max_len: usize) -> String {
    if max_len == 0 || text.chars().count() <= max_len {
        text
    } else {
        text.chars().take(max_len).collect()
    }
}
