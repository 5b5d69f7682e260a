//! Common types used throughout the Detent framework.

/// Maximum number of audio channels an [`AudioBuffer`](crate::AudioBuffer) can hold.
///
/// Set to 32 to cover 22.2 surround with headroom. Channels beyond this
/// are ignored when a buffer is constructed.
pub const MAX_CHANNELS: usize = 32;

/// Parameter identifier.
///
/// Derived from the parameter's stable name with
/// [`fnv1a_32`](detent_utils::fnv1a_32).
pub type ParameterId = u32;

/// Parameter value in natural (plain) units, or normalized 0.0 to 1.0
/// where a function says so.
pub type ParameterValue = f64;
