//! # detent-core
//!
//! Parameter state for audio plugins, shared safely between a non-real-time
//! control surface (UI, host automation, preset files) and the real-time
//! render callback.
//!
//! ## Main Types
//!
//! - [`ParameterStore`] - Authoritative values, change flags, undo, presets
//! - [`ParameterInfo`] - Static descriptor for one parameter or property
//! - [`Formatter`] - Value/text conversion rule
//! - [`Smoother`] - One-pole per-sample smoothing
//! - [`GainStage`] - Smoothed gain with dry/wet mix
//! - [`ComponentHandle`] - UI component identity and repaint flag
//! - [`StateSnapshot`] - Serializable copy of the whole state
//! - [`StateError`] - Error type for non-real-time operations
//!
//! ## Threads
//!
//! The audio thread reads with [`ParameterStore::get`] and consumes
//! [`ParameterStore::take_snap_request`]; both are lock-free. Writers and
//! the UI never call into the audio thread, and the UI learns about changes
//! by polling [`ParameterStore::poll_changes`] once per refresh tick.

pub mod automation;
pub mod buffer;
pub mod config;
pub mod error;
pub mod gain_stage;
pub mod notification;
pub mod parameter_format;
pub mod parameter_info;
pub mod parameter_range;
pub mod parameter_store;
pub mod presets;
pub mod sample;
pub mod smoothing;
pub mod snapshot;
pub mod types;
pub mod undo;

// Re-exports for convenience
pub use automation::{AutomationSink, NoAutomation};
pub use buffer::AudioBuffer;
pub use config::{PluginConfig, StoreConfig, DEFAULT_PRESET_NAME, DEFAULT_UNDO_LIMIT};
pub use error::{StateError, StateResult};
pub use gain_stage::GainStage;
pub use notification::{ComponentHandle, ComponentId, ObserverCallback};
pub use parameter_format::{db_to_gain, gain_to_db, parse_leading_float, CustomFormat, Formatter};
pub use parameter_info::ParameterInfo;
pub use parameter_range::ParameterRange;
pub use parameter_store::{ParameterStore, MODIFIED_MARKER, PARAMETER_TEXT_MAX_LEN};
pub use presets::PresetDirectory;
pub use sample::Sample;
pub use smoothing::{tau_to_pole, Smoother, DEFAULT_TIME_CONSTANT_MS, SNAP_THRESHOLD};
pub use snapshot::{PresetMetadata, StateSnapshot};
pub use types::{ParameterId, ParameterValue, MAX_CHANNELS};
pub use undo::{Edit, Transaction, UndoLog};

// Hashing helper for building ids in `const` items
pub use detent_utils::fnv1a_32;
