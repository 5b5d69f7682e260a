//! # Detent
//!
//! Parameter-state core for audio plugins.
//!
//! Detent holds every control value of a plugin instance and shares it
//! between a non-real-time control surface and the real-time render
//! callback without locks on the audio path.
//!
//! ## Architecture
//!
//! ```text
//! UI / host automation / preset files
//!        ↓ set, gestures, undo, load/save
//! ParameterStore (atomic values + change flags)
//!        ↓ get, take_snap_request          ↑ poll_changes (UI tick)
//! Audio thread: Smoother → GainStage       observers → repaint
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use detent::prelude::*;
//!
//! static CONFIG: PluginConfig = PluginConfig::new("MyGain").with_vendor("Me");
//! static PARAMETERS: &[ParameterInfo] = &[
//!     ParameterInfo::new("GAIN", ParameterRange::new(0.0, 1.0)).with_default(0.5),
//! ];
//!
//! let store = Arc::new(ParameterStore::new(PARAMETERS, &StoreConfig::new(&CONFIG)));
//! store.set(fnv1a_32("GAIN"), 0.7)?;
//! ```

// Re-export sub-crates
pub use detent_core as core;
pub use detent_utils as utils;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use detent::prelude::*;
/// ```
pub mod prelude {
    pub use detent_core::{
        // Store and descriptors
        ParameterInfo, ParameterRange, ParameterStore, Formatter, CustomFormat,
        // Configuration
        PluginConfig, StoreConfig,
        // Audio path
        AudioBuffer, GainStage, Sample, Smoother,
        // Notification
        ComponentHandle, ComponentId, ObserverCallback,
        // Persistence
        StateSnapshot, PresetMetadata,
        // Host automation
        AutomationSink, NoAutomation,
        // Errors
        StateError, StateResult,
        // Types
        ParameterId, ParameterValue, MAX_CHANNELS,
    };

    pub use detent_utils::fnv1a_32;

    pub use std::sync::Arc;
}
