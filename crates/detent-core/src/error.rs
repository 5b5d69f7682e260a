//! Error types for the Detent framework.

use std::path::PathBuf;

use thiserror::Error;

use crate::notification::ComponentId;
use crate::types::ParameterId;

/// Errors raised by non-real-time state operations.
///
/// Nothing on the audio path returns this type: reads, smoothing and the
/// gain stage are total.
#[derive(Debug, Error)]
pub enum StateError {
    /// The id does not belong to the store's parameter table.
    #[error("Unknown parameter id: {0:#010x}")]
    UnknownParameter(ParameterId),

    /// The (parameter, component) pair already has a callback.
    #[error("Observer {component:?} already registered for parameter {parameter:#010x}")]
    DuplicateObserver {
        parameter: ParameterId,
        component: ComponentId,
    },

    /// No preset file exists under the requested name.
    #[error("Preset not found: {}", .0.display())]
    PresetNotFound(PathBuf),

    /// Preset names become file names, so separators and empty names are refused.
    #[error("Invalid preset name: {0:?}")]
    InvalidPresetName(String),

    /// Neither a configured nor a platform presets directory is available.
    #[error("No presets directory available")]
    NoPresetDirectory,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed snapshot document (preset file or host state blob).
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for Detent state operations.
pub type StateResult<T> = Result<T, StateError>;
