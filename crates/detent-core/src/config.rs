//! Plugin and store configuration.
//!
//! [`PluginConfig`] is static plugin identity, built with `const fn` so it
//! can live in a `static`. [`StoreConfig`] adds the runtime knobs of a
//! [`ParameterStore`](crate::ParameterStore) instance.
//!
//! # Example
//!
//! ```ignore
//! use detent_core::{PluginConfig, StoreConfig};
//!
//! pub static CONFIG: PluginConfig = PluginConfig::new("Gain")
//!     .with_vendor("Detent")
//!     .with_version(env!("CARGO_PKG_VERSION"));
//!
//! let store_config = StoreConfig::new(&CONFIG).with_undo_limit(50);
//! ```

use std::path::PathBuf;

/// Name given to the state produced by `init()` and to a fresh store.
pub const DEFAULT_PRESET_NAME: &str = "INIT";

/// Default number of undo transactions kept.
pub const DEFAULT_UNDO_LIMIT: usize = 100;

/// Static plugin identity.
///
/// Used to derive the preset file extension and the default presets
/// directory.
#[derive(Debug, Clone)]
pub struct PluginConfig {
    /// Plugin name displayed in the host.
    pub name: &'static str,

    /// Vendor/company name.
    pub vendor: &'static str,

    /// Plugin version string.
    pub version: &'static str,
}

impl PluginConfig {
    /// Create a new plugin configuration with default values.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            vendor: "Unknown Vendor",
            version: "1.0.0",
        }
    }

    /// Set the vendor name.
    pub const fn with_vendor(mut self, vendor: &'static str) -> Self {
        self.vendor = vendor;
        self
    }

    /// Set the version string.
    pub const fn with_version(mut self, version: &'static str) -> Self {
        self.version = version;
        self
    }

    /// Preset file extension, without the leading dot (`"gain"` for "Gain").
    pub fn preset_extension(&self) -> String {
        self.name.to_lowercase()
    }

    /// Platform presets directory:
    /// `<audio dir>/<vendor>_plugins/<name>/presets`.
    ///
    /// Falls back to the home directory's `Music` folder when the platform
    /// reports no audio directory. Returns `None` when neither exists.
    pub fn default_presets_dir(&self) -> Option<PathBuf> {
        let base = dirs::audio_dir().or_else(|| dirs::home_dir().map(|home| home.join("Music")))?;
        Some(
            base.join(format!("{}_plugins", self.vendor))
                .join(self.name)
                .join("presets"),
        )
    }
}

/// Runtime configuration for one store instance.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Static plugin identity.
    pub plugin: PluginConfig,

    /// Overrides [`PluginConfig::default_presets_dir`].
    pub presets_dir: Option<PathBuf>,

    /// Maximum undo transactions kept; the oldest are dropped first.
    pub undo_limit: usize,

    /// Seed for `randomize`; `None` seeds from the OS.
    pub seed: Option<u64>,

    /// Preset name after construction and `init()`.
    pub default_preset_name: &'static str,
}

impl StoreConfig {
    pub fn new(plugin: &PluginConfig) -> Self {
        Self {
            plugin: plugin.clone(),
            presets_dir: None,
            undo_limit: DEFAULT_UNDO_LIMIT,
            seed: None,
            default_preset_name: DEFAULT_PRESET_NAME,
        }
    }

    /// Store presets somewhere other than the platform directory.
    pub fn with_presets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.presets_dir = Some(dir.into());
        self
    }

    pub fn with_undo_limit(mut self, limit: usize) -> Self {
        self.undo_limit = limit.max(1);
        self
    }

    /// Make `randomize` reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// The directory presets are read from and written to.
    pub fn resolved_presets_dir(&self) -> Option<PathBuf> {
        self.presets_dir
            .clone()
            .or_else(|| self.plugin.default_presets_dir())
    }
}
