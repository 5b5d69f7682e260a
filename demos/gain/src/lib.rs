//! Detent Gain - a gain/mix effect wired to the Detent parameter core.
//!
//! This crate shows how to:
//! 1. Declare a static parameter table with formatting rules and dependencies
//! 2. Share one [`ParameterStore`] between the control side and the processor
//! 3. Snap smoothing on the audio thread after a state reload
//! 4. Hand the host an opaque state blob
//! 5. Drive UI observers from a refresh tick

use detent::prelude::*;

// =============================================================================
// Plugin Configuration
// =============================================================================

pub static CONFIG: PluginConfig = PluginConfig::new("Gain")
    .with_vendor("Detent")
    .with_version(env!("CARGO_PKG_VERSION"));

// =============================================================================
// Parameters
// =============================================================================

pub const GAIN: ParameterId = fnv1a_32("GAIN");
pub const MODE: ParameterId = fnv1a_32("MODE");
pub const MIX: ParameterId = fnv1a_32("MIX");

/// Plain value of GAIN and MIX that means "100 %".
pub const FULL_SCALE: f64 = 100.0;

/// Display modes of the GAIN readout, selected by MODE.
pub const MODE_NAMES: &[&str] = &["Decibels", "Amplitude"];

pub static PARAMETERS: &[ParameterInfo] = &[
    ParameterInfo::new("GAIN", ParameterRange::new(0.0, FULL_SCALE))
        .with_nickname("Gain")
        .with_tooltip("Loudness Parameter")
        .with_default(50.0)
        .with_formatter(Formatter::Custom(CustomFormat::GainDisplay {
            full_scale: FULL_SCALE,
        }))
        .with_dependencies(&["MODE"]),
    ParameterInfo::new("MODE", ParameterRange::new(0.0, 1.0).with_step(1.0))
        .with_nickname("Mode")
        .with_tooltip("Mode")
        .with_formatter(Formatter::Choices {
            names: MODE_NAMES,
            suffix: "",
        }),
    ParameterInfo::new("MIX", ParameterRange::new(0.0, FULL_SCALE))
        .with_nickname("Mix")
        .with_tooltip("Mix")
        .with_default(50.0)
        .with_formatter(Formatter::Suffixed {
            precision: 2,
            suffix: "%",
        }),
];

// =============================================================================
// Plugin (control side)
// =============================================================================

/// The control side of the plugin: owns the store and talks to the host and UI.
pub struct GainPlugin {
    store: Arc<ParameterStore>,
}

impl GainPlugin {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            store: Arc::new(ParameterStore::new(PARAMETERS, config)),
        }
    }

    /// Build on a store the caller configured (e.g., with an automation sink).
    pub fn with_store(store: ParameterStore) -> Self {
        Self { store: Arc::new(store) }
    }

    pub fn store(&self) -> &Arc<ParameterStore> {
        &self.store
    }

    /// Create the audio-side processor once the sample rate is known.
    pub fn prepare(&self, sample_rate: f64, max_block_size: usize) -> GainProcessor {
        let mut processor = GainProcessor {
            store: Arc::clone(&self.store),
            stage: GainStage::default(),
            max_block_size,
        };
        processor.stage.prepare(sample_rate);
        processor.reset();
        log::debug!("Prepared at {} Hz, blocks up to {}", sample_rate, max_block_size);
        processor
    }

    /// State blob for the host session.
    pub fn get_state(&self) -> Vec<u8> {
        self.store.state_bytes().unwrap_or_else(|e| {
            log::warn!("Could not serialize state: {}", e);
            Vec::new()
        })
    }

    /// Restore from a host state blob. Malformed data changes nothing.
    pub fn set_state(&self, data: &[u8]) -> StateResult<()> {
        self.store.restore_bytes(data)
    }

    /// UI refresh callback. Returns the number of observer callbacks run.
    pub fn on_ui_tick(&self) -> usize {
        self.store.poll_changes()
    }
}

impl Default for GainPlugin {
    fn default() -> Self {
        Self::new(&StoreConfig::new(&CONFIG))
    }
}

// =============================================================================
// Audio Processor (prepared state)
// =============================================================================

/// The audio side. Reads the store lock-free once per block.
pub struct GainProcessor {
    store: Arc<ParameterStore>,
    stage: GainStage,
    max_block_size: usize,
}

impl GainProcessor {
    /// Current targets as fractions of full scale.
    #[inline]
    fn targets(&self) -> (f64, f64) {
        (
            self.store.get(GAIN) / FULL_SCALE,
            self.store.get(MIX) / FULL_SCALE,
        )
    }

    /// Jump to the current parameter values (e.g., after clearing tails).
    pub fn reset(&mut self) {
        let (gain, mix) = self.targets();
        self.stage.snap(gain, mix);
    }

    /// Largest block size announced in `prepare`.
    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    pub fn stage(&self) -> &GainStage {
        &self.stage
    }

    /// Process one block in place.
    ///
    /// A pending snap request (raised by a state reload) is consumed before
    /// the values are read, so the snap lands on the restored values.
    pub fn process<S: Sample>(&mut self, buffer: &mut AudioBuffer<'_, S>) {
        let snap = self.store.take_snap_request();
        let (gain, mix) = self.targets();
        if snap {
            self.stage.snap(gain, mix);
        } else {
            self.stage.set_targets(gain, mix);
        }
        self.stage.process(buffer);
    }
}
