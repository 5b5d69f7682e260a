//! The parameter store: authoritative state shared by UI, host and audio.
//!
//! [`ParameterStore`] owns one value per entry in a static
//! [`ParameterInfo`] table and is meant to be shared behind an `Arc`.
//!
//! # Thread Safety
//!
//! Each value is an `AtomicU64` holding `f64` bits. Writers publish with
//! `Release` and readers load with `Acquire`, so a `set` that completes
//! before a `get` is observed by it. The audio thread may call only the
//! lock-free methods:
//! - [`get()`](ParameterStore::get) / [`get_normalized()`](ParameterStore::get_normalized)
//! - [`take_snap_request()`](ParameterStore::take_snap_request)
//!
//! Everything else runs on non-real-time threads. Composite state (preset
//! name, observers, undo history, RNG) sits behind `parking_lot` locks that
//! the audio thread never touches.
//!
//! # Change tracking
//!
//! Every successful write raises the parameter's modified flag, the global
//! any-changed flag and the preset-modified flag. The UI consumes the first
//! two through [`poll_changes()`](ParameterStore::poll_changes); the third
//! is cleared only by `restore`, `load_preset`, `save_preset` and `init`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::automation::{AutomationSink, NoAutomation};
use crate::config::StoreConfig;
use crate::error::{StateError, StateResult};
use crate::notification::{ComponentHandle, ComponentId, ObserverCallback, ObserverTable};
use crate::parameter_info::ParameterInfo;
use crate::presets::PresetDirectory;
use crate::snapshot::{PresetMetadata, StateSnapshot};
use crate::types::{ParameterId, ParameterValue};
use crate::undo::{Edit, UndoLog};

/// Character limit for [`ParameterStore::parameter_text`].
pub const PARAMETER_TEXT_MAX_LEN: usize = 20;

/// Marker appended by [`ParameterStore::display_preset_name`] when the
/// preset has unsaved edits.
pub const MODIFIED_MARKER: char = '*';

struct ParameterSlot {
    value: AtomicU64,
    modified: AtomicBool,
    gesture_depth: AtomicU32,
    dependencies: Box<[usize]>,
}

impl ParameterSlot {
    #[inline]
    fn load(&self) -> ParameterValue {
        f64::from_bits(self.value.load(Ordering::Acquire))
    }
}

/// Thread-safe parameter state for one plugin instance.
pub struct ParameterStore {
    table: &'static [ParameterInfo],
    slots: Box<[ParameterSlot]>,
    index_by_id: HashMap<ParameterId, usize>,

    any_changed: AtomicBool,
    preset_modified: AtomicBool,
    snap_requested: AtomicBool,

    preset_name: RwLock<String>,
    default_preset_name: &'static str,
    observers: Mutex<ObserverTable>,
    history: Mutex<UndoLog>,
    rng: Mutex<ChaCha8Rng>,
    presets: PresetDirectory,
    automation: Box<dyn AutomationSink>,
}

impl ParameterStore {
    /// Build a store over `table` with every value at its default.
    ///
    /// # Panics
    ///
    /// Panics if two entries share a name (or id), if an entry's range is
    /// malformed, or if an entry lists a dependency that is not in the
    /// table. These are errors in the static table, not runtime conditions.
    pub fn new(table: &'static [ParameterInfo], config: &StoreConfig) -> Self {
        let mut index_by_id = HashMap::with_capacity(table.len());
        for (index, info) in table.iter().enumerate() {
            if let Err(problem) = info.range.validate() {
                panic!("Parameter {:?} has an invalid range: {}", info.name, problem);
            }
            if let Some(previous) = index_by_id.insert(info.id, index) {
                panic!(
                    "Parameter {:?} collides with {:?} (id {:#010x})",
                    info.name, table[previous].name, info.id
                );
            }
        }

        let slots = table
            .iter()
            .map(|info| {
                let dependencies = info
                    .dependencies
                    .iter()
                    .map(|name| {
                        table.iter().position(|other| other.name == *name).unwrap_or_else(|| {
                            panic!("Parameter {:?} depends on unknown parameter {:?}", info.name, name)
                        })
                    })
                    .collect();
                ParameterSlot {
                    value: AtomicU64::new(info.snapped_default().to_bits()),
                    modified: AtomicBool::new(false),
                    gesture_depth: AtomicU32::new(0),
                    dependencies,
                }
            })
            .collect();

        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        };

        let presets_dir = config.resolved_presets_dir();
        if presets_dir.is_none() {
            log::warn!("No presets directory for {}; preset files are disabled", config.plugin.name);
        }

        Self {
            table,
            slots,
            index_by_id,
            any_changed: AtomicBool::new(false),
            preset_modified: AtomicBool::new(false),
            snap_requested: AtomicBool::new(false),
            preset_name: RwLock::new(config.default_preset_name.to_string()),
            default_preset_name: config.default_preset_name,
            observers: Mutex::new(ObserverTable::new(table.len())),
            history: Mutex::new(UndoLog::new(config.undo_limit)),
            rng: Mutex::new(rng),
            presets: PresetDirectory::new(presets_dir, config.plugin.preset_extension()),
            automation: Box::new(NoAutomation),
        }
    }

    /// Route automatable edits and gestures to a host sink.
    pub fn with_automation(mut self, sink: impl AutomationSink + 'static) -> Self {
        self.automation = Box::new(sink);
        self
    }

    // =========================================================================
    // Table
    // =========================================================================

    /// The descriptor table, in index order.
    pub fn parameters(&self) -> &'static [ParameterInfo] {
        self.table
    }

    /// Number of parameters and properties.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Descriptor for `id`.
    pub fn info(&self, id: ParameterId) -> Option<&'static ParameterInfo> {
        let table = self.table;
        self.index_by_id.get(&id).map(|&index| &table[index])
    }

    #[inline]
    fn index(&self, id: ParameterId) -> StateResult<usize> {
        self.index_by_id
            .get(&id)
            .copied()
            .ok_or(StateError::UnknownParameter(id))
    }

    fn unknown(&self, id: ParameterId) -> StateError {
        log::warn!("Unknown parameter id {:#010x}", id);
        StateError::UnknownParameter(id)
    }

    // =========================================================================
    // Real-time reads
    // =========================================================================

    /// Latest published plain value, 0.0 for an unknown id.
    ///
    /// Lock-free and allocation-free.
    #[inline]
    pub fn get(&self, id: ParameterId) -> ParameterValue {
        match self.index_by_id.get(&id) {
            Some(&index) => self.slots[index].load(),
            None => 0.0,
        }
    }

    /// Latest published value normalized to 0.0..=1.0, 0.0 for an unknown id.
    #[inline]
    pub fn get_normalized(&self, id: ParameterId) -> ParameterValue {
        match self.index_by_id.get(&id) {
            Some(&index) => self.table[index].range.normalize(self.slots[index].load()),
            None => 0.0,
        }
    }

    /// Consume the "snap smoothing" request raised by `restore`.
    ///
    /// The audio thread calls this once at the start of each block. When it
    /// returns true, every value this call made visible is the restored one.
    #[inline]
    pub fn take_snap_request(&self) -> bool {
        self.snap_requested.swap(false, Ordering::AcqRel)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Store a snapped value and raise the change flags. Returns the
    /// previous value.
    fn publish(&self, index: usize, value: ParameterValue) -> ParameterValue {
        let slot = &self.slots[index];
        let previous = f64::from_bits(slot.value.swap(value.to_bits(), Ordering::AcqRel));
        slot.modified.store(true, Ordering::Release);
        self.any_changed.store(true, Ordering::Release);
        previous
    }

    fn write(&self, index: usize, value: ParameterValue, record: bool) {
        let info = &self.table[index];
        let snapped = info.range.snap(value);
        let previous = self.publish(index, snapped);
        self.preset_modified.store(true, Ordering::Release);

        if info.automatable {
            self.automation.perform_edit(info.id, info.range.normalize(snapped));
            if record && previous != snapped {
                self.history.lock().record(Edit::Value {
                    index,
                    before: previous,
                    after: snapped,
                });
            }
        }
    }

    /// Set a plain value, clamped and snapped to the parameter's range.
    ///
    /// Out-of-range input is never an error. Automatable parameters are
    /// reported to the automation sink and recorded for undo.
    pub fn set(&self, id: ParameterId, value: ParameterValue) -> StateResult<()> {
        let index = self.index(id).map_err(|_| self.unknown(id))?;
        self.write(index, value, true);
        Ok(())
    }

    /// Set a normalized value, clamped to 0.0..=1.0 first.
    pub fn set_normalized(&self, id: ParameterId, normalized: ParameterValue) -> StateResult<()> {
        let index = self.index(id).map_err(|_| self.unknown(id))?;
        let normalized = if normalized.is_nan() { 0.0 } else { normalized.clamp(0.0, 1.0) };
        let plain = self.table[index].range.denormalize(normalized);
        self.write(index, plain, true);
        Ok(())
    }

    /// Parse `text` with the parameter's formatter and set the result.
    pub fn set_from_text(&self, id: ParameterId, text: &str) -> StateResult<()> {
        let value = self.text_to_value(id, text)?;
        self.set(id, value)
    }

    /// Set a parameter back to its default.
    pub fn reset(&self, id: ParameterId) -> StateResult<()> {
        let index = self.index(id).map_err(|_| self.unknown(id))?;
        self.write(index, self.table[index].default, true);
        Ok(())
    }

    /// Set a uniformly random normalized value in `min..=max`.
    ///
    /// Bounds are clamped to 0.0..=1.0 and swapped if reversed.
    pub fn randomize(&self, id: ParameterId, min: ParameterValue, max: ParameterValue) -> StateResult<()> {
        self.index(id).map_err(|_| self.unknown(id))?;
        let (mut low, mut high) = (clamp_unit(min), clamp_unit(max));
        if low > high {
            std::mem::swap(&mut low, &mut high);
        }
        let normalized = self.rng.lock().random_range(low..=high);
        self.set_normalized(id, normalized)
    }

    /// Randomize every entry over its whole range as one undo step.
    pub fn randomize_all(&self) {
        self.history.lock().begin_group();
        for info in self.table {
            // Ids come from the table, so this cannot fail
            let _ = self.randomize(info.id, 0.0, 1.0);
        }
        self.history.lock().end_group();
    }

    // =========================================================================
    // Gestures and undo
    // =========================================================================

    /// Start a user gesture on `id`. Edits until the matching end form one
    /// undo step.
    pub fn begin_change_gesture(&self, id: ParameterId) -> StateResult<()> {
        let index = self.index(id).map_err(|_| self.unknown(id))?;
        self.slots[index].gesture_depth.fetch_add(1, Ordering::Relaxed);
        self.history.lock().begin_group();
        if self.table[index].automatable {
            self.automation.begin_gesture(id);
        }
        Ok(())
    }

    /// End a user gesture on `id`. An end without a begin is ignored.
    pub fn end_change_gesture(&self, id: ParameterId) -> StateResult<()> {
        let index = self.index(id).map_err(|_| self.unknown(id))?;
        let depth = &self.slots[index].gesture_depth;
        if depth
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |d| d.checked_sub(1))
            .is_err()
        {
            log::warn!("Gesture end on {:?} without a matching begin", self.table[index].name);
            return Ok(());
        }
        self.history.lock().end_group();
        if self.table[index].automatable {
            self.automation.end_gesture(id);
        }
        Ok(())
    }

    /// Close every open gesture without recording it. Later ends for these
    /// gestures are then unmatched and ignored.
    fn abandon_gestures(&self) {
        for (index, slot) in self.slots.iter().enumerate() {
            if slot.gesture_depth.swap(0, Ordering::Relaxed) > 0 && self.table[index].automatable {
                self.automation.end_gesture(self.table[index].id);
            }
        }
    }

    fn apply_edit(&self, edit: &Edit, forward: bool) {
        match edit {
            Edit::Value { index, before, after } => {
                let value = if forward { *after } else { *before };
                self.write(*index, value, false);
            }
            Edit::PresetName { before, after } => {
                let name = if forward { after } else { before };
                *self.preset_name.write() = name.clone();
                self.preset_modified.store(true, Ordering::Release);
            }
        }
    }

    /// Revert the newest transaction. Returns false if there was none.
    pub fn undo(&self) -> bool {
        let Some(transaction) = self.history.lock().undo() else {
            return false;
        };
        log::debug!("Undo {} edit(s)", transaction.edits.len());
        for edit in transaction.edits.iter().rev() {
            self.apply_edit(edit, false);
        }
        true
    }

    /// Re-apply the newest undone transaction. Returns false if there was none.
    pub fn redo(&self) -> bool {
        let Some(transaction) = self.history.lock().redo() else {
            return false;
        };
        log::debug!("Redo {} edit(s)", transaction.edits.len());
        for edit in &transaction.edits {
            self.apply_edit(edit, true);
        }
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.lock().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.lock().can_redo()
    }

    // =========================================================================
    // Change notification
    // =========================================================================

    /// Read and clear the modified flag of `id` (false for an unknown id).
    pub fn poll_and_clear_modified(&self, id: ParameterId) -> bool {
        match self.index_by_id.get(&id) {
            Some(&index) => self.slots[index].modified.swap(false, Ordering::AcqRel),
            None => false,
        }
    }

    /// Read and clear the global any-changed flag.
    pub fn take_any_changed(&self) -> bool {
        self.any_changed.swap(false, Ordering::AcqRel)
    }

    /// Register the default repaint callback of `component` on `id`.
    pub fn register_observer(&self, id: ParameterId, component: &ComponentHandle) -> StateResult<()> {
        self.register_observer_with(id, component.id(), component.repaint_callback())
    }

    /// Register a custom callback for `component` on `id`.
    ///
    /// Registering the same pair twice is a programming error: debug builds
    /// panic, release builds keep the first callback and return
    /// [`StateError::DuplicateObserver`].
    pub fn register_observer_with(
        &self,
        id: ParameterId,
        component: ComponentId,
        callback: ObserverCallback,
    ) -> StateResult<()> {
        let index = self.index(id).map_err(|_| self.unknown(id))?;
        if self.observers.lock().register(index, component, callback) {
            return Ok(());
        }
        let name = self.table[index].name;
        debug_assert!(false, "{} registered twice for parameter {:?}", component, name);
        log::warn!("{} registered twice for parameter {:?}; keeping the first callback", component, name);
        Err(StateError::DuplicateObserver { parameter: id, component })
    }

    /// Remove an observer. Removing one that isn't registered does nothing.
    pub fn unregister_observer(&self, id: ParameterId, component: ComponentId) -> StateResult<()> {
        let index = self.index(id).map_err(|_| self.unknown(id))?;
        if !self.observers.lock().unregister(index, component) {
            log::debug!("{} was not observing {:?}", component, self.table[index].name);
        }
        Ok(())
    }

    /// Number of observers registered on `id`.
    pub fn observer_count(&self, id: ParameterId) -> usize {
        match self.index_by_id.get(&id) {
            Some(&index) => self.observers.lock().observer_count(index),
            None => 0,
        }
    }

    /// Run the callbacks of every parameter changed since the last poll.
    ///
    /// Call once per UI refresh tick. Returns the number of callbacks run.
    /// The observer table is not locked while a callback runs, so callbacks
    /// may register or unregister observers. A callback unregistered during
    /// the tick does not run afterwards. Callbacks must not call
    /// `poll_changes` themselves.
    pub fn poll_changes(&self) -> usize {
        if !self.take_any_changed() {
            return 0;
        }
        let mut fired = 0;
        for (index, slot) in self.slots.iter().enumerate() {
            if slot.modified.swap(false, Ordering::AcqRel) {
                fired += self.notify(index);
            }
        }
        fired
    }

    fn notify(&self, index: usize) -> usize {
        let observers = self.observers.lock().observers(index);
        let mut fired = 0;
        for (component, callback) in observers {
            if !self.observers.lock().is_registered(index, component) {
                continue;
            }
            let mut callback = callback.lock();
            (&mut *callback)();
            fired += 1;
        }
        fired
    }

    // =========================================================================
    // Text
    // =========================================================================

    /// Format `value` for `id`, feeding the formatter its dependencies'
    /// current values.
    pub fn value_to_text(&self, id: ParameterId, value: ParameterValue, max_len: usize) -> StateResult<String> {
        let index = self.index(id)?;
        let dependencies: Vec<f64> = self.slots[index]
            .dependencies
            .iter()
            .map(|&dep| self.slots[dep].load())
            .collect();
        Ok(self.table[index].formatter.format(value, max_len, &dependencies))
    }

    /// Parse `text` for `id`. The result is clamped and snapped.
    pub fn text_to_value(&self, id: ParameterId, text: &str) -> StateResult<ParameterValue> {
        let index = self.index(id)?;
        let info = &self.table[index];
        Ok(info.range.snap(info.formatter.parse(text)))
    }

    /// Current value of `id` as display text (empty for an unknown id).
    pub fn parameter_text(&self, id: ParameterId) -> String {
        self.value_to_text(id, self.get(id), PARAMETER_TEXT_MAX_LEN)
            .unwrap_or_default()
    }

    // =========================================================================
    // Preset identity
    // =========================================================================

    pub fn preset_name(&self) -> String {
        self.preset_name.read().clone()
    }

    /// Preset name with [`MODIFIED_MARKER`] appended when there are unsaved edits.
    pub fn display_preset_name(&self) -> String {
        let mut name = self.preset_name();
        if self.is_preset_modified() {
            name.push(MODIFIED_MARKER);
        }
        name
    }

    /// Rename the current preset. Undoable.
    pub fn set_preset_name(&self, name: &str) {
        let before = std::mem::replace(&mut *self.preset_name.write(), name.to_string());
        self.preset_modified.store(true, Ordering::Release);
        if before != name {
            self.history.lock().record(Edit::PresetName {
                before,
                after: name.to_string(),
            });
        }
    }

    /// True after any write since the last load, save or init.
    pub fn is_preset_modified(&self) -> bool {
        self.preset_modified.load(Ordering::Acquire)
    }

    // =========================================================================
    // Snapshot and restore
    // =========================================================================

    /// Copy of every value and the preset metadata.
    pub fn snapshot(&self) -> StateSnapshot {
        let name = self.preset_name.read();
        let mut snapshot = StateSnapshot {
            preset: PresetMetadata {
                name: name.clone(),
                modified: self.is_preset_modified(),
            },
            ..StateSnapshot::default()
        };
        for (info, slot) in self.table.iter().zip(self.slots.iter()) {
            let section = if info.automatable {
                &mut snapshot.parameters
            } else {
                &mut snapshot.properties
            };
            section.insert(info.name.to_string(), slot.load());
        }
        snapshot
    }

    /// Replace every value from `snapshot`.
    ///
    /// Entries missing from the snapshot take their defaults; unknown names
    /// are ignored. Abandons open gestures, clears preset-modified and the
    /// undo history, and asks the audio thread to snap its smoothers on the
    /// next block.
    pub fn restore(&self, snapshot: &StateSnapshot) {
        self.abandon_gestures();
        let mut name = self.preset_name.write();
        for (index, info) in self.table.iter().enumerate() {
            let section = if info.automatable {
                &snapshot.parameters
            } else {
                &snapshot.properties
            };
            let value = section.get(info.name).copied().unwrap_or(info.default);
            self.publish(index, info.range.snap(value));
        }
        *name = snapshot.preset.name.clone();
        self.preset_modified.store(false, Ordering::Release);
        self.history.lock().clear();
        self.snap_requested.store(true, Ordering::Release);
        log::debug!("Restored state {:?}", *name);
    }

    /// Every value back to its default, preset name back to the default name.
    pub fn init(&self) {
        let snapshot = StateSnapshot {
            preset: PresetMetadata {
                name: self.default_preset_name.to_string(),
                modified: false,
            },
            ..StateSnapshot::default()
        };
        self.restore(&snapshot);
    }

    /// Host state blob (the snapshot as JSON bytes).
    pub fn state_bytes(&self) -> StateResult<Vec<u8>> {
        self.snapshot().to_bytes()
    }

    /// Restore from a host state blob.
    ///
    /// Malformed data leaves the store untouched and returns the error; on
    /// a fresh instance that is the default state.
    pub fn restore_bytes(&self, bytes: &[u8]) -> StateResult<()> {
        match StateSnapshot::from_bytes(bytes) {
            Ok(snapshot) => {
                self.restore(&snapshot);
                Ok(())
            }
            Err(e) => {
                log::warn!("Ignoring malformed state ({} bytes): {}", bytes.len(), e);
                Err(e)
            }
        }
    }

    // =========================================================================
    // Presets
    // =========================================================================

    /// Directory preset files live in, if one was resolved.
    pub fn presets_dir(&self) -> Option<&Path> {
        self.presets.root()
    }

    /// Write the current state as preset `name` and make it the current preset.
    pub fn save_preset(&self, name: &str) -> StateResult<()> {
        let mut snapshot = self.snapshot();
        snapshot.preset = PresetMetadata {
            name: name.to_string(),
            modified: false,
        };
        self.presets.write(name, &snapshot)?;
        *self.preset_name.write() = name.to_string();
        self.preset_modified.store(false, Ordering::Release);
        log::debug!("Saved preset {:?}", name);
        Ok(())
    }

    /// Load preset `name`. A missing or corrupt file leaves the state as is.
    pub fn load_preset(&self, name: &str) -> StateResult<()> {
        match self.presets.read(name) {
            Ok(mut snapshot) => {
                snapshot.preset.name = name.to_string();
                self.restore(&snapshot);
                log::debug!("Loaded preset {:?}", name);
                Ok(())
            }
            Err(e) => {
                log::warn!("Could not load preset {:?}: {}", name, e);
                Err(e)
            }
        }
    }

    /// Sorted names of the saved presets.
    pub fn list_presets(&self) -> StateResult<Vec<String>> {
        self.presets.list()
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PluginConfig;
    use crate::parameter_format::{CustomFormat, Formatter};
    use crate::parameter_range::ParameterRange;
    use detent_utils::fnv1a_32;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    const GAIN: ParameterId = fnv1a_32("GAIN");
    const MODE: ParameterId = fnv1a_32("MODE");
    const MIX: ParameterId = fnv1a_32("MIX");
    const ZOOM: ParameterId = fnv1a_32("ZOOM");

    static TABLE: &[ParameterInfo] = &[
        ParameterInfo::new("GAIN", ParameterRange::new(0.0, 100.0))
            .with_default(50.0)
            .with_formatter(Formatter::Custom(CustomFormat::GainDisplay { full_scale: 100.0 }))
            .with_dependencies(&["MODE"]),
        ParameterInfo::new("MODE", ParameterRange::new(0.0, 1.0).with_step(1.0)).with_formatter(
            Formatter::Choices {
                names: &["Decibels", "Amplitude"],
                suffix: "",
            },
        ),
        ParameterInfo::new("MIX", ParameterRange::new(0.0, 100.0))
            .with_default(50.0)
            .with_formatter(Formatter::Suffixed { precision: 2, suffix: "%" }),
        ParameterInfo::property("ZOOM", ParameterRange::new(1.0, 4.0)).with_default(1.0),
    ];

    static PLUGIN: PluginConfig = PluginConfig::new("Gain").with_vendor("Detent");

    fn store_in(dir: &Path) -> ParameterStore {
        let _ = env_logger::builder().is_test(true).try_init();
        let config = StoreConfig::new(&PLUGIN).with_presets_dir(dir).with_seed(7);
        ParameterStore::new(TABLE, &config)
    }

    fn store() -> (tempfile::TempDir, ParameterStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        (dir, store)
    }

    fn counter(hits: &Arc<AtomicUsize>) -> ObserverCallback {
        let hits = Arc::clone(hits);
        Box::new(move || {
            hits.fetch_add(1, Ordering::Relaxed);
        })
    }

    #[derive(Default)]
    struct RecordingSink {
        events: parking_lot::Mutex<Vec<String>>,
    }

    impl AutomationSink for Arc<RecordingSink> {
        fn begin_gesture(&self, id: ParameterId) {
            self.events.lock().push(format!("begin {id:#x}"));
        }
        fn perform_edit(&self, id: ParameterId, normalized: ParameterValue) {
            self.events.lock().push(format!("edit {id:#x} {normalized:.2}"));
        }
        fn end_gesture(&self, id: ParameterId) {
            self.events.lock().push(format!("end {id:#x}"));
        }
    }

    #[test]
    fn test_defaults() {
        let (_dir, store) = store();
        assert_eq!(store.len(), 4);
        assert_eq!(store.get(GAIN), 50.0);
        assert_eq!(store.get(MODE), 0.0);
        assert_eq!(store.get_normalized(MIX), 0.5);
        assert_eq!(store.preset_name(), "INIT");
        assert!(!store.is_preset_modified());
        assert!(!store.take_snap_request());
    }

    #[test]
    fn test_set_then_get() {
        let (_dir, store) = store();
        store.set(GAIN, 37.5).unwrap();
        assert_eq!(store.get(GAIN), 37.5);
        store.set(MODE, 0.7).unwrap();
        assert_eq!(store.get(MODE), 1.0);
    }

    #[test]
    fn test_out_of_range_clamps() {
        let (_dir, store) = store();
        store.set(GAIN, 250.0).unwrap();
        assert_eq!(store.get(GAIN), 100.0);
        store.set(GAIN, -3.0).unwrap();
        assert_eq!(store.get(GAIN), 0.0);
        store.set(GAIN, f64::NAN).unwrap();
        assert_eq!(store.get(GAIN), 0.0);

        store.set_normalized(MIX, 1.5).unwrap();
        assert_eq!(store.get(MIX), 100.0);
        store.set_normalized(MIX, -0.5).unwrap();
        assert_eq!(store.get(MIX), 0.0);
        store.set_normalized(MIX, 0.25).unwrap();
        assert_eq!(store.get(MIX), 25.0);
    }

    #[test]
    fn test_unknown_id() {
        let (_dir, store) = store();
        let bogus = fnv1a_32("NOPE");
        assert_eq!(store.get(bogus), 0.0);
        assert!(matches!(store.set(bogus, 1.0), Err(StateError::UnknownParameter(id)) if id == bogus));
        assert!(store.reset(bogus).is_err());
        assert!(store.begin_change_gesture(bogus).is_err());
        assert!(!store.poll_and_clear_modified(bogus));
        assert_eq!(store.parameter_text(bogus), "");
        assert!(!store.is_preset_modified());
    }

    #[test]
    fn test_set_marks_flags() {
        let (_dir, store) = store();
        store.set(MIX, 20.0).unwrap();
        assert!(store.is_preset_modified());
        assert!(store.poll_and_clear_modified(MIX));
        assert!(!store.poll_and_clear_modified(MIX));
        assert!(!store.poll_and_clear_modified(GAIN));
        assert!(store.take_any_changed());
        assert!(!store.take_any_changed());
    }

    #[test]
    fn test_observers_fire_once_per_change() {
        let (_dir, store) = store();
        let a = Arc::new(AtomicUsize::new(0));
        let b = Arc::new(AtomicUsize::new(0));
        store.register_observer_with(GAIN, ComponentId::next(), counter(&a)).unwrap();
        store.register_observer_with(GAIN, ComponentId::next(), counter(&b)).unwrap();

        store.set(GAIN, 0.7).unwrap();
        assert_eq!(store.poll_changes(), 2);
        assert_eq!(a.load(Ordering::Relaxed), 1);
        assert_eq!(b.load(Ordering::Relaxed), 1);

        assert_eq!(store.poll_changes(), 0);
        assert_eq!(a.load(Ordering::Relaxed), 1);
        assert_eq!(b.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_observers_only_for_changed_parameter() {
        let (_dir, store) = store();
        let gain_hits = Arc::new(AtomicUsize::new(0));
        let mix_hits = Arc::new(AtomicUsize::new(0));
        store.register_observer_with(GAIN, ComponentId::next(), counter(&gain_hits)).unwrap();
        store.register_observer_with(MIX, ComponentId::next(), counter(&mix_hits)).unwrap();

        store.set(MIX, 10.0).unwrap();
        store.set(MIX, 11.0).unwrap();
        assert_eq!(store.poll_changes(), 1);
        assert_eq!(gain_hits.load(Ordering::Relaxed), 0);
        assert_eq!(mix_hits.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_default_observer_marks_repaint() {
        let (_dir, store) = store();
        let knob = ComponentHandle::new();
        store.register_observer(GAIN, &knob).unwrap();
        store.set(GAIN, 12.0).unwrap();
        assert!(!knob.needs_repaint());
        store.poll_changes();
        assert!(knob.take_repaint());

        store.unregister_observer(GAIN, knob.id()).unwrap();
        store.set(GAIN, 13.0).unwrap();
        assert_eq!(store.poll_changes(), 0);
        assert!(!knob.take_repaint());
    }

    #[test]
    fn test_callbacks_may_unregister_observers() {
        let (_dir, store) = store();
        let store = Arc::new(store);
        let first = ComponentId::next();
        let second = ComponentId::next();
        let hits = Arc::new(AtomicUsize::new(0));

        // The first callback rebuilds the widget set: it drops itself and
        // the second observer.
        let weak = Arc::downgrade(&store);
        store
            .register_observer_with(MODE, first, Box::new(move || {
                if let Some(store) = weak.upgrade() {
                    store.unregister_observer(MODE, first).unwrap();
                    store.unregister_observer(MODE, second).unwrap();
                }
            }))
            .unwrap();
        store.register_observer_with(MODE, second, counter(&hits)).unwrap();

        store.set(MODE, 1.0).unwrap();
        assert_eq!(store.poll_changes(), 1);
        assert_eq!(hits.load(Ordering::Relaxed), 0);
        assert_eq!(store.observer_count(MODE), 0);

        store.set(MODE, 0.0).unwrap();
        assert_eq!(store.poll_changes(), 0);
    }

    #[test]
    fn test_callbacks_may_register_observers() {
        let (_dir, store) = store();
        let store = Arc::new(store);
        let hits = Arc::new(AtomicUsize::new(0));
        let weak = Arc::downgrade(&store);
        let late = counter(&hits);
        let mut late = Some(late);
        store
            .register_observer_with(GAIN, ComponentId::next(), Box::new(move || {
                if let (Some(store), Some(callback)) = (weak.upgrade(), late.take()) {
                    store.register_observer_with(GAIN, ComponentId::next(), callback).unwrap();
                }
            }))
            .unwrap();

        store.set(GAIN, 60.0).unwrap();
        assert_eq!(store.poll_changes(), 1);
        assert_eq!(hits.load(Ordering::Relaxed), 0);

        store.set(GAIN, 70.0).unwrap();
        assert_eq!(store.poll_changes(), 2);
        assert_eq!(hits.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_unregister_unknown_pair_is_noop() {
        let (_dir, store) = store();
        store.unregister_observer(GAIN, ComponentId::next()).unwrap();
        assert_eq!(store.observer_count(GAIN), 0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "registered twice")]
    fn test_duplicate_observer_panics_in_debug() {
        let (_dir, store) = store();
        let knob = ComponentHandle::new();
        store.register_observer(GAIN, &knob).unwrap();
        let _ = store.register_observer(GAIN, &knob);
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn test_duplicate_observer_keeps_first_in_release() {
        let (_dir, store) = store();
        let knob = ComponentHandle::new();
        let hits = Arc::new(AtomicUsize::new(0));
        store.register_observer(GAIN, &knob).unwrap();
        assert!(matches!(
            store.register_observer_with(GAIN, knob.id(), counter(&hits)),
            Err(StateError::DuplicateObserver { .. })
        ));
        assert_eq!(store.observer_count(GAIN), 1);
        store.set(GAIN, 1.0).unwrap();
        store.poll_changes();
        assert!(knob.take_repaint());
        assert_eq!(hits.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_preset_round_trip() {
        let (_dir, store) = store();
        store.set(GAIN, 37.5).unwrap();
        store.save_preset("Test").unwrap();
        assert!(!store.is_preset_modified());

        store.reset(GAIN).unwrap();
        assert_eq!(store.get(GAIN), 50.0);
        assert!(store.is_preset_modified());

        store.load_preset("Test").unwrap();
        assert_eq!(store.get(GAIN), 37.5);
        assert!(!store.is_preset_modified());
        assert_eq!(store.preset_name(), "Test");
        assert_eq!(store.list_presets().unwrap(), vec!["Test"]);
    }

    #[test]
    fn test_failed_load_keeps_state() {
        let (dir, store) = store();
        store.set(GAIN, 12.0).unwrap();

        assert!(matches!(store.load_preset("Missing"), Err(StateError::PresetNotFound(_))));
        std::fs::write(dir.path().join("Broken.gain"), "{").unwrap();
        assert!(store.load_preset("Broken").is_err());

        assert_eq!(store.get(GAIN), 12.0);
        assert!(store.is_preset_modified());
        assert!(!store.take_snap_request());
    }

    #[test]
    fn test_gesture_is_one_undo_step() {
        let (_dir, store) = store();
        let before = store.get(GAIN);

        store.begin_change_gesture(GAIN).unwrap();
        store.set(GAIN, 10.0).unwrap();
        store.set(GAIN, 90.0).unwrap();
        store.end_change_gesture(GAIN).unwrap();

        assert!(store.undo());
        assert_eq!(store.get(GAIN), before);
        assert!(!store.can_undo());

        assert!(store.redo());
        assert_eq!(store.get(GAIN), 90.0);
    }

    #[test]
    fn test_nested_and_unmatched_gestures() {
        let (_dir, store) = store();
        store.end_change_gesture(GAIN).unwrap();

        store.begin_change_gesture(GAIN).unwrap();
        store.begin_change_gesture(MIX).unwrap();
        store.set(GAIN, 10.0).unwrap();
        store.set(MIX, 10.0).unwrap();
        store.end_change_gesture(MIX).unwrap();
        store.end_change_gesture(MIX).unwrap();
        store.set(GAIN, 20.0).unwrap();
        store.end_change_gesture(GAIN).unwrap();

        assert!(store.undo());
        assert_eq!(store.get(GAIN), 50.0);
        assert_eq!(store.get(MIX), 50.0);
        assert!(!store.undo());
    }

    #[test]
    fn test_restore_abandons_open_gestures() {
        let (_dir, store) = store();
        store.begin_change_gesture(GAIN).unwrap();
        store.set(GAIN, 10.0).unwrap();
        store.restore(&store.snapshot());

        store.begin_change_gesture(MIX).unwrap();
        store.set(MIX, 20.0).unwrap();
        // Belongs to the gesture the restore abandoned
        store.end_change_gesture(GAIN).unwrap();
        store.set(MIX, 30.0).unwrap();
        store.end_change_gesture(MIX).unwrap();

        assert!(store.undo());
        assert_eq!(store.get(MIX), 50.0);
        assert_eq!(store.get(GAIN), 10.0);
        assert!(!store.undo());
    }

    #[test]
    fn test_restore_ends_host_gestures() {
        let sink = Arc::new(RecordingSink::default());
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::new(&PLUGIN).with_presets_dir(dir.path()).with_seed(7);
        let store = ParameterStore::new(TABLE, &config).with_automation(Arc::clone(&sink));

        store.begin_change_gesture(GAIN).unwrap();
        store.init();
        store.end_change_gesture(GAIN).unwrap();

        let events = sink.events.lock();
        assert_eq!(events.len(), 2);
        assert!(events[0].starts_with("begin"));
        assert!(events[1].starts_with("end"));
    }

    #[test]
    fn test_undo_marks_dirty_and_notifies() {
        let (_dir, store) = store();
        store.set(GAIN, 10.0).unwrap();
        store.save_preset("Saved").unwrap();
        store.take_any_changed();
        store.poll_and_clear_modified(GAIN);

        assert!(store.undo());
        assert_eq!(store.get(GAIN), 50.0);
        assert!(store.is_preset_modified());
        assert!(store.poll_and_clear_modified(GAIN));
        assert!(store.take_any_changed());
    }

    #[test]
    fn test_empty_history_is_noop() {
        let (_dir, store) = store();
        assert!(!store.undo());
        assert!(!store.redo());
        assert_eq!(store.get(GAIN), 50.0);
    }

    #[test]
    fn test_properties_skip_undo_and_automation() {
        let sink = Arc::new(RecordingSink::default());
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::new(&PLUGIN).with_presets_dir(dir.path());
        let store = ParameterStore::new(TABLE, &config).with_automation(Arc::clone(&sink));

        store.set(ZOOM, 2.0).unwrap();
        assert!(!store.can_undo());
        assert!(store.is_preset_modified());
        assert!(sink.events.lock().is_empty());

        store.begin_change_gesture(MIX).unwrap();
        store.set(MIX, 25.0).unwrap();
        store.end_change_gesture(MIX).unwrap();
        assert_eq!(
            *sink.events.lock(),
            vec![
                format!("begin {MIX:#x}"),
                format!("edit {MIX:#x} 0.25"),
                format!("end {MIX:#x}"),
            ]
        );
    }

    #[test]
    fn test_snapshot_sections() {
        let (_dir, store) = store();
        store.set(ZOOM, 3.0).unwrap();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.parameters.len(), 3);
        assert_eq!(snapshot.properties["ZOOM"], 3.0);
        assert_eq!(snapshot.preset.name, "INIT");
        assert!(snapshot.preset.modified);
    }

    #[test]
    fn test_restore_is_idempotent() {
        let (_dir, store) = store();
        store.set(GAIN, 12.0).unwrap();
        store.set(ZOOM, 2.5).unwrap();
        let saved = store.snapshot();

        store.set(GAIN, 99.0).unwrap();
        store.restore(&saved);
        let once = store.snapshot();
        store.restore(&saved);
        let twice = store.snapshot();

        assert_eq!(once, twice);
        assert_eq!(store.get(GAIN), 12.0);
        assert_eq!(store.get(ZOOM), 2.5);
        assert!(!once.preset.modified);
    }

    #[test]
    fn test_restore_fills_defaults_and_requests_snap() {
        let (_dir, store) = store();
        store.set(MIX, 5.0).unwrap();
        store.set(GAIN, 5.0).unwrap();

        let mut snapshot = StateSnapshot::default();
        snapshot.parameters.insert("GAIN".into(), 400.0);
        snapshot.parameters.insert("UNKNOWN".into(), 1.0);
        snapshot.preset.name = "Loaded".into();
        store.restore(&snapshot);

        assert_eq!(store.get(GAIN), 100.0);
        assert_eq!(store.get(MIX), 50.0);
        assert_eq!(store.display_preset_name(), "Loaded");
        assert!(!store.can_undo());
        assert!(store.take_snap_request());
        assert!(!store.take_snap_request());
        assert!(store.poll_and_clear_modified(MIX));
    }

    #[test]
    fn test_state_bytes_and_malformed_blob() {
        let (_dir, store) = store();
        store.set(MIX, 75.0).unwrap();
        let blob = store.state_bytes().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let other = store_in(dir.path());
        other.restore_bytes(&blob).unwrap();
        assert_eq!(other.get(MIX), 75.0);

        let fresh = store_in(dir.path());
        assert!(fresh.restore_bytes(b"garbage").is_err());
        assert!(fresh.restore_bytes(&[]).is_err());
        assert_eq!(fresh.snapshot(), store_in(dir.path()).snapshot());
    }

    #[test]
    fn test_init() {
        let (_dir, store) = store();
        store.set(GAIN, 1.0).unwrap();
        store.set_preset_name("Edited");
        store.init();
        assert_eq!(store.get(GAIN), 50.0);
        assert_eq!(store.preset_name(), "INIT");
        assert!(!store.is_preset_modified());
        assert!(!store.can_undo());
    }

    #[test]
    fn test_preset_name_display_and_undo() {
        let (_dir, store) = store();
        assert_eq!(store.display_preset_name(), "INIT");
        store.set_preset_name("Warm");
        assert_eq!(store.display_preset_name(), "Warm*");
        assert!(store.undo());
        assert_eq!(store.preset_name(), "INIT");
        assert!(store.redo());
        assert_eq!(store.preset_name(), "Warm");
    }

    #[test]
    fn test_randomize_within_bounds() {
        let (_dir, store) = store();
        for _ in 0..50 {
            store.randomize(MIX, 0.2, 0.4).unwrap();
            let value = store.get(MIX);
            assert!((20.0..=40.0).contains(&value));
        }
        store.randomize(MIX, 0.9, 0.1).unwrap();
        assert!((10.0..=90.0).contains(&store.get(MIX)));
        store.randomize(MODE, 0.0, 1.0).unwrap();
        assert!(store.get(MODE) == 0.0 || store.get(MODE) == 1.0);
    }

    #[test]
    fn test_seeded_randomize_is_reproducible() {
        let (_a, first) = store();
        let (_b, second) = store();
        first.randomize_all();
        second.randomize_all();
        assert_eq!(first.snapshot().parameters, second.snapshot().parameters);
        assert!(first.undo());
        assert_eq!(first.get(GAIN), 50.0);
    }

    #[test]
    fn test_text_uses_dependencies() {
        let (_dir, store) = store();
        assert_eq!(store.parameter_text(GAIN), "-6.02 dB");
        store.set(MODE, 1.0).unwrap();
        assert_eq!(store.parameter_text(GAIN), "x0.50");
        assert_eq!(store.parameter_text(MODE), "Amplitude");
        assert_eq!(store.parameter_text(MIX), "50.00 %");

        store.set_from_text(MIX, "37.5 %").unwrap();
        assert_eq!(store.get(MIX), 37.5);
        assert_eq!(store.text_to_value(MIX, "900").unwrap(), 100.0);
        assert_eq!(store.text_to_value(MODE, "Amplitude").unwrap(), 1.0);
    }

    #[test]
    fn test_concurrent_reads_never_tear() {
        let (_dir, store) = store();
        let store = Arc::new(store);
        let reader = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for _ in 0..10_000 {
                    let value = store.get(GAIN);
                    assert!(value == 50.0 || value == 12.25 || value == 87.75);
                }
            })
        };
        for i in 0..1_000 {
            store.set(GAIN, if i % 2 == 0 { 12.25 } else { 87.75 }).unwrap();
        }
        reader.join().unwrap();
    }

    #[test]
    #[should_panic(expected = "collides")]
    fn test_duplicate_names_rejected() {
        static DUPES: &[ParameterInfo] = &[
            ParameterInfo::new("A", ParameterRange::new(0.0, 1.0)),
            ParameterInfo::new("A", ParameterRange::new(0.0, 2.0)),
        ];
        let _ = ParameterStore::new(DUPES, &StoreConfig::new(&PLUGIN).with_seed(1));
    }

    #[test]
    #[should_panic(expected = "unknown parameter")]
    fn test_missing_dependency_rejected() {
        static BROKEN: &[ParameterInfo] =
            &[ParameterInfo::new("A", ParameterRange::new(0.0, 1.0)).with_dependencies(&["B"])];
        let _ = ParameterStore::new(BROKEN, &StoreConfig::new(&PLUGIN).with_seed(1));
    }

    #[test]
    #[should_panic(expected = "invalid range")]
    fn test_inverted_range_rejected() {
        static INVERTED: &[ParameterInfo] = &[ParameterInfo::new("A", ParameterRange::new(1.0, 0.0))];
        let _ = ParameterStore::new(INVERTED, &StoreConfig::new(&PLUGIN).with_seed(1));
    }

    #[test]
    #[should_panic(expected = "skew must be positive")]
    fn test_bad_skew_rejected() {
        static SKEWED: &[ParameterInfo] =
            &[ParameterInfo::new("A", ParameterRange::new(0.0, 1.0).with_skew(-2.0))];
        let _ = ParameterStore::new(SKEWED, &StoreConfig::new(&PLUGIN).with_seed(1));
    }
}
