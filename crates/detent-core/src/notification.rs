//! Poll-based change notification.
//!
//! Writers never call into the UI. They flip atomic flags in the store, and
//! the UI thread calls `ParameterStore::poll_changes` once per refresh
//! tick. That call consumes the flags and runs the callbacks registered here.
//! The audio thread only ever touches the flags, so it never waits on UI
//! work.
//!
//! A UI component identifies itself with a [`ComponentHandle`]. The default
//! callback just raises the handle's repaint flag, which the component
//! consumes from its own paint loop.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// Callback run on the UI thread when a watched parameter changed.
pub type ObserverCallback = Box<dyn FnMut() + Send>;

static NEXT_COMPONENT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a UI component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u64);

impl ComponentId {
    /// Allocate a fresh id.
    pub fn next() -> Self {
        Self(NEXT_COMPONENT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "component #{}", self.0)
    }
}

/// A UI component's identity plus its shared "needs repaint" flag.
///
/// Cloning shares the flag, so the clone held by a callback and the one
/// held by the component see the same state.
#[derive(Debug, Clone)]
pub struct ComponentHandle {
    id: ComponentId,
    repaint: Arc<AtomicBool>,
}

impl ComponentHandle {
    /// Create a handle with a fresh [`ComponentId`].
    pub fn new() -> Self {
        Self {
            id: ComponentId::next(),
            repaint: Arc::new(AtomicBool::new(false)),
        }
    }

    /// This component's id.
    #[inline]
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Request a repaint.
    #[inline]
    pub fn mark_repaint(&self) {
        self.repaint.store(true, Ordering::Release);
    }

    /// Read and clear the repaint request.
    #[inline]
    pub fn take_repaint(&self) -> bool {
        self.repaint.swap(false, Ordering::AcqRel)
    }

    /// Read the repaint request without clearing it.
    #[inline]
    pub fn needs_repaint(&self) -> bool {
        self.repaint.load(Ordering::Acquire)
    }

    /// The default observer callback: mark this component for repaint.
    pub fn repaint_callback(&self) -> ObserverCallback {
        let repaint = Arc::clone(&self.repaint);
        Box::new(move || repaint.store(true, Ordering::Release))
    }
}

impl Default for ComponentHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// A callback that can be run after the table lock is released.
pub(crate) type SharedCallback = Arc<Mutex<ObserverCallback>>;

/// Per-parameter observer lists, indexed like the parameter table.
pub(crate) struct ObserverTable {
    slots: Vec<Vec<(ComponentId, SharedCallback)>>,
}

impl ObserverTable {
    pub(crate) fn new(parameter_count: usize) -> Self {
        Self {
            slots: (0..parameter_count).map(|_| Vec::new()).collect(),
        }
    }

    /// Add an observer. Returns false, leaving the table untouched, if the
    /// pair is already registered.
    pub(crate) fn register(&mut self, index: usize, component: ComponentId, callback: ObserverCallback) -> bool {
        let Some(slot) = self.slots.get_mut(index) else {
            return false;
        };
        if slot.iter().any(|(id, _)| *id == component) {
            return false;
        }
        slot.push((component, Arc::new(Mutex::new(callback))));
        true
    }

    /// Remove an observer. Returns false if it was not registered.
    pub(crate) fn unregister(&mut self, index: usize, component: ComponentId) -> bool {
        let Some(slot) = self.slots.get_mut(index) else {
            return false;
        };
        let before = slot.len();
        slot.retain(|(id, _)| *id != component);
        slot.len() != before
    }

    /// The observers of `index`, in registration order.
    pub(crate) fn observers(&self, index: usize) -> Vec<(ComponentId, SharedCallback)> {
        self.slots.get(index).map_or_else(Vec::new, |slot| {
            slot.iter().map(|(id, callback)| (*id, Arc::clone(callback))).collect()
        })
    }

    pub(crate) fn is_registered(&self, index: usize, component: ComponentId) -> bool {
        self.slots
            .get(index)
            .is_some_and(|slot| slot.iter().any(|(id, _)| *id == component))
    }

    pub(crate) fn observer_count(&self, index: usize) -> usize {
        self.slots.get(index).map_or(0, Vec::len)
    }
}
