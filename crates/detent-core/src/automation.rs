//! Host automation seam.
//!
//! The store reports user edits of automatable parameters to an
//! [`AutomationSink`]; a host wrapper implements it to forward begin/perform/
//! end edit calls. Properties never reach the sink.

use crate::types::{ParameterId, ParameterValue};

/// Receiver for automatable parameter edits.
///
/// Called from the non-real-time thread that made the edit.
pub trait AutomationSink: Send + Sync {
    /// A user gesture on `id` started.
    fn begin_gesture(&self, id: ParameterId);

    /// `id` now has this normalized value.
    fn perform_edit(&self, id: ParameterId, normalized: ParameterValue);

    /// A user gesture on `id` ended.
    fn end_gesture(&self, id: ParameterId);
}

/// Sink for stores that aren't attached to a host.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAutomation;

impl AutomationSink for NoAutomation {
    fn begin_gesture(&self, _id: ParameterId) {}

    fn perform_edit(&self, _id: ParameterId, _normalized: ParameterValue) {}

    fn end_gesture(&self, _id: ParameterId) {}
}
