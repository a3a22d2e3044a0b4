//! Scheduling errors

use log::error;

use crate::foundation::collections::OwnerId;

/// Errors raised by scheduler operations
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// A component is attached to another collection
    #[error("member is attached to {current} and cannot join {requested}")]
    AlreadyAttached {
        /// Collection the member is attached to
        current: OwnerId,
        /// Collection that asked to admit it
        requested: OwnerId,
    },

    /// A scheduler was flushed or traversed from inside its own traversal
    #[error("scheduler `{0}` re-entered while traversing its members")]
    Reentrant(String),
}

/// Report a broken caller precondition
///
/// Panics in debug builds. Release builds log the violation and the caller
/// drops the offending request without touching live state.
pub(crate) fn precondition_failed(err: &SchedulerError) {
    if cfg!(debug_assertions) {
        panic!("precondition violated: {err}");
    }
    error!("precondition violated: {err}; request ignored");
}
