//! Specialized collection types and identity keys

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

pub use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// Handle returned when subscribing to a [`Signal`](crate::events::Signal)
    pub struct SubscriptionId;
}

/// Handle-based map keyed by subscription handles
pub type SubscriberMap<T> = SlotMap<SubscriptionId, T>;

/// Identity of a shared member, derived from its allocation address
///
/// Two `Rc` handles yield the same key iff they point at the same
/// allocation, whatever trait object they have been coerced to. A key is
/// only meaningful while some handle keeps the allocation alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberKey(usize);

impl MemberKey {
    /// Key for the allocation behind `member`
    pub fn of<T: ?Sized>(member: &Rc<T>) -> Self {
        Self(Rc::as_ptr(member).cast::<()>() as usize)
    }
}

static NEXT_OWNER_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies the collection a component is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerId(u64);

impl OwnerId {
    /// Allocate a process-unique owner id
    pub fn next() -> Self {
        Self(NEXT_OWNER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "owner#{}", self.0)
    }
}
