//! Lazily sorted member views

use std::cell::Cell;
use std::rc::{Rc, Weak};

use crate::foundation::collections::MemberKey;

struct ViewEntry<T: ?Sized> {
    key: MemberKey,
    target: Rc<T>,
}

/// Dense sequence of members kept in ascending order-value order
///
/// The view is only re-sorted when its dirty flag is set. Admission sets the
/// flag; so do order-change subscriptions through a [`DirtyMarker`].
/// Removal keeps the relative order of the remaining entries and leaves the
/// flag alone.
pub(crate) struct OrderedView<T: ?Sized> {
    entries: Vec<ViewEntry<T>>,
    dirty: Rc<Cell<bool>>,
}

/// Handle that order-change subscriptions use to dirty a view
///
/// Holds the flag weakly, so a subscription outliving its scheduler is inert.
#[derive(Clone)]
pub(crate) struct DirtyMarker(Weak<Cell<bool>>);

impl DirtyMarker {
    pub(crate) fn mark(&self) {
        if let Some(flag) = self.0.upgrade() {
            flag.set(true);
        }
    }
}

impl<T: ?Sized> OrderedView<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            dirty: Rc::new(Cell::new(false)),
        }
    }

    pub(crate) fn marker(&self) -> DirtyMarker {
        DirtyMarker(Rc::downgrade(&self.dirty))
    }

    /// Append at the end and mark the view for sorting
    pub(crate) fn insert(&mut self, key: MemberKey, target: Rc<T>) {
        self.entries.push(ViewEntry { key, target });
        self.dirty.set(true);
    }

    pub(crate) fn remove(&mut self, key: MemberKey) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.key != key);
        self.entries.len() != before
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Stable sort by `order` if dirty; returns whether a sort happened
    ///
    /// Entries with equal order values keep their current relative order.
    pub(crate) fn sort_if_dirty(&mut self, order: impl Fn(&T) -> i32) -> bool {
        if !self.dirty.get() {
            return false;
        }
        self.entries.sort_by_key(|entry| order(entry.target.as_ref()));
        self.dirty.set(false);
        true
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Rc<T>> + '_ {
        self.entries.iter().map(|entry| &entry.target)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
