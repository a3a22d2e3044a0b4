//! Pending mutation sets

use std::collections::HashSet;
use std::rc::Rc;

use crate::foundation::collections::MemberKey;

/// Insertion-ordered set of members awaiting the next flush
///
/// Requests for the same member collapse into one entry; the first request
/// fixes its position.
pub(crate) struct PendingSet<M: ?Sized> {
    order: Vec<Rc<M>>,
    keys: HashSet<MemberKey>,
}

impl<M: ?Sized> PendingSet<M> {
    pub(crate) fn new() -> Self {
        Self {
            order: Vec::new(),
            keys: HashSet::new(),
        }
    }

    /// Queue a member; false if it was already queued
    pub(crate) fn insert(&mut self, member: Rc<M>) -> bool {
        if self.keys.insert(MemberKey::of(&member)) {
            self.order.push(member);
            true
        } else {
            false
        }
    }

    pub(crate) fn contains(&self, member: &Rc<M>) -> bool {
        self.keys.contains(&MemberKey::of(member))
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    /// Empty the set, returning its members in request order
    pub(crate) fn take(&mut self) -> Vec<Rc<M>> {
        self.keys.clear();
        std::mem::take(&mut self.order)
    }
}
