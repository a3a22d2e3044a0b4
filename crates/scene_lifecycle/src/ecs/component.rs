//! Components and the per-entity component collection
//!
//! A component is attached to at most one collection at a time. The
//! collection records itself as the component's owner when it admits the
//! component and clears the record when it retires it; while the owning
//! entity is in a world, the component can also reach that entity.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use log::trace;

use super::entity::Entity;
use crate::config::SchedulerConfig;
use crate::foundation::collections::OwnerId;
use crate::schedule::{AsAnyRc, Member, MembershipHooks, Renderable, Schedulable, Scheduler, SchedulerError};

/// Something attached to an entity
///
/// Components opt into update and draw traversal by overriding
/// [`Component::schedulable`] / [`Component::renderable`] to return
/// `Some(self)`. A component with neither is inert but still queryable
/// through the entity's collection.
pub trait Component: AsAnyRc {
    /// Attachment bookkeeping
    fn core(&self) -> &ComponentCore;

    /// Update-view handle, if this component updates
    fn schedulable(self: Rc<Self>) -> Option<Rc<dyn Schedulable>> {
        None
    }

    /// Draw-view handle, if this component draws
    fn renderable(self: Rc<Self>) -> Option<Rc<dyn Renderable>> {
        None
    }

    /// Entity this component is attached to, if it is reachable
    fn entity(&self) -> Option<Rc<dyn Entity>> {
        self.core().entity()
    }
}

impl Member for dyn Component {
    fn into_schedulable(self: Rc<Self>) -> Option<Rc<dyn Schedulable>> {
        self.schedulable()
    }

    fn into_renderable(self: Rc<Self>) -> Option<Rc<dyn Renderable>> {
        self.renderable()
    }
}

struct OwnerLink {
    owner: OwnerId,
    entity: Option<Weak<dyn Entity>>,
}

/// Back-reference from a component to the collection and entity holding it
#[derive(Default)]
pub struct ComponentCore {
    link: RefCell<Option<OwnerLink>>,
}

impl ComponentCore {
    /// Unattached
    pub fn new() -> Self {
        Self::default()
    }

    /// Collection currently holding this component
    pub fn owner(&self) -> Option<OwnerId> {
        self.link.borrow().as_ref().map(|link| link.owner)
    }

    /// Owning entity, if attached and the entity is still alive
    pub fn entity(&self) -> Option<Rc<dyn Entity>> {
        self.link.borrow().as_ref()?.entity.as_ref()?.upgrade()
    }

    /// Whether some collection has admitted this component
    pub fn is_attached(&self) -> bool {
        self.link.borrow().is_some()
    }

    pub(crate) fn attach(&self, owner: OwnerId, entity: Option<Weak<dyn Entity>>) {
        *self.link.borrow_mut() = Some(OwnerLink { owner, entity });
    }

    /// Clear the link, but only if `owner` still holds it
    pub(crate) fn detach(&self, owner: OwnerId) {
        let mut link = self.link.borrow_mut();
        if link.as_ref().is_some_and(|current| current.owner == owner) {
            *link = None;
        }
    }
}

impl fmt::Debug for ComponentCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentCore")
            .field("owner", &self.owner())
            .field("entity_alive", &self.entity().is_some())
            .finish()
    }
}

/// Membership hooks that keep component back-references in sync
pub struct ComponentHooks {
    owner: OwnerId,
    entity: RefCell<Option<Weak<dyn Entity>>>,
}

impl ComponentHooks {
    fn new() -> Self {
        Self {
            owner: OwnerId::next(),
            entity: RefCell::new(None),
        }
    }

    /// Identity stamped on admitted components
    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Whether the collection is currently bound to a live entity
    pub fn is_bound(&self) -> bool {
        self.entity
            .borrow()
            .as_ref()
            .is_some_and(|entity| entity.strong_count() > 0)
    }
}

impl MembershipHooks<dyn Component> for ComponentHooks {
    fn admissible(&self, member: &Rc<dyn Component>) -> Result<(), SchedulerError> {
        match member.core().owner() {
            Some(current) if current != self.owner => Err(SchedulerError::AlreadyAttached {
                current,
                requested: self.owner,
            }),
            _ => Ok(()),
        }
    }

    fn admitted(&self, member: &Rc<dyn Component>) {
        member.core().attach(self.owner, self.entity.borrow().clone());
    }

    fn retired(&self, member: &Rc<dyn Component>) {
        member.core().detach(self.owner);
    }
}

impl fmt::Debug for ComponentHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentHooks")
            .field("owner", &self.owner)
            .field("bound", &self.is_bound())
            .finish()
    }
}

/// The component scheduler every entity owns
pub type ComponentCollection = Scheduler<dyn Component, ComponentHooks>;

impl Scheduler<dyn Component, ComponentHooks> {
    /// Empty component collection with a fresh owner id
    pub fn for_components(label: impl Into<String>, config: &SchedulerConfig) -> Self {
        Self::with_hooks(label, ComponentHooks::new(), config)
    }

    /// Point admitted and future components at `entity`
    pub(crate) fn bind(&self, entity: Weak<dyn Entity>) {
        let owner = self.hooks().owner();
        for component in self.to_vec() {
            component.core().attach(owner, Some(Weak::clone(&entity)));
        }
        *self.hooks().entity.borrow_mut() = Some(entity);
        trace!("[{}] bound to entity", self.label());
    }

    /// Drop the entity link, keeping the components attached to this collection
    pub(crate) fn unbind(&self) {
        let owner = self.hooks().owner();
        *self.hooks().entity.borrow_mut() = None;
        for component in self.to_vec() {
            component.core().attach(owner, None);
        }
        trace!("[{}] unbound from entity", self.label());
    }
}
