//! Entities
//!
//! An entity is always both schedulable and renderable. Its update first
//! runs its component collection, then its own logic; draw and the device
//! broadcasts follow the same pattern. Implementors only provide
//! [`Entity::core`] and whichever `on_*` hooks they need.

use std::fmt;
use std::rc::Rc;

use super::component::{Component, ComponentCollection};
use crate::config::{LifecycleConfig, SchedulerConfig};
use crate::foundation::time::GameTime;
use crate::render::{GraphicsDevice, Surface};
use crate::schedule::{AsAnyRc, Member, RenderState, Renderable, Schedulable, ScheduleState};

/// Conversions from a shared entity to the scheduler's view handles
///
/// Implemented for every sized [`Entity`]; never implement it by hand.
pub trait EntityUpcast {
    /// Handle for the update view
    fn upcast_schedulable(self: Rc<Self>) -> Rc<dyn Schedulable>;

    /// Handle for the draw view
    fn upcast_renderable(self: Rc<Self>) -> Rc<dyn Renderable>;
}

impl<T: Entity> EntityUpcast for T {
    fn upcast_schedulable(self: Rc<Self>) -> Rc<dyn Schedulable> {
        self
    }

    fn upcast_renderable(self: Rc<Self>) -> Rc<dyn Renderable> {
        self
    }
}

/// A game object living in a [`World`](super::World)
pub trait Entity: EntityUpcast + AsAnyRc {
    /// State shared by every entity
    fn core(&self) -> &EntityCore;

    /// Own per-frame logic, run after the components have updated
    fn on_update(&self, _time: &GameTime) {}

    /// Own drawing, run after the components have drawn
    fn on_draw(&self, _surface: &mut dyn Surface, _time: &GameTime) {}

    /// Device created, after the components were told
    fn on_graphics_created(&self, _device: &dyn GraphicsDevice) {}

    /// Device reset, after the components were told
    fn on_graphics_reset(&self, _device: &dyn GraphicsDevice) {}

    /// Name used in log output
    fn name(&self) -> &str {
        self.core().name()
    }

    /// Whether the entity updates
    fn is_active(&self) -> bool {
        self.core().schedule().is_active()
    }

    /// Enable or disable updates for the entity and its components
    fn set_active(&self, active: bool) {
        self.core().schedule().set_active(active);
    }

    /// Position among the world's entities in update traversal
    fn update_order(&self) -> i32 {
        self.core().schedule().update_order()
    }

    /// Move the entity in update traversal
    fn set_update_order(&self, update_order: i32) {
        self.core().schedule().set_update_order(update_order);
    }

    /// Whether the entity draws
    fn is_visible(&self) -> bool {
        self.core().render_state().is_visible()
    }

    /// Show or hide the entity and its components
    fn set_visible(&self, visible: bool) {
        self.core().render_state().set_visible(visible);
    }

    /// Position among the world's entities in draw traversal
    fn draw_order(&self) -> i32 {
        self.core().render_state().draw_order()
    }

    /// Move the entity in draw traversal
    fn set_draw_order(&self, draw_order: i32) {
        self.core().render_state().set_draw_order(draw_order);
    }

    /// The entity's component collection
    fn components(&self) -> &ComponentCollection {
        self.core().components()
    }

    /// Queue a component for attachment at the entity's next update
    fn add_component(&self, component: Rc<dyn Component>) {
        self.core().components().add(component);
    }

    /// Queue a component for detachment at the entity's next update
    fn remove_component(&self, component: Rc<dyn Component>) {
        self.core().components().remove(component);
    }
}

impl<T: Entity> Schedulable for T {
    fn schedule(&self) -> &ScheduleState {
        self.core().schedule()
    }

    fn update(&self, time: &GameTime) {
        self.core().components().update(time);
        self.on_update(time);
    }
}

impl<T: Entity> Renderable for T {
    fn render_state(&self) -> &RenderState {
        self.core().render_state()
    }

    fn draw(&self, surface: &mut dyn Surface, time: &GameTime) {
        self.core().components().draw(surface, time);
        self.on_draw(surface, time);
    }

    fn graphics_created(&self, device: &dyn GraphicsDevice) {
        self.core().components().graphics_created(device);
        self.on_graphics_created(device);
    }

    fn graphics_reset(&self, device: &dyn GraphicsDevice) {
        self.core().components().graphics_reset(device);
        self.on_graphics_reset(device);
    }
}

impl Member for dyn Entity {
    fn into_schedulable(self: Rc<Self>) -> Option<Rc<dyn Schedulable>> {
        Some(self.upcast_schedulable())
    }

    fn into_renderable(self: Rc<Self>) -> Option<Rc<dyn Renderable>> {
        Some(self.upcast_renderable())
    }
}

/// Name, scheduling state and components of an entity
pub struct EntityCore {
    name: String,
    schedule: ScheduleState,
    render: RenderState,
    components: ComponentCollection,
}

impl EntityCore {
    /// Active and visible, order 0, with default component settings
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, &LifecycleConfig::default().components)
    }

    /// Like [`EntityCore::new`] with explicit component collection settings
    pub fn with_config(name: impl Into<String>, config: &SchedulerConfig) -> Self {
        let name = name.into();
        let components = ComponentCollection::for_components(format!("{name}/components"), config);
        Self {
            name,
            schedule: ScheduleState::new(),
            render: RenderState::new(),
            components,
        }
    }

    /// Set the initial update order
    #[must_use]
    pub fn with_update_order(self, update_order: i32) -> Self {
        self.schedule.set_update_order(update_order);
        self
    }

    /// Set the initial draw order
    #[must_use]
    pub fn with_draw_order(self, draw_order: i32) -> Self {
        self.render.set_draw_order(draw_order);
        self
    }

    /// Entity name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Active flag and update order
    pub fn schedule(&self) -> &ScheduleState {
        &self.schedule
    }

    /// Visible flag and draw order
    pub fn render_state(&self) -> &RenderState {
        &self.render
    }

    /// Component collection
    pub fn components(&self) -> &ComponentCollection {
        &self.components
    }

    /// First attached component of type `T`
    pub fn get_component<T: Component>(&self) -> Option<Rc<T>> {
        self.components.first_of::<T>()
    }

    /// Every attached component of type `T`, in attachment order
    pub fn get_components<T: Component>(&self) -> Vec<Rc<T>> {
        self.components.find_all::<T>()
    }

    /// Number of attached components
    pub fn component_count(&self) -> usize {
        self.components.count()
    }
}

impl fmt::Debug for EntityCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityCore")
            .field("name", &self.name)
            .field("schedule", &self.schedule)
            .field("render", &self.render)
            .field("components", &self.components)
            .finish()
    }
}

/// Entity with no logic of its own, for objects made only of components
#[derive(Debug)]
pub struct BasicEntity {
    core: EntityCore,
}

impl BasicEntity {
    /// Shared handle to a new component-only entity
    pub fn new(name: impl Into<String>) -> Rc<Self> {
        Rc::new(Self { core: EntityCore::new(name) })
    }

    /// Shared handle to an entity built from an existing core
    pub fn from_core(core: EntityCore) -> Rc<Self> {
        Rc::new(Self { core })
    }
}

impl Entity for BasicEntity {
    fn core(&self) -> &EntityCore {
        &self.core
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::component::ComponentCore;
    use crate::render::NullSurface;
    use std::cell::RefCell;
    use std::time::Duration;

    type Journal = Rc<RefCell<Vec<String>>>;

    struct Crate {
        core: EntityCore,
        journal: Journal,
    }

    impl Entity for Crate {
        fn core(&self) -> &EntityCore {
            &self.core
        }

        fn on_update(&self, _time: &GameTime) {
            self.journal.borrow_mut().push(format!("update:{}", self.name()));
        }

        fn on_draw(&self, _surface: &mut dyn Surface, _time: &GameTime) {
            self.journal.borrow_mut().push(format!("draw:{}", self.name()));
        }
    }

    struct Label {
        core: ComponentCore,
        render: RenderState,
        journal: Journal,
    }

    impl Component for Label {
        fn core(&self) -> &ComponentCore {
            &self.core
        }

        fn renderable(self: Rc<Self>) -> Option<Rc<dyn Renderable>> {
            Some(self)
        }
    }

    impl Renderable for Label {
        fn render_state(&self) -> &RenderState {
            &self.render
        }

        fn draw(&self, _surface: &mut dyn Surface, _time: &GameTime) {
            self.journal.borrow_mut().push("draw:label".to_string());
        }
    }

    fn frame() -> GameTime {
        GameTime::fixed(Duration::from_millis(16), 1)
    }

    #[test]
    fn test_entity_is_both_schedulable_and_renderable() {
        let journal = Journal::default();
        let entity: Rc<dyn Entity> = Rc::new(Crate {
            core: EntityCore::new("crate").with_update_order(3).with_draw_order(7),
            journal,
        });

        let schedulable = Rc::clone(&entity).into_schedulable().unwrap();
        let renderable = Rc::clone(&entity).into_renderable().unwrap();
        assert_eq!(schedulable.schedule().update_order(), 3);
        assert_eq!(renderable.render_state().draw_order(), 7);
        assert_eq!(entity.name(), "crate");
    }

    #[test]
    fn test_components_draw_before_entity() {
        let journal = Journal::default();
        let entity = Rc::new(Crate {
            core: EntityCore::new("crate"),
            journal: Rc::clone(&journal),
        });
        let label = Rc::new(Label {
            core: ComponentCore::new(),
            render: RenderState::new(),
            journal: Rc::clone(&journal),
        });
        entity.add_component(label);

        entity.update(&frame());
        entity.draw(&mut NullSurface, &frame());
        assert_eq!(*journal.borrow(), vec!["update:crate", "draw:label", "draw:crate"]);
        assert_eq!(entity.core().component_count(), 1);
        assert!(entity.core().get_component::<Label>().is_some());
        assert_eq!(entity.core().get_components::<Label>().len(), 1);
    }

    #[test]
    fn test_entity_setters_reach_core_state() {
        let entity = Crate {
            core: EntityCore::new("crate"),
            journal: Journal::default(),
        };
        entity.set_active(false);
        entity.set_visible(false);
        entity.set_update_order(-2);
        entity.set_draw_order(4);

        assert!(!entity.is_active());
        assert!(!entity.is_visible());
        assert_eq!(entity.core().schedule().update_order(), -2);
        assert_eq!(entity.draw_order(), 4);
        assert_eq!(entity.update_order(), -2);
    }
}
