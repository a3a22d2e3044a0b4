//! Member capabilities and the state the scheduler reads from members
//!
//! A member is classified once, when it is admitted: [`Member::into_schedulable`]
//! and [`Member::into_renderable`] hand back the trait objects the update and
//! draw views store. Traversal afterwards never inspects the member's type.

use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

use bitflags::bitflags;

use crate::events::{Change, Signal};
use crate::foundation::time::GameTime;
use crate::render::{GraphicsDevice, Surface};

bitflags! {
    /// Views a member was routed into at admission
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u8 {
        /// Member takes part in update traversal
        const SCHEDULABLE = 1 << 0;
        /// Member takes part in draw traversal and device broadcasts
        const RENDERABLE = 1 << 1;
    }
}

/// Active flag and update order, with their change notifications
#[derive(Debug)]
pub struct ScheduleState {
    active: Cell<bool>,
    update_order: Cell<i32>,
    active_changed: Signal<Change<bool>>,
    update_order_changed: Signal<Change<i32>>,
}

impl ScheduleState {
    /// Active, with update order 0
    pub fn new() -> Self {
        Self::with_order(0)
    }

    /// Active, with the given update order
    pub fn with_order(update_order: i32) -> Self {
        Self {
            active: Cell::new(true),
            update_order: Cell::new(update_order),
            active_changed: Signal::new(),
            update_order_changed: Signal::new(),
        }
    }

    /// Whether update callbacks should run
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Set the active flag, notifying observers if it changed
    pub fn set_active(&self, active: bool) {
        let previous = self.active.replace(active);
        if previous != active {
            self.active_changed.emit(&Change { previous, current: active });
        }
    }

    /// Position in update traversal; lower runs first
    pub fn update_order(&self) -> i32 {
        self.update_order.get()
    }

    /// Set the update order, notifying observers if it changed
    pub fn set_update_order(&self, update_order: i32) {
        let previous = self.update_order.replace(update_order);
        if previous != update_order {
            self.update_order_changed.emit(&Change { previous, current: update_order });
        }
    }

    /// Fired when the active flag changes
    pub fn active_changed(&self) -> &Signal<Change<bool>> {
        &self.active_changed
    }

    /// Fired when the update order changes
    pub fn update_order_changed(&self) -> &Signal<Change<i32>> {
        &self.update_order_changed
    }
}

impl Default for ScheduleState {
    fn default() -> Self {
        Self::new()
    }
}

/// Visible flag and draw order, with their change notifications
#[derive(Debug)]
pub struct RenderState {
    visible: Cell<bool>,
    draw_order: Cell<i32>,
    visible_changed: Signal<Change<bool>>,
    draw_order_changed: Signal<Change<i32>>,
}

impl RenderState {
    /// Visible, with draw order 0
    pub fn new() -> Self {
        Self::with_order(0)
    }

    /// Visible, with the given draw order
    pub fn with_order(draw_order: i32) -> Self {
        Self {
            visible: Cell::new(true),
            draw_order: Cell::new(draw_order),
            visible_changed: Signal::new(),
            draw_order_changed: Signal::new(),
        }
    }

    /// Whether draw callbacks should run
    pub fn is_visible(&self) -> bool {
        self.visible.get()
    }

    /// Set the visible flag, notifying observers if it changed
    pub fn set_visible(&self, visible: bool) {
        let previous = self.visible.replace(visible);
        if previous != visible {
            self.visible_changed.emit(&Change { previous, current: visible });
        }
    }

    /// Position in draw traversal; lower draws first
    pub fn draw_order(&self) -> i32 {
        self.draw_order.get()
    }

    /// Set the draw order, notifying observers if it changed
    pub fn set_draw_order(&self, draw_order: i32) {
        let previous = self.draw_order.replace(draw_order);
        if previous != draw_order {
            self.draw_order_changed.emit(&Change { previous, current: draw_order });
        }
    }

    /// Fired when the visible flag changes
    pub fn visible_changed(&self) -> &Signal<Change<bool>> {
        &self.visible_changed
    }

    /// Fired when the draw order changes
    pub fn draw_order_changed(&self) -> &Signal<Change<i32>> {
        &self.draw_order_changed
    }
}

impl Default for RenderState {
    fn default() -> Self {
        Self::new()
    }
}

/// Something that runs once per frame in update order
pub trait Schedulable {
    /// Active flag and update order
    fn schedule(&self) -> &ScheduleState;

    /// Per-frame logic; only called while active
    fn update(&self, time: &GameTime);
}

/// Something that draws once per frame in draw order
pub trait Renderable {
    /// Visible flag and draw order
    fn render_state(&self) -> &RenderState;

    /// Per-frame drawing; only called while visible
    fn draw(&self, surface: &mut dyn Surface, time: &GameTime);

    /// The graphics device was created
    fn graphics_created(&self, _device: &dyn GraphicsDevice) {}

    /// The graphics device was reset and device resources must be rebuilt
    fn graphics_reset(&self, _device: &dyn GraphicsDevice) {}
}

/// `Any` access through `Rc`, used by the typed queries
pub trait AsAnyRc: Any {
    /// Borrow as `Any`
    fn as_any(&self) -> &dyn Any;

    /// Convert a shared handle into an `Rc<dyn Any>` for downcasting
    fn into_any_rc(self: Rc<Self>) -> Rc<dyn Any>;
}

impl<T: Any> AsAnyRc for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any_rc(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

/// An object a scheduler can hold
///
/// Implementations return `Some(self)` for each capability they have. A
/// member with neither capability is still counted and queryable, it just
/// never appears in a view.
pub trait Member: AsAnyRc {
    /// Update-view handle, if this member updates
    fn into_schedulable(self: Rc<Self>) -> Option<Rc<dyn Schedulable>> {
        None
    }

    /// Draw-view handle, if this member draws
    fn into_renderable(self: Rc<Self>) -> Option<Rc<dyn Renderable>> {
        None
    }
}
