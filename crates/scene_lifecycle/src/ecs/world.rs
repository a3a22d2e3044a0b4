//! ECS World implementation

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use log::{debug, info};

use super::entity::Entity;
use crate::config::LifecycleConfig;
use crate::foundation::time::{GameClock, GameTime};
use crate::render::{GraphicsDevice, Surface};
use crate::schedule::{MembershipHooks, Scheduler, TraversalStats};

/// Binds each admitted entity as the owner of its component collection
#[derive(Debug, Default, Clone, Copy)]
pub struct WorldHooks;

impl MembershipHooks<dyn Entity> for WorldHooks {
    fn admitted(&self, entity: &Rc<dyn Entity>) {
        entity.components().bind(Rc::downgrade(entity));
        debug!("Entity '{}' joined the world", entity.name());
    }

    fn retired(&self, entity: &Rc<dyn Entity>) {
        entity.components().unbind();
        debug!("Entity '{}' left the world", entity.name());
    }
}

/// Scheduler holding a world's entities
pub type EntityCollection = Scheduler<dyn Entity, WorldHooks>;

/// Per-frame counters
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    /// Updates run so far
    pub frames: u64,
    /// Entities admitted after the last flush
    pub entity_count: usize,
    /// Entities updated in the last frame
    pub updated: usize,
    /// Inactive entities skipped in the last frame
    pub skipped: usize,
    /// Entities drawn in the last draw
    pub drawn: usize,
    /// Invisible entities skipped in the last draw
    pub hidden: usize,
}

/// Top-level container driving entities through update and draw
pub struct World {
    entities: EntityCollection,
    clock: RefCell<GameClock>,
    stats: Cell<FrameStats>,
    config: LifecycleConfig,
}

impl World {
    /// Create a world with default settings
    pub fn new() -> Self {
        Self::from_config(&LifecycleConfig::default())
    }

    /// Create a world from explicit settings
    pub fn from_config(config: &LifecycleConfig) -> Self {
        info!("Creating world '{}'", config.world_name);
        Self {
            entities: Scheduler::with_hooks(config.world_name.clone(), WorldHooks, &config.entities),
            clock: RefCell::new(GameClock::new()),
            stats: Cell::new(FrameStats::default()),
            config: config.clone(),
        }
    }

    /// Queue an entity for admission at the next update
    pub fn add(&self, entity: Rc<dyn Entity>) {
        self.entities.add(entity);
    }

    /// Queue several entities for admission
    pub fn add_all(&self, entities: &[Rc<dyn Entity>]) {
        self.entities.add_all(entities);
    }

    /// Queue every entity of a sequence for admission
    pub fn add_range<I>(&self, entities: I)
    where
        I: IntoIterator<Item = Rc<dyn Entity>>,
    {
        self.entities.add_range(entities);
    }

    /// Queue an entity for retirement at the next update
    pub fn remove(&self, entity: Rc<dyn Entity>) {
        self.entities.remove(entity);
    }

    /// Queue several entities for retirement
    pub fn remove_all(&self, entities: &[Rc<dyn Entity>]) {
        self.entities.remove_all(entities);
    }

    /// Queue every entity of a sequence for retirement
    pub fn remove_range<I>(&self, entities: I)
    where
        I: IntoIterator<Item = Rc<dyn Entity>>,
    {
        self.entities.remove_range(entities);
    }

    /// Run one update with a caller-supplied frame time
    pub fn update(&self, time: &GameTime) -> TraversalStats {
        let traversal = self.entities.update(time);
        let mut stats = self.stats.get();
        stats.frames += 1;
        stats.entity_count = self.entities.count();
        stats.updated = traversal.visited;
        stats.skipped = traversal.skipped;
        self.stats.set(stats);
        traversal
    }

    /// Advance the clock by wall-clock time and update
    pub fn tick(&self) -> GameTime {
        let time = self.clock.borrow_mut().tick();
        self.update(&time);
        time
    }

    /// Advance the clock by a fixed step and update
    pub fn step(&self, step: Duration) -> GameTime {
        let time = self.clock.borrow_mut().advance(step);
        self.update(&time);
        time
    }

    /// Draw visible entities in draw order
    pub fn draw(&self, surface: &mut dyn Surface, time: &GameTime) -> TraversalStats {
        let traversal = self.entities.draw(surface, time);
        let mut stats = self.stats.get();
        stats.drawn = traversal.visited;
        stats.hidden = traversal.skipped;
        self.stats.set(stats);
        traversal
    }

    /// Forward a device creation to every entity
    pub fn graphics_created(&self, device: &dyn GraphicsDevice) {
        info!("Graphics device '{}' created", device.name());
        self.entities.graphics_created(device);
    }

    /// Forward a device reset to every entity
    pub fn graphics_reset(&self, device: &dyn GraphicsDevice) {
        info!("Graphics device '{}' reset", device.name());
        self.entities.graphics_reset(device);
    }

    /// Entity collection, for queries and introspection
    pub fn entities(&self) -> &EntityCollection {
        &self.entities
    }

    /// Counters from the most recent update and draw
    pub fn stats(&self) -> FrameStats {
        self.stats.get()
    }

    /// Time of the most recent clock step
    pub fn time(&self) -> GameTime {
        self.clock.borrow().current()
    }

    /// Average frame rate since the world was created
    pub fn average_fps(&self) -> f32 {
        self.clock.borrow().average_fps()
    }

    /// Settings the world was built with
    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("name", &self.config.world_name)
            .field("entities", &self.entities)
            .field("stats", &self.stats.get())
            .finish_non_exhaustive()
    }
}
