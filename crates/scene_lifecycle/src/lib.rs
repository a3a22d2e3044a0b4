//! # Scene Lifecycle
//!
//! Per-frame lifecycle scheduling for entities and the components attached
//! to them.
//!
//! ## Features
//!
//! - **Deferred mutation**: members added or removed during a frame join or
//!   leave at the start of the next update
//! - **Ordered traversal**: independent update and draw orders, re-sorted
//!   only when an order value changed
//! - **Activity gating**: inactive or invisible members are skipped without
//!   losing their membership
//! - **Typed queries**: count and find members by concrete type
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::rc::Rc;
//! use std::time::Duration;
//! use scene_lifecycle::prelude::*;
//!
//! struct Ship {
//!     core: EntityCore,
//! }
//!
//! impl Entity for Ship {
//!     fn core(&self) -> &EntityCore {
//!         &self.core
//!     }
//!
//!     fn on_update(&self, time: &GameTime) {
//!         log::info!("{} updated after {:?}", self.name(), time.elapsed());
//!     }
//! }
//!
//! let world = World::new();
//! world.add(Rc::new(Ship { core: EntityCore::new("ship") }));
//!
//! let time = world.step(Duration::from_millis(16));
//! world.draw(&mut NullSurface, &time);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names)]

pub mod config;
pub mod ecs;
pub mod events;
pub mod foundation;
pub mod render;
pub mod schedule;

/// Common imports for library users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, LifecycleConfig, SchedulerConfig},
        ecs::{BasicEntity, Component, ComponentCore, Entity, EntityCore, FrameStats, World},
        events::{Change, Signal},
        foundation::time::{GameClock, GameTime},
        render::{GraphicsDevice, HeadlessDevice, NullSurface, Surface},
        schedule::{
            Capabilities, Member, RenderState, Renderable, Schedulable, ScheduleState, Scheduler,
            SchedulerError, TraversalStats,
        },
    };
}
