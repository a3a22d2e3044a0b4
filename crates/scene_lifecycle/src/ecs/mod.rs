//! Entities, components and the world that drives them
//!
//! The world holds its entities in a [`Scheduler`](crate::schedule::Scheduler);
//! every entity holds its components in another. Updating the world updates
//! each active entity, which first updates its own components.

pub mod component;
pub mod entity;
pub mod world;

#[cfg(test)]
mod tests;

pub use component::{Component, ComponentCollection, ComponentCore, ComponentHooks};
pub use entity::{BasicEntity, Entity, EntityCore, EntityUpcast};
pub use world::{EntityCollection, FrameStats, World, WorldHooks};
