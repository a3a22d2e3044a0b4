//! Frame scenarios spanning the world, entities and components
