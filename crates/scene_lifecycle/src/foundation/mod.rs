//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the crate:
//! - Identity keys and handle-based collections
//! - Frame time management
//! - Logging utilities

pub mod collections;
pub mod time;
pub mod logging;
