//! Graphics seams used by draw traversal
//!
//! The scheduler never renders anything itself. Hosts hand a [`Surface`] to
//! `draw` and a [`GraphicsDevice`] to the device lifecycle broadcasts;
//! members downcast them to the concrete renderer types they expect.

use std::any::Any;

/// Target passed to every draw callback
pub trait Surface {
    /// Downcast access to the concrete surface
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Device passed to the graphics created/reset broadcasts
pub trait GraphicsDevice {
    /// Human-readable device name for logging
    fn name(&self) -> &str;

    /// Downcast access to the concrete device
    fn as_any(&self) -> &dyn Any;
}

/// Surface that discards everything, for headless runs
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSurface;

impl Surface for NullSurface {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Device stand-in for headless runs and tests
#[derive(Debug, Clone)]
pub struct HeadlessDevice {
    name: String,
}

impl HeadlessDevice {
    /// Create a headless device with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new("headless")
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
