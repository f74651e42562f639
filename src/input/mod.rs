//! Input handling - pointer tracking for the bubble
//!
//! This module provides:
//! - Drag session tracking (tap vs drag, smoothed release velocity)

mod drag;

pub use drag::*;
