//! Flick floating bubble
//!
//! Interaction engine for a draggable overlay bubble:
//! - Drag tracking with tap detection and smoothed release velocity
//! - Edge snapping with an optional inertial release
//! - A trash drop-zone shown while dragging
//! - A folding action menu mirrored by screen side
//!
//! The engine talks to its host only through [`OverlayWindowManager`] and
//! the [`Event`] queue drained from [`FloatingBubble`].

pub mod animation;
pub mod bubble;
pub mod config;
pub mod error;
pub mod event;
pub mod geometry;
pub mod input;
pub mod menu;
pub mod replay;
pub mod snap;
pub mod trash;
pub mod window;

pub use bubble::{DisplayMode, FloatingBubble};
pub use config::BubbleConfig;
pub use error::{BubbleError, ConfigError, WindowError};
pub use event::Event;
pub use window::{HeadlessWindowManager, OverlayWindowManager, Surface, WindowOptions};
