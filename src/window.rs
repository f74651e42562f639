//! Overlay window manager seam
//!
//! The engine never composites anything itself. It asks the host to add,
//! move and remove a small set of floating surfaces through
//! [`OverlayWindowManager`]. [`HeadlessWindowManager`] is an in-memory host
//! used by the replay binary and the tests.

use std::collections::HashMap;

use serde::Serialize;
use tracing::trace;

use crate::error::WindowError;
use crate::geometry::Position;

/// Floating surfaces owned by one bubble session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    /// The draggable bubble together with its folding menu bar
    Bubble,
    /// The deletion drop-zone shown while dragging
    Trash,
}

/// Placement and behaviour of a surface when it is added
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowOptions {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Whether the surface receives pointer input
    pub touchable: bool,
}

pub trait OverlayWindowManager {
    fn add_window(&mut self, surface: Surface, options: WindowOptions) -> Result<(), WindowError>;

    fn remove_window(&mut self, surface: Surface) -> Result<(), WindowError>;

    fn update_window_position(&mut self, surface: Surface, x: i32, y: i32) -> Result<(), WindowError>;
}

/// A window operation as seen by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowOp {
    Add(Surface, WindowOptions),
    Remove(Surface),
    Move(Surface, Position),
}

/// Window manager without a display
///
/// Keeps the current geometry of every attached surface and a log of every
/// accepted operation. Calling [`revoke`](Self::revoke) makes every later
/// call fail with [`WindowError::BadToken`], the way a real host behaves
/// once overlay permission is withdrawn.
#[derive(Debug, Default)]
pub struct HeadlessWindowManager {
    windows: HashMap<Surface, WindowOptions>,
    ops: Vec<WindowOp>,
    revoked: bool,
}

impl HeadlessWindowManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revoke(&mut self) {
        self.revoked = true;
    }

    pub fn is_attached(&self, surface: Surface) -> bool {
        self.windows.contains_key(&surface)
    }

    pub fn geometry(&self, surface: Surface) -> Option<WindowOptions> {
        self.windows.get(&surface).copied()
    }

    pub fn ops(&self) -> &[WindowOp] {
        &self.ops
    }

    fn check_token(&self, surface: Surface) -> Result<(), WindowError> {
        if self.revoked {
            Err(WindowError::BadToken(surface))
        } else {
            Ok(())
        }
    }
}

impl OverlayWindowManager for HeadlessWindowManager {
    fn add_window(&mut self, surface: Surface, options: WindowOptions) -> Result<(), WindowError> {
        self.check_token(surface)?;
        trace!(?surface, ?options, "add window");
        self.windows.insert(surface, options);
        self.ops.push(WindowOp::Add(surface, options));
        Ok(())
    }

    fn remove_window(&mut self, surface: Surface) -> Result<(), WindowError> {
        // Removal is allowed after revocation so teardown can always finish
        if self.windows.remove(&surface).is_none() {
            return Err(WindowError::NotAttached(surface));
        }
        trace!(?surface, "remove window");
        self.ops.push(WindowOp::Remove(surface));
        Ok(())
    }

    fn update_window_position(&mut self, surface: Surface, x: i32, y: i32) -> Result<(), WindowError> {
        self.check_token(surface)?;
        let window = self
            .windows
            .get_mut(&surface)
            .ok_or(WindowError::NotAttached(surface))?;
        window.x = x;
        window.y = y;
        self.ops.push(WindowOp::Move(surface, Position::new(x, y)));
        Ok(())
    }
}
