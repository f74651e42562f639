//! Trash drop-zone
//!
//! Shown only while the bubble is being dragged. Dropping the bubble on it
//! deletes the bubble. While the two overlap the bubble is pulled onto the
//! trash centre so the drop point is unambiguous. A disabled target is never
//! shown and never hit.

use tracing::{debug, trace};

use crate::config::TrashConfig;
use crate::error::WindowError;
use crate::geometry::{Position, Rect, ScreenMetrics};
use crate::window::{OverlayWindowManager, Surface, WindowOptions};

#[derive(Debug)]
pub struct TrashTarget {
    rect: Rect,
    enabled: bool,
    visible: bool,
    hovering: bool,
}

impl TrashTarget {
    /// Bottom-centre target sized in dp
    pub fn new(metrics: &ScreenMetrics, config: &TrashConfig) -> Self {
        let size = metrics.dp(config.size_dp);
        let margin = metrics.dp(config.bottom_margin_dp);
        let x = (metrics.width - size) / 2;
        let y = metrics.height - margin - size;
        Self {
            rect: Rect::new(x, y, size, size),
            enabled: config.enabled,
            visible: false,
            hovering: false,
        }
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Takes effect from the next show. Hiding a visible target is up to the caller.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.hovering = false;
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_hovering(&self) -> bool {
        self.hovering
    }

    pub fn show<W: OverlayWindowManager>(&mut self, window: &mut W) -> Result<(), WindowError> {
        if self.visible || !self.enabled {
            return Ok(());
        }
        window.add_window(
            Surface::Trash,
            WindowOptions {
                x: self.rect.x,
                y: self.rect.y,
                width: self.rect.width,
                height: self.rect.height,
                touchable: false,
            },
        )?;
        self.visible = true;
        debug!(rect = ?self.rect, "trash shown");
        Ok(())
    }

    /// Remove the target. Hidden state is recorded even if the host fails.
    pub fn hide<W: OverlayWindowManager>(&mut self, window: &mut W) -> Result<(), WindowError> {
        if !self.visible {
            return Ok(());
        }
        self.visible = false;
        self.hovering = false;
        debug!("trash hidden");
        match window.remove_window(Surface::Trash) {
            Err(WindowError::NotAttached(_)) => Ok(()),
            other => other,
        }
    }

    /// Whether a bubble occupying `bubble` would be deleted if released now
    pub fn hit_test(&self, bubble: &Rect) -> bool {
        self.enabled && self.visible && self.rect.intersects(bubble)
    }

    /// Track overlap; `Some(entered)` when it changes
    pub fn update_hover(&mut self, bubble: &Rect) -> Option<bool> {
        let hovering = self.hit_test(bubble);
        if hovering == self.hovering {
            return None;
        }
        self.hovering = hovering;
        trace!(hovering, "trash hover changed");
        Some(hovering)
    }

    /// Top-left that centres a bubble of the given size on the target
    pub fn magnet_position(&self, width: i32, height: i32) -> Position {
        let (cx, cy) = self.rect.center();
        Position::new(cx - width / 2, cy - height / 2)
    }
}
