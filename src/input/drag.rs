//! Press / drag / release tracking for the bubble
//!
//! One [`DragSession`] lives from pointer-down to pointer-up. It stays a
//! potential tap until the pointer travels past the touch slop, after which
//! the widget follows the pointer 1:1 and a smoothed release velocity is
//! kept for the inertial snap.

use std::time::Instant;

use tracing::{trace, warn};

use crate::geometry::{Position, Vector2};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Move,
    Up,
    Cancel,
}

/// Pointer sample in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub x: f64,
    pub y: f64,
    pub time: Instant,
}

impl PointerEvent {
    pub fn new(kind: PointerKind, x: f64, y: f64, time: Instant) -> Self {
        Self { kind, x, y, time }
    }
}

/// State of one press gesture
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub start_touch: Vector2,
    pub start_widget: Position,
    pub last_touch: Vector2,
    pub last_time: Instant,
    /// Exponentially smoothed pointer velocity (px/s)
    pub velocity: Vector2,
    pub is_dragging: bool,
    /// Widget position implied by the pointer
    pub position: Position,
}

impl DragSession {
    fn new(x: f64, y: f64, widget: Position, now: Instant) -> Self {
        let touch = Vector2::new(x, y);
        Self {
            start_touch: touch,
            start_widget: widget,
            last_touch: touch,
            last_time: now,
            velocity: Vector2::ZERO,
            is_dragging: false,
            position: widget,
        }
    }

    pub fn displacement(&self) -> Vector2 {
        Vector2::new(
            self.last_touch.x - self.start_touch.x,
            self.last_touch.y - self.start_touch.y,
        )
    }

    fn sample(&mut self, x: f64, y: f64, now: Instant, smoothing: f64) {
        let dt = now.saturating_duration_since(self.last_time).as_secs_f64();
        if dt > 0.001 {
            let instant = Vector2::new((x - self.last_touch.x) / dt, (y - self.last_touch.y) / dt);
            self.velocity = Vector2::new(
                smoothing * instant.x + (1.0 - smoothing) * self.velocity.x,
                smoothing * instant.y + (1.0 - smoothing) * self.velocity.y,
            );
        }
        self.last_touch = Vector2::new(x, y);
        self.last_time = now;
    }

    fn follow_pointer(&mut self) {
        let d = self.displacement();
        self.position = self.start_widget.offset(d.x.round() as i32, d.y.round() as i32);
    }
}

/// Result of a pointer move inside a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMove {
    /// Still within the touch slop, or dragging is not allowed right now
    Pending,
    /// First move past the slop
    Started(Position),
    Moved(Position),
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Release {
    Tap,
    Drop { position: Position, velocity: Vector2 },
}

#[derive(Debug)]
pub struct DragController {
    session: Option<DragSession>,
    touch_slop: f64,
    smoothing: f64,
}

impl DragController {
    pub fn new(touch_slop: f64, smoothing: f64) -> Self {
        Self {
            session: None,
            touch_slop,
            smoothing: smoothing.clamp(0.0, 1.0),
        }
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_dragging)
    }

    /// Open a session. A second press while one is alive is ignored.
    pub fn touch_down(&mut self, x: f64, y: f64, widget: Position, now: Instant) -> bool {
        if self.session.is_some() {
            warn!("pointer down while a drag session is alive, ignoring");
            return false;
        }
        trace!(x, y, ?widget, "drag session opened");
        self.session = Some(DragSession::new(x, y, widget, now));
        true
    }

    /// `None` when no session is alive
    pub fn touch_move(&mut self, x: f64, y: f64, now: Instant, drag_allowed: bool) -> Option<DragMove> {
        let smoothing = self.smoothing;
        let slop = self.touch_slop;
        let session = self.session.as_mut()?;
        session.sample(x, y, now, smoothing);

        if !session.is_dragging {
            if !drag_allowed || session.displacement().length() <= slop {
                return Some(DragMove::Pending);
            }
            session.is_dragging = true;
            session.follow_pointer();
            return Some(DragMove::Started(session.position));
        }

        session.follow_pointer();
        Some(DragMove::Moved(session.position))
    }

    /// Close the session. `None` when no session was alive.
    pub fn touch_up(&mut self, x: f64, y: f64, now: Instant) -> Option<Release> {
        let Some(mut session) = self.session.take() else {
            warn!("pointer up without a drag session, ignoring");
            return None;
        };
        if !session.is_dragging {
            return Some(Release::Tap);
        }
        session.sample(x, y, now, self.smoothing);
        session.follow_pointer();
        Some(Release::Drop {
            position: session.position,
            velocity: session.velocity,
        })
    }

    /// Drop the session without a release
    pub fn cancel(&mut self) -> Option<DragSession> {
        self.session.take()
    }
}
