//! Floating bubble session
//!
//! [`FloatingBubble`] owns one overlay session, driving the bubble surface and
//! its trash drop-zone through a single [`OverlayWindowManager`]. The host
//! feeds it pointer events and frame ticks on one thread and drains the
//! resulting [`Event`]s after each call.
//!
//! A rejected window token is fatal. The session tears itself down and queues
//! [`Event::OverlayMustStop`]; every later call is ignored.
//!
//! While the [`DisplayMode`] is `HideAlways` the bubble window is removed and
//! input and frames are dropped, but the session stays alive.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::BubbleConfig;
use crate::error::{BubbleError, WindowError};
use crate::event::Event;
use crate::geometry::{Position, Rect, RestBounds, SafeArea, ScreenMetrics, Vector2};
use crate::input::{DragController, DragMove, PointerEvent, PointerKind, Release};
use crate::menu::{FoldState, FoldTiming, FoldingMenu, MenuVisuals};
use crate::snap::{EdgeSnapResolver, Snap, SnapMotion};
use crate::trash::TrashTarget;
use crate::window::{OverlayWindowManager, Surface, WindowOptions};

/// Whether the bubble surface is on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    #[default]
    ShowAlways,
    /// Window removed; input and frames are ignored until shown again
    HideAlways,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Attached,
    /// Dropped on the trash
    Deleted,
    /// Permission lost or torn down by the host
    Stopped,
}

pub struct FloatingBubble<W: OverlayWindowManager> {
    window: W,
    metrics: ScreenMetrics,
    size: i32,
    position: Position,
    drag: DragController,
    resolver: EdgeSnapResolver,
    motion: Option<SnapMotion>,
    /// A pointer down stopped a snap before it reached the edge
    interrupted_settle: bool,
    display_mode: DisplayMode,
    trash: TrashTarget,
    menu: FoldingMenu,
    events: Vec<Event>,
    lifecycle: Lifecycle,
}

impl<W: OverlayWindowManager> FloatingBubble<W> {
    /// Add the bubble surface and move it onto its first resting edge
    pub fn attach(
        mut window: W,
        metrics: ScreenMetrics,
        safe_area: SafeArea,
        config: &BubbleConfig,
        now: Instant,
    ) -> Result<Self, BubbleError> {
        let size = metrics.dp(config.bubble_size_dp);
        let bounds = RestBounds::new(&metrics, &safe_area, size, size);
        if config.use_physics {
            config.physics.validate()?;
        }
        let physics = config.use_physics.then_some(config.physics);
        let resolver = EdgeSnapResolver::new(
            bounds,
            metrics.width,
            config.move_direction,
            config.physics.fling_speed,
            physics,
        );
        let hidden = config.display_mode == DisplayMode::HideAlways;

        let timing = FoldTiming {
            duration: config.menu.animation_duration(),
            start_delay: config.menu.start_delay(),
        };
        let menu = FoldingMenu::new(
            config.menu.menu_items()?,
            timing,
            size,
            metrics.dp(config.menu.item_size_dp),
            config.menu.margin,
        );

        let start = bounds.clamp(Position::new(
            config.initial.x.unwrap_or(metrics.width),
            (metrics.height as f64 * config.initial.y_fraction).round() as i32,
        ));
        let snap = if config.animate_initial_move && !hidden {
            resolver.settle_from(start, now)
        } else {
            Snap::Immediate(resolver.resting_position(start, Vector2::ZERO))
        };
        let position = match snap {
            Snap::Immediate(rest) => rest,
            Snap::Motion(_) => start,
        };

        if !hidden {
            window.add_window(Surface::Bubble, Self::window_options(position, size))?;
        }
        info!(?position, size, physics = resolver.uses_physics(), hidden, "bubble attached");

        Ok(Self {
            window,
            trash: TrashTarget::new(&metrics, &config.trash),
            drag: DragController::new(config.touch_slop_dp * metrics.density, config.velocity_smoothing),
            metrics,
            size,
            position,
            resolver,
            motion: match snap {
                Snap::Motion(motion) => Some(motion),
                Snap::Immediate(_) => None,
            },
            interrupted_settle: false,
            display_mode: config.display_mode,
            menu,
            events: vec![Event::PositionChanged { x: position.x, y: position.y }],
            lifecycle: Lifecycle::Attached,
        })
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn bounds(&self) -> &RestBounds {
        self.resolver.bounds()
    }

    pub fn fold_state(&self) -> FoldState {
        self.menu.state()
    }

    pub fn menu(&self) -> &FoldingMenu {
        &self.menu
    }

    pub fn menu_visuals(&self, now: Instant) -> MenuVisuals {
        self.menu.visuals(now)
    }

    pub fn trash(&self) -> &TrashTarget {
        &self.trash
    }

    pub fn trash_visible(&self) -> bool {
        self.trash.is_visible()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    /// A snap or settle animation is running
    pub fn is_settling(&self) -> bool {
        self.motion.is_some()
    }

    pub fn is_stopped(&self) -> bool {
        self.lifecycle != Lifecycle::Attached
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.display_mode
    }

    /// Attached and on screen, so input and frames apply
    fn is_active(&self) -> bool {
        !self.is_stopped() && self.display_mode == DisplayMode::ShowAlways
    }

    pub fn window(&self) -> &W {
        &self.window
    }

    pub fn window_mut(&mut self) -> &mut W {
        &mut self.window
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Whether the bubble answers to a frame
    pub fn needs_frame(&self) -> bool {
        self.is_active() && (self.motion.is_some() || self.menu.is_animating())
    }

    fn bubble_rect(&self, position: Position) -> Rect {
        Rect::at(position, self.size, self.size)
    }

    fn window_options(position: Position, size: i32) -> WindowOptions {
        WindowOptions {
            x: position.x,
            y: position.y,
            width: size,
            height: size,
            touchable: true,
        }
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) {
        match event.kind {
            PointerKind::Down => {
                self.touch_down(event.x, event.y, event.time);
            }
            PointerKind::Move => self.touch_move(event.x, event.y, event.time),
            PointerKind::Up => self.touch_up(event.x, event.y, event.time),
            PointerKind::Cancel => self.touch_cancel(event.time),
        }
    }

    pub fn touch_down(&mut self, x: f64, y: f64, now: Instant) -> bool {
        if !self.is_active() {
            return false;
        }
        if self.motion.take().is_some() {
            debug!(position = ?self.position, "settle interrupted by pointer down");
            self.interrupted_settle = true;
        }
        self.drag.touch_down(x, y, self.position, now)
    }

    pub fn touch_move(&mut self, x: f64, y: f64, now: Instant) {
        if !self.is_active() {
            return;
        }
        // The menu fixes its orientation per expansion, so the bubble stays put while it is open
        let drag_allowed = self.menu.state() == FoldState::Collapsed;
        match self.drag.touch_move(x, y, now, drag_allowed) {
            None | Some(DragMove::Pending) => {}
            Some(DragMove::Started(position)) => {
                debug!(?position, "drag started");
                // The release snaps again, so an interrupted settle is moot
                self.interrupted_settle = false;
                self.events.push(Event::TouchStarted);
                match self.trash.show(&mut self.window) {
                    Ok(()) if self.trash.is_visible() => self.events.push(Event::TrashShown),
                    Ok(()) => {}
                    Err(err) => {
                        if !self.window_failed(err) {
                            return;
                        }
                    }
                }
                self.drag_to(position);
            }
            Some(DragMove::Moved(position)) => {
                self.drag_to(position);
            }
        }
    }

    /// Follow the pointer, pulled onto the trash while hovering it
    fn drag_to(&mut self, position: Position) -> bool {
        let rect = self.bubble_rect(position);
        if let Some(entered) = self.trash.update_hover(&rect) {
            self.events.push(Event::TrashHover { entered });
        }
        let target = if self.trash.is_hovering() {
            self.trash.magnet_position(self.size, self.size)
        } else {
            position
        };
        self.move_to(target)
    }

    pub fn touch_up(&mut self, x: f64, y: f64, now: Instant) {
        if !self.is_active() {
            return;
        }
        match self.drag.touch_up(x, y, now) {
            None => {}
            Some(Release::Tap) => {
                // The menu opens from the edge the bubble comes to rest on
                let Some(anchor_x) = self.resume_settle(now) else {
                    return;
                };
                self.events.push(Event::MainButtonClicked);
                self.menu.toggle(anchor_x, self.metrics.width, now, &mut self.events);
            }
            Some(Release::Drop { position, velocity }) => self.release(position, velocity, now),
        }
    }

    fn release(&mut self, position: Position, velocity: Vector2, now: Instant) {
        if !self.drag_to(position) {
            return;
        }
        let deleted = self.trash.is_hovering();
        let rest = self.position;

        debug!(?rest, deleted, "drag finished");
        self.events.push(Event::TouchFinished { deleted, x: rest.x, y: rest.y });
        if !self.hide_trash() {
            return;
        }

        if deleted {
            self.delete();
            return;
        }
        let snap = self.resolver.release(rest, velocity, now);
        self.apply_snap(snap);
    }

    /// Apply a snap. `false` once the session has stopped.
    fn apply_snap(&mut self, snap: Snap) -> bool {
        match snap {
            Snap::Immediate(rest) => self.move_to(rest),
            Snap::Motion(motion) => {
                self.motion = Some(motion);
                true
            }
        }
    }

    /// Restart a snap that a pointer down cut short, from where the bubble
    /// was held. Returns the resting x, or `None` once the session stopped.
    fn resume_settle(&mut self, now: Instant) -> Option<i32> {
        if !std::mem::take(&mut self.interrupted_settle) {
            return Some(self.position.x);
        }
        let snap = self.resolver.settle_from(self.position, now);
        let anchor_x = match snap {
            Snap::Immediate(rest) => rest.x,
            Snap::Motion(motion) => motion.target().map_or(self.position.x, |to| to.x),
        };
        debug!(from = ?self.position, anchor_x, "resuming interrupted settle");
        self.apply_snap(snap).then_some(anchor_x)
    }

    /// Pointer stream cancelled by the host
    ///
    /// The gesture is discarded without a release. The bubble is eased back
    /// onto its edge so it never rests outside the safe bounds.
    pub fn touch_cancel(&mut self, now: Instant) {
        if !self.is_active() {
            return;
        }
        let Some(session) = self.drag.cancel() else {
            return;
        };
        debug!(position = ?self.position, "gesture cancelled");
        if !self.hide_trash() {
            return;
        }
        if !session.is_dragging {
            self.resume_settle(now);
            return;
        }
        let snap = self.resolver.settle_from(self.position, now);
        self.apply_snap(snap);
    }

    /// Advance the snap and menu animations
    pub fn tick(&mut self, now: Instant) {
        if !self.is_active() {
            return;
        }
        self.menu.tick(now, &mut self.events);

        if let Some(mut motion) = self.motion.take() {
            let step = self.resolver.step(&mut motion, now);
            if !step.done {
                self.motion = Some(motion);
            }
            self.move_to(step.position);
        }
    }

    /// Select a menu slot. Only honoured while the menu is fully open.
    pub fn select_menu_item(&mut self, index: usize, now: Instant) -> bool {
        if !self.is_active() {
            return false;
        }
        self.menu.select(index, now, &mut self.events)
    }

    pub fn force_collapse(&mut self, now: Instant) -> bool {
        if !self.is_active() {
            return false;
        }
        self.menu.force_collapse(now, &mut self.events)
    }

    pub fn recording(&mut self) {
        self.menu.recording();
    }

    pub fn paused(&mut self) {
        self.menu.paused();
    }

    pub fn stopped(&mut self) {
        self.menu.stopped();
    }

    /// Let drags show the trash target, or stop them from doing so
    ///
    /// Disabling mid-drag dismisses a visible target so the drop snaps instead.
    pub fn set_trash_enabled(&mut self, enabled: bool) {
        if self.is_stopped() || self.trash.is_enabled() == enabled {
            return;
        }
        debug!(enabled, "trash target toggled");
        self.trash.set_enabled(enabled);
        if !enabled {
            self.hide_trash();
        }
    }

    /// Show or hide the bubble surface. Returns whether the mode changed.
    ///
    /// Hiding ends any gesture, dismisses the trash, jumps a running snap to
    /// its resting position and folds the menu away before removing the window.
    pub fn set_display_mode(&mut self, mode: DisplayMode) -> bool {
        if self.is_stopped() || self.display_mode == mode {
            return false;
        }
        match mode {
            DisplayMode::HideAlways => self.hide(),
            DisplayMode::ShowAlways => self.show(),
        }
    }

    fn hide(&mut self) -> bool {
        let dragged = self.drag.cancel().is_some_and(|session| session.is_dragging);
        if !self.hide_trash() {
            return false;
        }
        let unsettled = self.motion.take().is_some() || std::mem::take(&mut self.interrupted_settle) || dragged;
        if unsettled {
            let rest = self.resolver.resting_position(self.position, Vector2::ZERO);
            if !self.move_to(rest) {
                return false;
            }
        }
        if self.menu.state() != FoldState::Collapsed {
            self.menu.reset();
            self.events.push(Event::FoldSettled { state: FoldState::Collapsed });
        }
        match self.window.remove_window(Surface::Bubble) {
            Ok(()) | Err(WindowError::NotAttached(_)) => {}
            Err(err) => {
                if !self.window_failed(err) {
                    return false;
                }
            }
        }
        info!(position = ?self.position, "bubble hidden");
        self.display_mode = DisplayMode::HideAlways;
        self.events.push(Event::VisibilityChanged { visible: false });
        true
    }

    fn show(&mut self) -> bool {
        if let Err(err) = self
            .window
            .add_window(Surface::Bubble, Self::window_options(self.position, self.size))
        {
            self.window_failed(err);
            return false;
        }
        info!(position = ?self.position, "bubble shown");
        self.display_mode = DisplayMode::ShowAlways;
        self.events.push(Event::VisibilityChanged { visible: true });
        true
    }

    /// Tear the overlay down on behalf of the host
    ///
    /// Any gesture in flight is discarded without a release.
    pub fn teardown(&mut self) {
        if self.is_stopped() {
            return;
        }
        info!("bubble torn down by host");
        self.shut_down();
    }

    /// Move the bubble surface. `false` once the session has stopped.
    fn move_to(&mut self, position: Position) -> bool {
        if position == self.position {
            return true;
        }
        match self.window.update_window_position(Surface::Bubble, position.x, position.y) {
            Ok(()) => {
                self.position = position;
                self.events.push(Event::PositionChanged { x: position.x, y: position.y });
                true
            }
            Err(err) => self.window_failed(err),
        }
    }

    fn hide_trash(&mut self) -> bool {
        if !self.trash.is_visible() {
            return true;
        }
        let result = self.trash.hide(&mut self.window);
        self.events.push(Event::TrashHidden);
        match result {
            Ok(()) => true,
            Err(err) => self.window_failed(err),
        }
    }

    fn delete(&mut self) {
        info!(position = ?self.position, "bubble dropped on trash");
        self.menu.reset();
        if let Err(err) = self.window.remove_window(Surface::Bubble) {
            warn!(%err, "removing deleted bubble failed");
        }
        self.lifecycle = Lifecycle::Deleted;
        self.events.push(Event::Deleted);
        self.events.push(Event::OverlayMustStop);
    }

    /// Handle a refused window call. Returns `false` when the session stopped.
    fn window_failed(&mut self, err: WindowError) -> bool {
        if !err.is_permission_lost() {
            warn!(%err, "overlay window call failed");
            return true;
        }
        error!(%err, "overlay permission lost, stopping bubble");
        self.shut_down();
        self.events.push(Event::OverlayMustStop);
        false
    }

    fn shut_down(&mut self) {
        self.lifecycle = Lifecycle::Stopped;
        self.drag.cancel();
        self.motion = None;
        self.interrupted_settle = false;
        if self.trash.is_visible() {
            if let Err(err) = self.trash.hide(&mut self.window) {
                warn!(%err, "removing trash target failed");
            }
            self.events.push(Event::TrashHidden);
        }
        self.menu.reset();
        if self.display_mode == DisplayMode::HideAlways {
            return;
        }
        if let Err(err) = self.window.remove_window(Surface::Bubble) {
            warn!(%err, "removing bubble failed");
        }
    }
}
