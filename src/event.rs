//! Notifications from the bubble to its host
//!
//! The host drains these after every input or frame and matches on them,
//! for example to stop its overlay service on [`Event::OverlayMustStop`].

use serde::Serialize;

use crate::menu::{FoldState, MenuAction};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// A press turned into a drag
    TouchStarted,
    /// A drag ended; `deleted` when it was released over the trash target
    TouchFinished { deleted: bool, x: i32, y: i32 },
    /// The bubble window moved (drag, snap or settle frame)
    PositionChanged { x: i32, y: i32 },
    TrashShown,
    TrashHidden,
    /// The bubble started or stopped overlapping the trash target
    TrashHover { entered: bool },
    /// The bubble was dropped on the trash and its window removed
    Deleted,
    /// Tap on the bubble itself
    MainButtonClicked,
    FoldOpened,
    FoldClosed,
    /// A fold animation reached its terminal state
    FoldSettled { state: FoldState },
    MenuItemSelected { index: usize, id: String },
    MenuAction { action: MenuAction },
    /// The bubble window was removed or restored by a display mode change
    VisibilityChanged { visible: bool },
    /// The overlay was torn down and the host should stop it
    OverlayMustStop,
}
