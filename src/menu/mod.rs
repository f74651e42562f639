//! Folding action menu attached to the bubble
//!
//! - `item`: menu slot definitions and their semantic actions
//! - `layout`: left/right mirrored placement of the bar
//! - `fold`: the expand/collapse state machine

mod fold;
mod item;
mod layout;

pub use fold::*;
pub use item::*;
pub use layout::*;
