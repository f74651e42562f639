//! Menu bar placement relative to the bubble
//!
//! A [`MenuLayout`] is computed once when an expansion begins and never
//! mutated. When the bubble rests on the right half of the screen the bar
//! grows toward the left edge with the toggle anchored on the bar's right;
//! otherwise it mirrors. Slot order is the same in both cases: slot 0 is
//! always the left-most button of the bar.

use serde::Serialize;

/// Which way the bar extends away from the toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Growth {
    TowardLeft,
    TowardRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MenuLayout {
    pub is_rtl: bool,
    /// Edge length of the toggle (the bubble itself)
    pub toggle_size: i32,
    pub item_size: i32,
    /// Gap between toggle and bar
    pub margin: i32,
    pub item_count: usize,
}

impl MenuLayout {
    /// Orientation rule: right half of the screen means right-to-left growth
    pub fn is_rtl(widget_x: i32, screen_width: i32) -> bool {
        widget_x > screen_width / 2
    }

    pub fn for_widget(
        widget_x: i32,
        screen_width: i32,
        toggle_size: i32,
        item_size: i32,
        margin: i32,
        item_count: usize,
    ) -> Self {
        Self {
            is_rtl: Self::is_rtl(widget_x, screen_width),
            toggle_size,
            item_size,
            margin,
            item_count,
        }
    }

    pub fn growth(&self) -> Growth {
        if self.is_rtl {
            Growth::TowardLeft
        } else {
            Growth::TowardRight
        }
    }

    /// Fully expanded bar width
    pub fn bar_width(&self) -> i32 {
        self.item_count as i32 * self.item_size
    }

    /// Left edge of the fully expanded bar relative to the toggle's left edge
    pub fn bar_origin_x(&self) -> i32 {
        match self.growth() {
            Growth::TowardRight => self.toggle_size + self.margin,
            Growth::TowardLeft => -(self.margin + self.bar_width()),
        }
    }

    /// Left edge of slot `index` relative to the toggle's left edge
    pub fn slot_x(&self, index: usize) -> i32 {
        self.bar_origin_x() + index as i32 * self.item_size
    }
}
