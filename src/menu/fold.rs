//! Folding menu state machine
//!
//! The bubble doubles as the toggle of a horizontal bar of action buttons.
//! Tapping it cycles
//!
//! ```text
//! Collapsed -> Expanding -> Expanded -> Collapsing -> Collapsed
//! ```
//!
//! Requests that arrive while an animation is running are dropped, except
//! [`FoldingMenu::force_collapse`] which cuts an opening menu short. Every
//! visual property is derived from animation fractions in
//! [`FoldingMenu::visuals`]; nothing is mutated per frame except the state.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, trace, warn};

use super::item::{MenuAction, MenuItem};
use super::layout::MenuLayout;
use crate::animation::{Animation, Progress};
use crate::event::Event;
use crate::geometry::{easing, lerp};

pub const MAIN_ROTATION_START: f64 = 0.0;
pub const MAIN_ROTATION_END: f64 = 405.0;
pub const ITEM_ROTATION_START: f64 = 180.0;
pub const ITEM_ROTATION_END: f64 = 360.0;
pub const ROLL_UP_ROTATION_START: f64 = -45.0;
pub const ROLL_UP_ROTATION_END: f64 = 360.0;

pub const ICON_TOGGLE: &str = "ic_action_plus";
pub const ICON_TOGGLE_CLOSE: &str = "ic_close";
pub const ICON_STOP: &str = "ic_stop_red";
pub const ICON_PAUSE: &str = "ic_pause_red";
pub const ICON_PLAY: &str = "ic_play_red";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FoldState {
    #[default]
    Collapsed,
    Expanding,
    Expanded,
    Collapsing,
}

/// Recorder state reflected by the start/stop and pause/resume slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordingMode {
    #[default]
    Stopped,
    Recording,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoldTiming {
    pub duration: Duration,
    /// Item animation delay relative to the main button
    pub start_delay: Duration,
}

impl Default for FoldTiming {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(500),
            start_delay: Duration::from_millis(150),
        }
    }
}

/// Animations of one expand or roll-up pass
#[derive(Debug, Clone, Copy)]
struct Transition {
    main: Animation,
    items: Animation,
}

impl Transition {
    fn is_finished(&self, now: Instant) -> bool {
        self.main.progress(now).is_finished() && self.items.progress(now).is_finished()
    }
}

/// Per-button visual state for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct ItemVisual {
    pub id: String,
    pub icon: String,
    pub visible: bool,
    pub checked: bool,
    /// Degrees
    pub rotation: f64,
    pub scale: f64,
    /// Left edge relative to the bubble's left edge
    pub x: i32,
}

/// Whole-menu visual state for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct MenuVisuals {
    pub state: FoldState,
    pub layout: Option<MenuLayout>,
    pub toggle_icon: &'static str,
    /// Degrees
    pub main_rotation: f64,
    /// Current bar width, 0 when folded
    pub bar_width: i32,
    pub items: Vec<ItemVisual>,
}

pub struct FoldingMenu {
    items: Vec<MenuItem>,
    visible: Vec<bool>,
    state: FoldState,
    transition: Option<Transition>,
    /// Fixed for the length of one expansion cycle
    layout: Option<MenuLayout>,
    mode: RecordingMode,
    selected_index: Option<usize>,
    timing: FoldTiming,
    toggle_size: i32,
    item_size: i32,
    margin: i32,
}

impl FoldingMenu {
    pub fn new(mut items: Vec<MenuItem>, timing: FoldTiming, toggle_size: i32, item_size: i32, margin: i32) -> Self {
        items.sort_by_key(|item| item.order);
        for item in &items {
            if item.action().is_none() {
                warn!(id = %item.id, "menu item has no bound action");
            }
        }
        let selected_index = items.iter().position(|item| item.checked);
        Self {
            visible: vec![false; items.len()],
            items,
            state: FoldState::Collapsed,
            transition: None,
            layout: None,
            mode: RecordingMode::Stopped,
            selected_index,
            timing,
            toggle_size,
            item_size,
            margin,
        }
    }

    pub fn state(&self) -> FoldState {
        self.state
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    pub fn layout(&self) -> Option<&MenuLayout> {
        self.layout.as_ref()
    }

    /// Orientation chosen when the current expansion began
    pub fn is_rtl(&self) -> Option<bool> {
        self.layout.map(|layout| layout.is_rtl)
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected_index
    }

    pub fn mode(&self) -> RecordingMode {
        self.mode
    }

    pub fn is_visible(&self, index: usize) -> bool {
        self.visible.get(index).copied().unwrap_or(false)
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    /// Main button tap
    pub fn toggle(&mut self, widget_x: i32, screen_width: i32, now: Instant, out: &mut Vec<Event>) -> bool {
        match self.state {
            FoldState::Collapsed => self.expand(widget_x, screen_width, now, out),
            FoldState::Expanded => self.roll_up(now, out),
            FoldState::Expanding | FoldState::Collapsing => {
                trace!(state = ?self.state, "toggle ignored while animating");
                false
            }
        }
    }

    pub fn expand(&mut self, widget_x: i32, screen_width: i32, now: Instant, out: &mut Vec<Event>) -> bool {
        if self.state != FoldState::Collapsed {
            trace!(state = ?self.state, "expand ignored");
            return false;
        }

        let layout = MenuLayout::for_widget(
            widget_x,
            screen_width,
            self.toggle_size,
            self.item_size,
            self.margin,
            self.items.len(),
        );
        self.layout = Some(layout);
        self.transition = Some(Transition {
            main: Animation::new(now, self.timing.duration),
            items: Animation::new(now, self.timing.duration).with_delay(self.timing.start_delay),
        });
        self.state = FoldState::Expanding;

        let pause_participates = self.mode != RecordingMode::Stopped;
        for (visible, item) in self.visible.iter_mut().zip(&self.items) {
            *visible = pause_participates || item.action() != Some(MenuAction::PauseResume);
        }

        debug!(is_rtl = layout.is_rtl, "menu expanding");
        out.push(Event::FoldOpened);
        true
    }

    pub fn roll_up(&mut self, now: Instant, out: &mut Vec<Event>) -> bool {
        if self.state != FoldState::Expanded {
            trace!(state = ?self.state, "roll up ignored");
            return false;
        }
        self.begin_collapse(now, out);
        true
    }

    /// Close from `Expanding` or `Expanded` without waiting for the
    /// opening animation to finish
    pub fn force_collapse(&mut self, now: Instant, out: &mut Vec<Event>) -> bool {
        match self.state {
            FoldState::Expanding | FoldState::Expanded => {
                self.begin_collapse(now, out);
                true
            }
            FoldState::Collapsed | FoldState::Collapsing => false,
        }
    }

    fn begin_collapse(&mut self, now: Instant, out: &mut Vec<Event>) {
        let animation = Animation::new(now, self.timing.duration);
        self.transition = Some(Transition { main: animation, items: animation });
        self.state = FoldState::Collapsing;
        self.visible.iter_mut().for_each(|visible| *visible = false);

        debug!("menu collapsing");
        out.push(Event::FoldClosed);
    }

    /// Select the button in slot `index`. Always closes the menu.
    pub fn select(&mut self, index: usize, now: Instant, out: &mut Vec<Event>) -> bool {
        if self.state != FoldState::Expanded {
            trace!(index, state = ?self.state, "selection ignored while not expanded");
            return false;
        }
        let Some(selected) = self.items.get(index) else {
            warn!(index, "selection outside the menu");
            return false;
        };

        let id = selected.id.clone();
        let action = selected.action();
        for (i, item) in self.items.iter_mut().enumerate() {
            item.checked = i == index;
        }
        self.selected_index = Some(index);

        debug!(index, %id, "menu item selected");
        out.push(Event::MenuItemSelected { index, id: id.clone() });
        match action {
            Some(action) => out.push(Event::MenuAction { action }),
            None => warn!(%id, "menu item selected without a bound action"),
        }

        self.begin_collapse(now, out);
        true
    }

    /// Advance running animations, settling the state when they finish
    pub fn tick(&mut self, now: Instant, out: &mut Vec<Event>) {
        let Some(transition) = self.transition else {
            return;
        };
        if !transition.is_finished(now) {
            return;
        }

        self.transition = None;
        self.state = match self.state {
            FoldState::Expanding => FoldState::Expanded,
            FoldState::Collapsing => {
                self.layout = None;
                FoldState::Collapsed
            }
            settled => settled,
        };
        debug!(state = ?self.state, "menu settled");
        out.push(Event::FoldSettled { state: self.state });
    }

    pub fn recording(&mut self) {
        self.mode = RecordingMode::Recording;
    }

    pub fn paused(&mut self) {
        self.mode = RecordingMode::Paused;
    }

    pub fn stopped(&mut self) {
        self.mode = RecordingMode::Stopped;
        // The pause slot disappears at once, even from an open menu
        for (visible, item) in self.visible.iter_mut().zip(&self.items) {
            if item.action() == Some(MenuAction::PauseResume) {
                *visible = false;
            }
        }
    }

    /// Snap back to folded without animating, used on teardown
    pub fn reset(&mut self) {
        self.state = FoldState::Collapsed;
        self.transition = None;
        self.layout = None;
        self.visible.iter_mut().for_each(|visible| *visible = false);
    }

    /// Icon currently shown by a slot
    pub fn icon_for(&self, item: &MenuItem) -> String {
        match (item.action(), self.mode) {
            (Some(MenuAction::StartStop), RecordingMode::Recording | RecordingMode::Paused) => {
                ICON_STOP.to_string()
            }
            (Some(MenuAction::PauseResume), RecordingMode::Recording) => ICON_PAUSE.to_string(),
            (Some(MenuAction::PauseResume), RecordingMode::Paused) => ICON_PLAY.to_string(),
            _ => item.icon.clone(),
        }
    }

    pub fn visuals(&self, now: Instant) -> MenuVisuals {
        let (main, items) = match (self.state, self.transition) {
            (FoldState::Expanding | FoldState::Collapsing, Some(t)) => (t.main.progress(now), t.items.progress(now)),
            _ => (Progress::Finished, Progress::Finished),
        };

        let full_width = self.layout.map(|layout| layout.bar_width()).unwrap_or(0);
        let (main_rotation, bar_fraction, rotation, scale) = match self.state {
            FoldState::Collapsed => (MAIN_ROTATION_START, 0.0, ITEM_ROTATION_START, 0.0),
            FoldState::Expanded => (MAIN_ROTATION_END, 1.0, ITEM_ROTATION_END, 1.0),
            FoldState::Expanding => (
                lerp(MAIN_ROTATION_START, MAIN_ROTATION_END, main.fraction()),
                easing::ease_out_cubic(main.fraction()),
                expand_item_rotation(items),
                items.fraction(),
            ),
            FoldState::Collapsing => (
                lerp(ROLL_UP_ROTATION_START, ROLL_UP_ROTATION_END, main.fraction()),
                1.0 - easing::ease_out_cubic(main.fraction()),
                lerp(ITEM_ROTATION_END, ITEM_ROTATION_START, items.fraction()),
                1.0 - items.fraction(),
            ),
        };

        let toggle_icon = match self.state {
            FoldState::Collapsed => ICON_TOGGLE,
            _ => ICON_TOGGLE_CLOSE,
        };

        let items = self
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| ItemVisual {
                id: item.id.clone(),
                icon: self.icon_for(item),
                visible: self.visible[i],
                checked: item.checked,
                rotation,
                scale,
                x: self.layout.map(|layout| layout.slot_x(i)).unwrap_or(0),
            })
            .collect();

        MenuVisuals {
            state: self.state,
            layout: self.layout,
            toggle_icon,
            main_rotation,
            bar_width: (full_width as f64 * bar_fraction).round() as i32,
            items,
        }
    }
}

/// Half-turn plus settle, bounced
fn expand_item_rotation(progress: Progress) -> f64 {
    lerp(ITEM_ROTATION_START, ITEM_ROTATION_END, easing::bounce(progress.fraction()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::item::{default_menu_items, ITEM_PAUSE_RESUME};

    const SCREEN_WIDTH: i32 = 1000;

    fn menu() -> FoldingMenu {
        FoldingMenu::new(default_menu_items(), FoldTiming::default(), 56, 48, 20)
    }

    fn ms(t0: Instant, millis: u64) -> Instant {
        t0 + Duration::from_millis(millis)
    }

    fn open(menu: &mut FoldingMenu, t0: Instant, out: &mut Vec<Event>) {
        assert!(menu.toggle(10, SCREEN_WIDTH, t0, out));
        menu.tick(ms(t0, 650), out);
        assert_eq!(menu.state(), FoldState::Expanded);
    }

    #[test]
    fn test_full_cycle() {
        let t0 = Instant::now();
        let mut menu = menu();
        let mut out = Vec::new();

        assert!(menu.toggle(10, SCREEN_WIDTH, t0, &mut out));
        assert_eq!(menu.state(), FoldState::Expanding);
        assert_eq!(out, vec![Event::FoldOpened]);

        // Main rotation is done at 500ms, items still run until 650ms
        menu.tick(ms(t0, 500), &mut out);
        assert_eq!(menu.state(), FoldState::Expanding);
        menu.tick(ms(t0, 650), &mut out);
        assert_eq!(menu.state(), FoldState::Expanded);

        assert!(menu.toggle(10, SCREEN_WIDTH, ms(t0, 700), &mut out));
        assert_eq!(menu.state(), FoldState::Collapsing);
        menu.tick(ms(t0, 1200), &mut out);
        assert_eq!(menu.state(), FoldState::Collapsed);
        assert_eq!(menu.layout(), None);

        assert_eq!(
            out,
            vec![
                Event::FoldOpened,
                Event::FoldSettled { state: FoldState::Expanded },
                Event::FoldClosed,
                Event::FoldSettled { state: FoldState::Collapsed },
            ]
        );
    }

    #[test]
    fn test_requests_during_animation_are_ignored() {
        let t0 = Instant::now();
        let mut menu = menu();
        let mut out = Vec::new();

        assert!(menu.expand(10, SCREEN_WIDTH, t0, &mut out));
        assert!(!menu.expand(10, SCREEN_WIDTH, ms(t0, 100), &mut out));
        assert!(!menu.toggle(10, SCREEN_WIDTH, ms(t0, 200), &mut out));
        assert!(!menu.roll_up(ms(t0, 300), &mut out));
        assert_eq!(out.len(), 1);

        menu.tick(ms(t0, 650), &mut out);
        // Expanded: a second expand still does nothing
        assert!(!menu.expand(10, SCREEN_WIDTH, ms(t0, 700), &mut out));
        assert_eq!(menu.state(), FoldState::Expanded);
    }

    #[test]
    fn test_completed_toggle_parity() {
        let t0 = Instant::now();
        let mut menu = menu();
        let mut out = Vec::new();
        let mut now = t0;

        for n in 1..=5 {
            assert!(menu.toggle(10, SCREEN_WIDTH, now, &mut out));
            now += Duration::from_millis(700);
            menu.tick(now, &mut out);
            let expected = if n % 2 == 1 { FoldState::Expanded } else { FoldState::Collapsed };
            assert_eq!(menu.state(), expected);
        }
    }

    #[test]
    fn test_force_collapse_short_circuits_expanding() {
        let t0 = Instant::now();
        let mut menu = menu();
        let mut out = Vec::new();

        menu.expand(10, SCREEN_WIDTH, t0, &mut out);
        assert!(menu.force_collapse(ms(t0, 100), &mut out));
        assert_eq!(menu.state(), FoldState::Collapsing);
        assert!(!menu.force_collapse(ms(t0, 200), &mut out));

        menu.tick(ms(t0, 600), &mut out);
        assert_eq!(menu.state(), FoldState::Collapsed);
    }

    #[test]
    fn test_orientation_fixed_for_cycle() {
        let t0 = Instant::now();
        let mut menu = menu();
        let mut out = Vec::new();

        menu.expand(950, SCREEN_WIDTH, t0, &mut out);
        assert_eq!(menu.is_rtl(), Some(true));
        // Later toggles with other geometry are ignored mid-animation
        menu.toggle(10, SCREEN_WIDTH, ms(t0, 100), &mut out);
        assert_eq!(menu.is_rtl(), Some(true));
        menu.tick(ms(t0, 650), &mut out);
        assert_eq!(menu.is_rtl(), Some(true));

        menu.roll_up(ms(t0, 700), &mut out);
        menu.tick(ms(t0, 1200), &mut out);
        menu.expand(10, SCREEN_WIDTH, ms(t0, 1300), &mut out);
        assert_eq!(menu.is_rtl(), Some(false));
    }

    #[test]
    fn test_selection_closes_menu_and_fires_action() {
        let t0 = Instant::now();
        let mut menu = menu();
        let mut out = Vec::new();
        open(&mut menu, t0, &mut out);
        out.clear();

        assert!(menu.select(3, ms(t0, 700), &mut out));
        assert_eq!(menu.state(), FoldState::Collapsing);
        assert_eq!(menu.selected_index(), Some(3));
        assert!(menu.items()[3].checked);
        assert_eq!(menu.items().iter().filter(|i| i.checked).count(), 1);
        assert_eq!(
            out,
            vec![
                Event::MenuItemSelected { index: 3, id: "item_setting".into() },
                Event::MenuAction { action: MenuAction::OpenSetting },
                Event::FoldClosed,
            ]
        );

        menu.tick(ms(t0, 1200), &mut out);
        assert_eq!(menu.state(), FoldState::Collapsed);
    }

    #[test]
    fn test_unbound_item_still_closes_menu() {
        let t0 = Instant::now();
        let items = vec![MenuItem::new("item_home", "ic_home", 0), MenuItem::new("item_capture", "ic_cam", 1)];
        let mut menu = FoldingMenu::new(items, FoldTiming::default(), 56, 48, 20);
        let mut out = Vec::new();
        open(&mut menu, t0, &mut out);
        out.clear();

        assert!(menu.select(1, ms(t0, 700), &mut out));
        assert_eq!(menu.state(), FoldState::Collapsing);
        assert!(!out.iter().any(|e| matches!(e, Event::MenuAction { .. })));
    }

    #[test]
    fn test_selection_requires_expanded() {
        let t0 = Instant::now();
        let mut menu = menu();
        let mut out = Vec::new();

        assert!(!menu.select(0, t0, &mut out));
        menu.expand(10, SCREEN_WIDTH, t0, &mut out);
        assert!(!menu.select(0, ms(t0, 100), &mut out));
        menu.tick(ms(t0, 650), &mut out);
        assert!(!menu.select(99, ms(t0, 700), &mut out));
        assert_eq!(menu.state(), FoldState::Expanded);
    }

    #[test]
    fn test_pause_slot_follows_recording_mode() {
        let t0 = Instant::now();
        let mut menu = menu();
        let mut out = Vec::new();
        let pause = menu.items().iter().position(|i| i.id == ITEM_PAUSE_RESUME).unwrap();

        menu.expand(10, SCREEN_WIDTH, t0, &mut out);
        assert!(!menu.is_visible(pause));
        assert!(menu.is_visible(0));
        menu.tick(ms(t0, 650), &mut out);
        menu.roll_up(ms(t0, 700), &mut out);
        menu.tick(ms(t0, 1200), &mut out);

        menu.recording();
        menu.expand(10, SCREEN_WIDTH, ms(t0, 1300), &mut out);
        assert!(menu.is_visible(pause));
        assert_eq!(menu.icon_for(&menu.items()[0]), ICON_STOP);
        assert_eq!(menu.icon_for(&menu.items()[pause]), ICON_PAUSE);

        menu.paused();
        assert_eq!(menu.icon_for(&menu.items()[pause]), ICON_PLAY);

        menu.stopped();
        assert!(!menu.is_visible(pause));
        assert_eq!(menu.icon_for(&menu.items()[0]), "ic_record_menu");
        // Mode changes never fold or unfold
        assert_eq!(menu.state(), FoldState::Expanding);
    }

    #[test]
    fn test_collapse_hides_items_immediately() {
        let t0 = Instant::now();
        let mut menu = menu();
        let mut out = Vec::new();
        open(&mut menu, t0, &mut out);

        menu.roll_up(ms(t0, 700), &mut out);
        let visuals = menu.visuals(ms(t0, 700));
        assert!(visuals.items.iter().all(|item| !item.visible));
        assert_eq!(visuals.toggle_icon, ICON_TOGGLE_CLOSE);
        assert_eq!(visuals.bar_width, 5 * 48);

        let visuals = menu.visuals(ms(t0, 950));
        assert!(visuals.bar_width < 5 * 48);
        assert!(visuals.bar_width > 0);

        menu.tick(ms(t0, 1200), &mut out);
        let visuals = menu.visuals(ms(t0, 1200));
        assert_eq!(visuals.toggle_icon, ICON_TOGGLE);
        assert_eq!(visuals.bar_width, 0);
    }

    #[test]
    fn test_expand_visuals() {
        let t0 = Instant::now();
        let mut menu = menu();
        let mut out = Vec::new();
        menu.expand(10, SCREEN_WIDTH, t0, &mut out);

        let start = menu.visuals(t0);
        assert_eq!(start.toggle_icon, ICON_TOGGLE_CLOSE);
        assert_eq!(start.main_rotation, MAIN_ROTATION_START);
        assert_eq!(start.items[0].scale, 0.0);
        assert_eq!(start.items[0].rotation, ITEM_ROTATION_START);

        // Items wait for the start delay while the main button turns
        let delayed = menu.visuals(ms(t0, 100));
        assert!(delayed.main_rotation > 0.0);
        assert_eq!(delayed.items[0].scale, 0.0);

        let mid = menu.visuals(ms(t0, 400));
        assert!((mid.items[0].scale - 0.5).abs() < 1e-6);

        menu.tick(ms(t0, 650), &mut out);
        let done = menu.visuals(ms(t0, 650));
        assert_eq!(done.main_rotation, MAIN_ROTATION_END);
        assert_eq!(done.items[0].rotation, ITEM_ROTATION_END);
        assert_eq!(done.items[0].scale, 1.0);
        assert_eq!(done.bar_width, 5 * 48);
        assert_eq!(done.items[1].x - done.items[0].x, 48);
    }
}
