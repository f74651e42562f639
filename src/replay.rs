//! Scripted gesture replay
//!
//! Drives a [`FloatingBubble`] on a [`HeadlessWindowManager`] from a TOML
//! trace. Frames come from a calloop timer while a virtual clock advances by
//! exactly one frame per tick, so a replay is deterministic whatever the
//! timer interval.
//!
//! ```toml
//! [screen]
//! width = 1080
//! height = 2340
//! density = 2.75
//!
//! [safe_area]
//! top = 80
//!
//! [[step]]
//! at_ms = 0
//! kind = "down"
//! x = 1040.0
//! y = 1400.0
//! ```

use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use calloop::timer::{TimeoutAction, Timer};
use calloop::{EventLoop, LoopSignal};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::bubble::{DisplayMode, FloatingBubble};
use crate::config::BubbleConfig;
use crate::error::{BubbleError, ConfigError};
use crate::event::Event;
use crate::geometry::{SafeArea, ScreenMetrics};
use crate::input::{PointerEvent, PointerKind};
use crate::window::HeadlessWindowManager;

/// Virtual time advanced per frame
pub const FRAME: Duration = Duration::from_millis(16);

/// Upper bound on frames run after the last step while animations finish
const SETTLE_TAIL: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    pub screen: ScreenMetrics,
    #[serde(default)]
    pub safe_area: SafeArea,
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Down,
    Move,
    Up,
    Cancel,
    /// Select the menu slot `index`
    Select,
    Recording,
    Paused,
    Stopped,
    /// Force the menu closed
    Collapse,
    /// Remove the bubble window
    Hide,
    /// Restore the bubble window
    Show,
    /// Withdraw overlay permission from the window manager
    Revoke,
    Teardown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    /// Offset from the start of the replay
    pub at_ms: u64,
    pub kind: StepKind,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub index: usize,
}

impl Script {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let mut script: Self = toml::from_str(contents)?;
        script.steps.sort_by_key(|step| step.at_ms);
        Ok(script)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let script = Self::from_toml_str(&contents)?;
        info!("Loaded replay script from {:?} ({} steps)", path, script.steps.len());
        Ok(script)
    }

    fn duration(&self) -> Duration {
        let last = self.steps.last().map(|step| step.at_ms).unwrap_or(0);
        Duration::from_millis(last) + SETTLE_TAIL
    }
}

/// An event stamped with the virtual time of the frame that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayEvent {
    pub at_ms: u64,
    #[serde(flatten)]
    pub event: Event,
}

struct Replay {
    bubble: FloatingBubble<HeadlessWindowManager>,
    steps: VecDeque<Step>,
    t0: Instant,
    elapsed: Duration,
    end: Duration,
    events: Vec<ReplayEvent>,
    signal: LoopSignal,
    finished: bool,
}

impl Replay {
    fn collect(&mut self) {
        let at_ms = self.elapsed.as_millis() as u64;
        self.events
            .extend(self.bubble.drain_events().into_iter().map(|event| ReplayEvent { at_ms, event }));
    }

    fn apply(&mut self, step: &Step) {
        let at = self.t0 + Duration::from_millis(step.at_ms);
        trace!(?step, "replay step");
        let pointer = |kind| PointerEvent::new(kind, step.x, step.y, at);
        match step.kind {
            StepKind::Down => self.bubble.handle_pointer(pointer(PointerKind::Down)),
            StepKind::Move => self.bubble.handle_pointer(pointer(PointerKind::Move)),
            StepKind::Up => self.bubble.handle_pointer(pointer(PointerKind::Up)),
            StepKind::Cancel => self.bubble.handle_pointer(pointer(PointerKind::Cancel)),
            StepKind::Select => {
                self.bubble.select_menu_item(step.index, at);
            }
            StepKind::Recording => self.bubble.recording(),
            StepKind::Paused => self.bubble.paused(),
            StepKind::Stopped => self.bubble.stopped(),
            StepKind::Collapse => {
                self.bubble.force_collapse(at);
            }
            StepKind::Hide => {
                self.bubble.set_display_mode(DisplayMode::HideAlways);
            }
            StepKind::Show => {
                self.bubble.set_display_mode(DisplayMode::ShowAlways);
            }
            StepKind::Revoke => self.bubble.window_mut().revoke(),
            StepKind::Teardown => self.bubble.teardown(),
        }
    }

    fn frame(&mut self) {
        let elapsed_ms = self.elapsed.as_millis() as u64;
        while self.steps.front().is_some_and(|step| step.at_ms <= elapsed_ms) {
            if let Some(step) = self.steps.pop_front() {
                self.apply(&step);
            }
        }
        self.bubble.tick(self.t0 + self.elapsed);
        self.collect();

        // Once the script is spent, stop as soon as nothing is left to animate
        let idle = self.steps.is_empty() && (self.elapsed >= self.end || !self.bubble.needs_frame());
        if self.bubble.is_stopped() || idle {
            debug!(elapsed_ms, stopped = self.bubble.is_stopped(), "replay finished");
            self.finished = true;
            self.signal.stop();
            return;
        }
        self.elapsed += FRAME;
    }
}

/// Replay `script` and return every event it produced
///
/// `interval` is the real time between frames, zero to run as fast as possible.
pub fn run(script: &Script, config: &BubbleConfig, interval: Duration) -> Result<Vec<ReplayEvent>, BubbleError> {
    let mut event_loop: EventLoop<Replay> =
        EventLoop::try_new().map_err(|e| BubbleError::EventLoop(e.to_string()))?;

    let t0 = Instant::now();
    let bubble = FloatingBubble::attach(HeadlessWindowManager::new(), script.screen, script.safe_area, config, t0)?;
    let mut replay = Replay {
        bubble,
        steps: script.steps.iter().cloned().collect(),
        t0,
        elapsed: Duration::ZERO,
        end: script.duration(),
        events: Vec::new(),
        signal: event_loop.get_signal(),
        finished: false,
    };
    replay.collect();

    event_loop
        .handle()
        .insert_source(Timer::immediate(), move |_deadline, _, replay: &mut Replay| {
            replay.frame();
            if replay.finished {
                TimeoutAction::Drop
            } else {
                TimeoutAction::ToDuration(interval)
            }
        })
        .map_err(|e| BubbleError::EventLoop(e.error.to_string()))?;

    info!(steps = script.steps.len(), "replay started");
    event_loop
        .run(Some(FRAME), &mut replay, |_| {})
        .map_err(|e| BubbleError::EventLoop(e.to_string()))?;

    Ok(replay.events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::{FoldState, MenuAction};

    const SCREEN: &str = r#"
        [screen]
        width = 1000
        height = 2000

        [safe_area]
        left = 10
        right = 10
    "#;

    fn discrete() -> BubbleConfig {
        BubbleConfig {
            use_physics: false,
            animate_initial_move: false,
            ..BubbleConfig::default()
        }
    }

    fn replay(steps: &str) -> Vec<Event> {
        let script = Script::from_toml_str(&format!("{}{}", SCREEN, steps)).unwrap();
        run(&script, &discrete(), Duration::ZERO)
            .unwrap()
            .into_iter()
            .map(|e| e.event)
            .collect()
    }

    #[test]
    fn test_script_parses_and_sorts_steps() {
        let script = Script::from_toml_str(&format!(
            "{}{}",
            SCREEN,
            r#"
            [[step]]
            at_ms = 40
            kind = "up"

            [[step]]
            at_ms = 0
            kind = "down"
            x = 950.0
            y = 1210.0
            "#
        ))
        .unwrap();

        assert_eq!(script.screen.density, 1.0);
        assert_eq!(script.safe_area, SafeArea::new(10, 0, 10, 0));
        assert_eq!(script.steps[0].kind, StepKind::Down);
        assert_eq!(script.steps[1].at_ms, 40);
    }

    #[test]
    fn test_unknown_step_kind_rejected() {
        let err = Script::from_toml_str(&format!("{}[[step]]\nat_ms = 0\nkind = \"jump\"\n", SCREEN)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_tap_select_replay() {
        let events = replay(
            r#"
            [[step]]
            at_ms = 0
            kind = "down"
            x = 950.0
            y = 1210.0

            [[step]]
            at_ms = 48
            kind = "up"
            x = 950.0
            y = 1210.0

            [[step]]
            at_ms = 1000
            kind = "select"
            index = 4
            "#,
        );

        let expected = [
            Event::MainButtonClicked,
            Event::FoldOpened,
            Event::FoldSettled { state: FoldState::Expanded },
            Event::MenuAction { action: MenuAction::OpenTool },
            Event::FoldClosed,
            Event::FoldSettled { state: FoldState::Collapsed },
        ];
        let mut rest = events.iter();
        for wanted in &expected {
            assert!(rest.any(|e| e == wanted), "missing {:?} in {:?}", wanted, events);
        }
    }

    #[test]
    fn test_drop_on_trash_ends_replay() {
        let events = replay(
            r#"
            [[step]]
            at_ms = 0
            kind = "down"
            x = 950.0
            y = 1210.0

            [[step]]
            at_ms = 32
            kind = "move"
            x = 520.0
            y = 1900.0

            [[step]]
            at_ms = 64
            kind = "up"
            x = 520.0
            y = 1900.0

            [[step]]
            at_ms = 500
            kind = "down"
            x = 10.0
            y = 10.0
            "#,
        );

        assert_eq!(events.last(), Some(&Event::OverlayMustStop));
        assert!(events.contains(&Event::Deleted));
        assert!(events.contains(&Event::TouchFinished { deleted: true, x: 472, y: 1888 }));
    }

    #[test]
    fn test_replay_ends_once_animations_finish() {
        let script = Script::from_toml_str(&format!(
            "{}{}",
            SCREEN,
            r#"
            [[step]]
            at_ms = 0
            kind = "down"
            x = 950.0
            y = 1210.0

            [[step]]
            at_ms = 48
            kind = "up"
            x = 950.0
            y = 1210.0
            "#
        ))
        .unwrap();
        let events = run(&script, &discrete(), Duration::ZERO).unwrap();

        let last = events.last().unwrap();
        assert_eq!(last.event, Event::FoldSettled { state: FoldState::Expanded });
        assert!(last.at_ms < 48 + SETTLE_TAIL.as_millis() as u64);
    }

    #[test]
    fn test_hide_and_show_steps() {
        let events = replay(
            r#"
            [[step]]
            at_ms = 0
            kind = "hide"

            [[step]]
            at_ms = 32
            kind = "down"
            x = 950.0
            y = 1210.0

            [[step]]
            at_ms = 64
            kind = "up"
            x = 950.0
            y = 1210.0

            [[step]]
            at_ms = 96
            kind = "show"
            "#,
        );

        assert!(!events.contains(&Event::MainButtonClicked));
        let hidden = events
            .iter()
            .position(|e| *e == Event::VisibilityChanged { visible: false })
            .unwrap();
        assert_eq!(events[hidden + 1], Event::VisibilityChanged { visible: true });
    }

    #[test]
    fn test_revoked_permission_stops_replay() {
        let events = replay(
            r#"
            [[step]]
            at_ms = 0
            kind = "down"
            x = 950.0
            y = 1210.0

            [[step]]
            at_ms = 16
            kind = "revoke"

            [[step]]
            at_ms = 32
            kind = "move"
            x = 500.0
            y = 1210.0
            "#,
        );

        // The trash can not be added once the token is gone
        let started = events.iter().position(|e| *e == Event::TouchStarted).unwrap();
        assert_eq!(&events[started + 1..], &[Event::OverlayMustStop]);
    }
}
