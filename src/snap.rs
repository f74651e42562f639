//! Edge snapping after a drag is released
//!
//! Without physics the bubble jumps straight onto its resting edge. With
//! physics it first coasts on its release velocity, which decays
//! exponentially by a single damping coefficient, and once it slows below
//! the stop speed it eases onto the edge with a damped bounce. Every frame
//! of both phases is clamped into [`RestBounds`], so no path can leave the
//! bubble outside the safe area.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::animation::Animation;
use crate::config::PhysicsConfig;
use crate::geometry::{easing, lerp, Position, RestBounds, Vector2};

/// Longest integration step; longer frames are subdivided
const MAX_STEP: Duration = Duration::from_millis(16);

/// Which edge a released bubble travels to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    /// Left edge when on the left half of the screen, right edge otherwise
    #[default]
    Nearest,
    Left,
    Right,
    /// The edge it was flung toward, nearest when released slowly
    Thrown,
    /// Stay where released, clamped into the safe bounds
    None,
}

/// One frame of a snap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapStep {
    pub position: Position,
    pub done: bool,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Inertia {
        x: f64,
        y: f64,
        velocity: Vector2,
        last: Instant,
    },
    Settle {
        from: Position,
        to: Position,
        animation: Animation,
    },
    Done(Position),
}

/// An in-flight inertial snap
#[derive(Debug, Clone, Copy)]
pub struct SnapMotion {
    phase: Phase,
    release_velocity: Vector2,
}

impl SnapMotion {
    pub fn is_settling(&self) -> bool {
        matches!(self.phase, Phase::Settle { .. })
    }

    /// Final position, once known
    pub fn target(&self) -> Option<Position> {
        match self.phase {
            Phase::Inertia { .. } => None,
            Phase::Settle { to, .. } | Phase::Done(to) => Some(to),
        }
    }
}

/// Result of handing a release to the resolver
#[derive(Debug, Clone, Copy)]
pub enum Snap {
    /// Discrete snap, apply once
    Immediate(Position),
    /// Drive with [`EdgeSnapResolver::step`] every frame
    Motion(SnapMotion),
}

#[derive(Debug, Clone, Copy)]
pub struct EdgeSnapResolver {
    bounds: RestBounds,
    screen_width: i32,
    direction: MoveDirection,
    /// Horizontal release speed (px/s) that counts as a throw
    fling_speed: f64,
    physics: Option<PhysicsConfig>,
}

impl EdgeSnapResolver {
    pub fn new(
        bounds: RestBounds,
        screen_width: i32,
        direction: MoveDirection,
        fling_speed: f64,
        physics: Option<PhysicsConfig>,
    ) -> Self {
        Self {
            bounds,
            screen_width,
            direction,
            fling_speed,
            physics,
        }
    }

    pub fn bounds(&self) -> &RestBounds {
        &self.bounds
    }

    pub fn uses_physics(&self) -> bool {
        self.physics.is_some()
    }

    fn nearest_x(&self, x: i32) -> i32 {
        if x < self.screen_width / 2 {
            self.bounds.min_x
        } else {
            self.bounds.max_x
        }
    }

    /// Resting position for a bubble at `position` released with `velocity`
    pub fn resting_position(&self, position: Position, velocity: Vector2) -> Position {
        let x = match self.direction {
            MoveDirection::Nearest => self.nearest_x(position.x),
            MoveDirection::Left => self.bounds.min_x,
            MoveDirection::Right => self.bounds.max_x,
            MoveDirection::Thrown => {
                if velocity.x <= -self.fling_speed {
                    self.bounds.min_x
                } else if velocity.x >= self.fling_speed {
                    self.bounds.max_x
                } else {
                    self.nearest_x(position.x)
                }
            }
            MoveDirection::None => position.x,
        };
        self.bounds.clamp(Position::new(x, position.y))
    }

    pub fn release(&self, position: Position, velocity: Vector2, now: Instant) -> Snap {
        let Some(physics) = self.physics else {
            let rest = self.resting_position(position, velocity);
            debug!(?position, ?rest, "discrete snap");
            return Snap::Immediate(rest);
        };

        let start = self.bounds.clamp(position);
        let mut motion = SnapMotion {
            phase: Phase::Inertia {
                x: start.x as f64,
                y: start.y as f64,
                velocity,
                last: now,
            },
            release_velocity: velocity,
        };
        if velocity.length() <= physics.stop_speed {
            self.begin_settle(&mut motion, start, now, &physics);
        }
        debug!(?position, ?velocity, "inertial snap");
        Snap::Motion(motion)
    }

    /// Settle animation straight from `position`, skipping inertia
    pub fn settle_from(&self, position: Position, now: Instant) -> Snap {
        match self.physics {
            Some(physics) => {
                let mut motion = SnapMotion {
                    phase: Phase::Done(position),
                    release_velocity: Vector2::ZERO,
                };
                self.begin_settle(&mut motion, self.bounds.clamp(position), now, &physics);
                Snap::Motion(motion)
            }
            None => Snap::Immediate(self.resting_position(position, Vector2::ZERO)),
        }
    }

    fn begin_settle(&self, motion: &mut SnapMotion, from: Position, now: Instant, physics: &PhysicsConfig) {
        let to = self.resting_position(from, motion.release_velocity);
        motion.phase = if from == to {
            Phase::Done(to)
        } else {
            trace!(?from, ?to, "settling onto edge");
            Phase::Settle {
                from,
                to,
                animation: Animation::new(now, physics.settle_duration()),
            }
        };
    }

    /// Advance a motion to `now`
    pub fn step(&self, motion: &mut SnapMotion, now: Instant) -> SnapStep {
        let Some(physics) = self.physics else {
            // A motion only exists with physics; finish it where it is
            let position = motion.target().unwrap_or_else(|| self.bounds.clamp(Position::default()));
            motion.phase = Phase::Done(position);
            return SnapStep { position, done: true };
        };

        if let Phase::Inertia { mut x, mut y, mut velocity, last } = motion.phase {
            let mut remaining = now.saturating_duration_since(last);
            while !remaining.is_zero() && velocity.length() > physics.stop_speed {
                let dt = remaining.min(MAX_STEP);
                remaining -= dt;
                let secs = dt.as_secs_f64();

                velocity = velocity.scale((-physics.damping * secs).exp());
                x += velocity.x * secs;
                y += velocity.y * secs;

                let (min_x, max_x) = (self.bounds.min_x as f64, self.bounds.max_x as f64);
                let (min_y, max_y) = (self.bounds.min_y as f64, self.bounds.max_y as f64);
                if x <= min_x || x >= max_x {
                    x = x.clamp(min_x, max_x);
                    velocity.x = 0.0;
                }
                if y <= min_y || y >= max_y {
                    y = y.clamp(min_y, max_y);
                    velocity.y = 0.0;
                }
            }

            let current = Position::new(x.round() as i32, y.round() as i32);
            if velocity.length() <= physics.stop_speed {
                self.begin_settle(motion, current, now, &physics);
            } else {
                motion.phase = Phase::Inertia { x, y, velocity, last: now };
                return SnapStep { position: current, done: false };
            }
        }

        match motion.phase {
            Phase::Settle { from, to, animation } => {
                let progress = animation.progress(now);
                if progress.is_finished() {
                    motion.phase = Phase::Done(to);
                    return SnapStep { position: to, done: true };
                }
                let t = easing::damped_bounce(progress.fraction(), physics.bounce_amplitude, physics.bounce_frequency);
                let position = self.bounds.clamp(Position::new(
                    lerp(from.x as f64, to.x as f64, t).round() as i32,
                    lerp(from.y as f64, to.y as f64, t).round() as i32,
                ));
                SnapStep { position, done: false }
            }
            Phase::Done(position) => SnapStep { position, done: true },
            Phase::Inertia { x, y, .. } => SnapStep {
                position: Position::new(x.round() as i32, y.round() as i32),
                done: false,
            },
        }
    }
}
