//! Screen geometry shared by the drag, snap, trash and menu code
//!
//! All resting and window coordinates are integer screen pixels with the
//! origin at the top-left. Motion integration happens in `f64` and is rounded
//! when it is applied to a window.

use serde::{Deserialize, Serialize};

/// Top-left of a surface in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Velocity or displacement in pixels (per second when used as velocity)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn scale(&self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }
}

/// Integer rectangle used for hit testing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn at(origin: Position, width: i32, height: i32) -> Self {
        Self::new(origin.x, origin.y, width, height)
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Check if a point is inside this rectangle
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Overlap test with the same semantics as a half-open pixel grid:
    /// touching edges do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn center(&self) -> (i32, i32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }
}

/// Cutout-avoidance insets. Resting positions never cross them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SafeArea {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl SafeArea {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }
}

/// Display metrics read once when an overlay session starts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenMetrics {
    pub width: i32,
    pub height: i32,
    /// Pixels per density-independent pixel
    #[serde(default = "default_density")]
    pub density: f64,
}

fn default_density() -> f64 {
    1.0
}

impl ScreenMetrics {
    pub fn new(width: i32, height: i32, density: f64) -> Self {
        Self { width, height, density }
    }

    /// Convert density-independent pixels to whole screen pixels
    pub fn dp(&self, value: f64) -> i32 {
        (value * self.density).round() as i32
    }
}

/// The box a widget's top-left may rest in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestBounds {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl RestBounds {
    /// Bounds for a widget of the given size. A widget larger than the usable
    /// area collapses the range onto its minimum.
    pub fn new(metrics: &ScreenMetrics, safe_area: &SafeArea, width: i32, height: i32) -> Self {
        let min_x = safe_area.left;
        let min_y = safe_area.top;
        let max_x = (metrics.width - width - safe_area.right).max(min_x);
        let max_y = (metrics.height - height - safe_area.bottom).max(min_y);
        Self { min_x, max_x, min_y, max_y }
    }

    pub fn clamp(&self, position: Position) -> Position {
        Position::new(
            position.x.clamp(self.min_x, self.max_x),
            position.y.clamp(self.min_y, self.max_y),
        )
    }

    pub fn contains(&self, position: Position) -> bool {
        (self.min_x..=self.max_x).contains(&position.x)
            && (self.min_y..=self.max_y).contains(&position.y)
    }
}

/// Easing curves, all mapping `[0, 1]` onto a progress value that ends at 1
pub mod easing {
    /// Ease out cubic - starts fast, slows down
    pub fn ease_out_cubic(t: f64) -> f64 {
        1.0 - (1.0 - t).powi(3)
    }

    /// Piecewise parabolic bounce, matching the platform bounce interpolator
    pub fn bounce(t: f64) -> f64 {
        fn arc(t: f64) -> f64 {
            t * t * 8.0
        }

        if t >= 1.0 {
            return 1.0;
        }
        let t = t * 1.1226;
        if t < 0.3535 {
            arc(t)
        } else if t < 0.7408 {
            arc(t - 0.54719) + 0.7
        } else if t < 0.9644 {
            arc(t - 0.8526) + 0.9
        } else {
            arc(t - 1.0435) + 0.95
        }
    }

    /// Damped cosine: `1 - e^(-t/amplitude) * cos(frequency * t)`
    pub fn damped_bounce(t: f64, amplitude: f64, frequency: f64) -> f64 {
        if t >= 1.0 {
            return 1.0;
        }
        let amplitude = amplitude.max(f64::EPSILON);
        1.0 - (-t / amplitude).exp() * (frequency * t).cos()
    }
}

/// Linear interpolation
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rest_bounds_respect_safe_area() {
        let metrics = ScreenMetrics::new(1000, 2000, 1.0);
        let safe = SafeArea::new(10, 40, 20, 30);
        let bounds = RestBounds::new(&metrics, &safe, 100, 100);

        assert_eq!(bounds.min_x, 10);
        assert_eq!(bounds.max_x, 1000 - 100 - 20);
        assert_eq!(bounds.min_y, 40);
        assert_eq!(bounds.max_y, 2000 - 100 - 30);
        assert_eq!(bounds.clamp(Position::new(-50, 5000)), Position::new(10, 1870));
    }

    #[test]
    fn test_oversized_widget_collapses_bounds() {
        let metrics = ScreenMetrics::new(100, 100, 1.0);
        let bounds = RestBounds::new(&metrics, &SafeArea::default(), 300, 300);
        assert_eq!(bounds.min_x, bounds.max_x);
        assert_eq!(bounds.clamp(Position::new(50, 50)), Position::new(0, 0));
    }

    #[test]
    fn test_rect_intersection_excludes_touching_edges() {
        let a = Rect::new(0, 0, 10, 10);
        assert!(a.intersects(&Rect::new(5, 5, 10, 10)));
        assert!(!a.intersects(&Rect::new(10, 0, 10, 10)));
        assert!(a.contains(0, 0));
        assert!(!a.contains(10, 10));
    }

    #[test]
    fn test_easing_endpoints() {
        assert!(easing::ease_out_cubic(0.0).abs() < 1e-9);
        assert!((easing::ease_out_cubic(1.0) - 1.0).abs() < 1e-9);
        assert!(easing::bounce(0.0).abs() < 1e-9);
        assert_eq!(easing::bounce(1.0), 1.0);
        assert!((easing::bounce(0.999) - 1.0).abs() < 0.01);
        assert_eq!(easing::damped_bounce(1.0, 0.1, 0.8), 1.0);
        assert!(easing::damped_bounce(0.0, 0.1, 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_dp_conversion() {
        let metrics = ScreenMetrics::new(1080, 2340, 2.75);
        assert_eq!(metrics.dp(56.0), 154);
        assert_eq!(metrics.dp(8.0), 22);
    }
}
