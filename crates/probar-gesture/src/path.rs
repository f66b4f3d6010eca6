//! Time-sampled gesture trajectories.
//!
//! Drag and click gestures follow a quadratic Bézier curve whose control
//! point bows sideways from the midpoint, proportional to travel distance
//! and curvature (`0.0` is a straight line). Hover gestures are two straight
//! segments, approach and departure, each with its own duration.
//!
//! Everything here is a pure function of its inputs and never touches the
//! DOM.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Sideways bow applied per unit of curvature
pub const CURVATURE_SCALE: f64 = 0.3;

/// An immutable, ordered sequence of sampled points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    points: Vec<Point>,
}

impl Path {
    /// Build a path from already-sampled points
    #[must_use]
    pub fn from_points(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// All points, first to last
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Number of points
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the path has no points
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// First point
    #[must_use]
    pub fn first(&self) -> Option<Point> {
        self.points.first().copied()
    }

    /// Last point
    #[must_use]
    pub fn last(&self) -> Option<Point> {
        self.points.last().copied()
    }

    /// Points strictly between the first and the last
    #[must_use]
    pub fn intermediate(&self) -> &[Point] {
        if self.points.len() <= 2 {
            return &[];
        }
        &self.points[1..self.points.len() - 1]
    }

    /// Total travelled distance
    #[must_use]
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|pair| pair[0].distance_to(pair[1]))
            .sum()
    }

    /// Concatenate two paths, dropping `next`'s first point when it
    /// duplicates this path's last point
    #[must_use]
    pub fn chain(&self, next: &Self) -> Self {
        let mut points = self.points.clone();
        let skip = usize::from(self.last().is_some() && self.last() == next.first());
        points.extend_from_slice(&next.points[skip.min(next.points.len())..]);
        Self { points }
    }
}

/// Number of frame intervals for a duration at a frame rate
#[must_use]
pub fn frame_count(duration_ms: u64, fps: u32) -> usize {
    ((duration_ms as f64 / 1000.0) * f64::from(fps)).round() as usize
}

/// Control point of the quadratic curve between `start` and `end`.
///
/// The midpoint is offset by `(dx, dy) * curvature * 0.3` rotated 90°.
#[must_use]
pub fn control_point(start: Point, end: Point, curvature: f64) -> Point {
    let mid = start.midpoint(end);
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let bow = curvature * CURVATURE_SCALE;
    Point::new(mid.x - dy * bow, mid.y + dx * bow)
}

// Delta form around `start`: exact when start, control and end coincide.
fn quadratic(start: Point, control: Point, end: Point, t: f64) -> Point {
    let u = 1.0 - t;
    let bend = 2.0 * u * t;
    let pull = t * t;
    Point::new(
        start.x + bend * (control.x - start.x) + pull * (end.x - start.x),
        start.y + bend * (control.y - start.y) + pull * (end.y - start.y),
    )
}

/// Sample a curved drag/click path.
///
/// Produces `frame_count(duration_ms, fps) + 1` points with the first and
/// last equal to `start` and `end`. A zero frame count yields `[start, end]`.
#[must_use]
pub fn curved_path(start: Point, end: Point, duration_ms: u64, fps: u32, curvature: f64) -> Path {
    let frames = frame_count(duration_ms, fps);
    if frames == 0 {
        return Path::from_points(vec![start, end]);
    }
    let control = control_point(start, end, curvature);
    let points = (0..=frames)
        .map(|i| match i {
            0 => start,
            i if i == frames => end,
            i => quadratic(start, control, end, i as f64 / frames as f64),
        })
        .collect();
    Path::from_points(points)
}

/// Sample a straight path (a curved path with zero curvature)
#[must_use]
pub fn straight_path(start: Point, end: Point, duration_ms: u64, fps: u32) -> Path {
    curved_path(start, end, duration_ms, fps, 0.0)
}

/// Two-segment hover trajectory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoverPath {
    /// From the starting point onto the target
    pub approach: Path,
    /// From the target to the exit point
    pub departure: Path,
}

impl HoverPath {
    /// Both segments as a single path
    #[must_use]
    pub fn combined(&self) -> Path {
        self.approach.chain(&self.departure)
    }
}

/// Build a hover trajectory: approach `target` from `start`, then leave
/// towards `exit`
#[must_use]
pub fn hover_path(
    start: Point,
    target: Point,
    exit: Point,
    approach_ms: u64,
    departure_ms: u64,
    fps: u32,
) -> HoverPath {
    HoverPath {
        approach: straight_path(start, target, approach_ms, fps),
        departure: straight_path(target, exit, departure_ms, fps),
    }
}
