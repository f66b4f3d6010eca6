//! Viewport geometry: points, element rectangles, and named anchors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::result::GestureError;

/// A point in viewport (client) coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    /// Create a new point
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Translate by an offset
    #[must_use]
    pub fn offset(self, by: Self) -> Self {
        Self::new(self.x + by.x, self.y + by.y)
    }

    /// Euclidean distance to another point
    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Midpoint between two points
    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Bounding box for an element (the DOMRect returned by `getBoundingClientRect`)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    /// X position
    pub x: f64,
    /// Y position
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl BoundingBox {
    /// Create a new bounding box
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Left edge
    #[must_use]
    pub const fn left(&self) -> f64 {
        self.x
    }

    /// Top edge
    #[must_use]
    pub const fn top(&self) -> f64 {
        self.y
    }

    /// Right edge
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Get the center point
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Check if a point is inside this bounding box
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.right()
            && point.y >= self.y
            && point.y <= self.bottom()
    }
}

/// Named position on an element's bounding box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    /// Center of the box
    #[default]
    Center,
    /// Middle of the top edge
    Top,
    /// Middle of the bottom edge
    Bottom,
    /// Middle of the left edge
    Left,
    /// Middle of the right edge
    Right,
    /// Top-left corner
    TopLeft,
    /// Top-right corner
    TopRight,
    /// Bottom-left corner
    BottomLeft,
    /// Bottom-right corner
    BottomRight,
}

impl Anchor {
    /// Every anchor, center first
    pub const ALL: [Self; 9] = [
        Self::Center,
        Self::Top,
        Self::Bottom,
        Self::Left,
        Self::Right,
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
    ];

    /// Resolve this anchor against a rectangle
    #[must_use]
    pub fn resolve(self, rect: &BoundingBox) -> Point {
        let center = rect.center();
        match self {
            Self::Center => center,
            Self::Top => Point::new(center.x, rect.top()),
            Self::Bottom => Point::new(center.x, rect.bottom()),
            Self::Left => Point::new(rect.left(), center.y),
            Self::Right => Point::new(rect.right(), center.y),
            Self::TopLeft => Point::new(rect.left(), rect.top()),
            Self::TopRight => Point::new(rect.right(), rect.top()),
            Self::BottomLeft => Point::new(rect.left(), rect.bottom()),
            Self::BottomRight => Point::new(rect.right(), rect.bottom()),
        }
    }

    /// Name used in test documents
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Center => "center",
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Anchor {
    type Err = GestureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|anchor| anchor.as_str() == s)
            .ok_or_else(|| GestureError::invalid_config(format!("unknown anchor '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod point_tests {
        use super::*;

        #[test]
        fn test_point_midpoint() {
            let mid = Point::new(0.0, 0.0).midpoint(Point::new(100.0, 50.0));
            assert_eq!(mid, Point::new(50.0, 25.0));
        }

        #[test]
        fn test_point_distance() {
            let d = Point::new(0.0, 0.0).distance_to(Point::new(3.0, 4.0));
            assert!((d - 5.0).abs() < f64::EPSILON);
        }

        #[test]
        fn test_point_offset() {
            let p = Point::new(10.0, 20.0).offset(Point::new(5.0, -5.0));
            assert_eq!(p, Point::new(15.0, 15.0));
        }
    }

    mod bounding_box_tests {
        use super::*;

        #[test]
        fn test_box_edges() {
            let rect = BoundingBox::new(10.0, 20.0, 100.0, 50.0);
            assert_eq!(rect.left(), 10.0);
            assert_eq!(rect.top(), 20.0);
            assert_eq!(rect.right(), 110.0);
            assert_eq!(rect.bottom(), 70.0);
        }

        #[test]
        fn test_box_contains_edges_inclusive() {
            let rect = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
            assert!(rect.contains(Point::new(0.0, 0.0)));
            assert!(rect.contains(Point::new(10.0, 10.0)));
            assert!(!rect.contains(Point::new(10.1, 5.0)));
        }
    }

    mod anchor_tests {
        use super::*;

        fn rect() -> BoundingBox {
            BoundingBox::new(100.0, 200.0, 40.0, 20.0)
        }

        #[test]
        fn test_center_anchor() {
            assert_eq!(Anchor::Center.resolve(&rect()), Point::new(120.0, 210.0));
        }

        #[test]
        fn test_edge_anchors() {
            assert_eq!(Anchor::Top.resolve(&rect()), Point::new(120.0, 200.0));
            assert_eq!(Anchor::Bottom.resolve(&rect()), Point::new(120.0, 220.0));
            assert_eq!(Anchor::Left.resolve(&rect()), Point::new(100.0, 210.0));
            assert_eq!(Anchor::Right.resolve(&rect()), Point::new(140.0, 210.0));
        }

        #[test]
        fn test_corner_anchors() {
            assert_eq!(Anchor::TopLeft.resolve(&rect()), Point::new(100.0, 200.0));
            assert_eq!(Anchor::TopRight.resolve(&rect()), Point::new(140.0, 200.0));
            assert_eq!(
                Anchor::BottomLeft.resolve(&rect()),
                Point::new(100.0, 220.0)
            );
            assert_eq!(
                Anchor::BottomRight.resolve(&rect()),
                Point::new(140.0, 220.0)
            );
        }

        #[test]
        fn test_every_anchor_lies_on_box() {
            for anchor in Anchor::ALL {
                assert!(rect().contains(anchor.resolve(&rect())), "{anchor}");
            }
        }

        #[test]
        fn test_anchor_from_str() {
            assert_eq!("top-left".parse::<Anchor>().unwrap(), Anchor::TopLeft);
            assert!("middle".parse::<Anchor>().is_err());
        }

        #[test]
        fn test_anchor_serde_kebab_case() {
            let anchor: Anchor = serde_json::from_str("\"bottom-right\"").unwrap();
            assert_eq!(anchor, Anchor::BottomRight);
            assert_eq!(serde_json::to_string(&Anchor::TopRight).unwrap(), "\"top-right\"");
        }
    }
}
