use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Point) -> f64 {
        (other - self).length()
    }

    /// Unit vector in the same direction, or `None` for a (near) zero vector.
    pub fn normalized(self) -> Option<Point> {
        let len = self.length();
        (len > f64::EPSILON).then(|| Point::new(self.x / len, self.y / len))
    }

    /// Counter-clockwise perpendicular.
    pub fn perpendicular(self) -> Point {
        Point::new(-self.y, self.x)
    }

    pub fn lerp(self, to: Point, t: f64) -> Point {
        self + (to - self) * t
    }

    pub fn midpoint(self, other: Point) -> Point {
        self.lerp(other, 0.5)
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// A straight edge clipped to the borders of the two discs it connects.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeGeometry {
    pub start: Point,
    pub end: Point,
    /// Unit vector from `start` to `end`.
    pub direction: Point,
}

impl EdgeGeometry {
    /// Clip the segment between two centres by `radius` at both ends.
    /// Returns `None` when the discs overlap and no visible segment remains.
    pub fn between(from: Point, to: Point, radius: f64) -> Option<Self> {
        let direction = (to - from).normalized()?;
        if from.distance(to) <= 2.0 * radius {
            return None;
        }
        Some(Self {
            start: from + direction * radius,
            end: to - direction * radius,
            direction,
        })
    }

    pub fn midpoint(&self) -> Point {
        self.start.midpoint(self.end)
    }

    /// Isosceles arrowhead: apex at `end`, base `length` back along the edge
    /// and `half_width` out on either side.
    pub fn arrowhead(&self, length: f64, half_width: f64) -> [Point; 3] {
        let base = self.end - self.direction * length;
        let normal = self.direction.perpendicular() * half_width;
        [self.end, base + normal, base - normal]
    }
}
