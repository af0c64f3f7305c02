//! Core geometry types and free-standing geometric helpers.

/// A 2D point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Squared distance to another point.
    pub fn distance_squared(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Calculate distance to another point.
    pub fn distance_to(&self, other: &Point) -> f32 {
        self.distance_squared(other).sqrt()
    }

    /// This point translated by `(dx, dy)`.
    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned bounding box stored as its extreme coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl BoundingBox {
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Create a bounding box from two opposite corner points, in any order.
    pub fn from_corners(p1: Point, p2: Point) -> Self {
        Self {
            min_x: p1.x.min(p2.x),
            min_y: p1.y.min(p2.y),
            max_x: p1.x.max(p2.x),
            max_y: p1.y.max(p2.y),
        }
    }

    /// Create a bounding box from its center and size.
    pub fn from_center(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self {
            min_x: cx - width / 2.0,
            min_y: cy - height / 2.0,
            max_x: cx + width / 2.0,
            max_y: cy + height / 2.0,
        }
    }

    /// Smallest box containing every point, or `None` for an empty slice.
    pub fn enclosing(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut bbox = Self::new(first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            bbox.min_x = bbox.min_x.min(p.x);
            bbox.min_y = bbox.min_y.min(p.y);
            bbox.max_x = bbox.max_x.max(p.x);
            bbox.max_y = bbox.max_y.max(p.y);
        }
        Some(bbox)
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    /// Get the center point of the box.
    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// The four corners, clockwise from the top-left in image coordinates.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.min_x, self.min_y),
            Point::new(self.max_x, self.min_y),
            Point::new(self.max_x, self.max_y),
            Point::new(self.min_x, self.max_y),
        ]
    }

    /// Check if a point is inside the box (edges included).
    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }
}

/// Clamp `(x, y)` into `[0, width] x [0, height]`.
///
/// Returns the clamped point and whether clamping changed it.
pub fn snap_point_to_canvas(x: f32, y: f32, width: f32, height: f32) -> (Point, bool) {
    let clamped = Point::new(x.clamp(0.0, width.max(0.0)), y.clamp(0.0, height.max(0.0)));
    let snapped = clamped.x != x || clamped.y != y;
    (clamped, snapped)
}

/// Shortest distance from `point` to the segment `a`-`b`.
pub fn distance_to_segment(point: &Point, a: &Point, b: &Point) -> f32 {
    let abx = b.x - a.x;
    let aby = b.y - a.y;
    let len_sq = abx * abx + aby * aby;
    if len_sq == 0.0 {
        return point.distance_to(a);
    }

    let t = (((point.x - a.x) * abx + (point.y - a.y) * aby) / len_sq).clamp(0.0, 1.0);
    let projection = Point::new(a.x + t * abx, a.y + t * aby);
    point.distance_to(&projection)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_distance() {
        let p1 = Point::new(0.0, 0.0);
        let p2 = Point::new(3.0, 4.0);
        assert!((p1.distance_to(&p2) - 5.0).abs() < 0.001);
        assert!((p1.distance_squared(&p2) - 25.0).abs() < 0.001);
    }

    #[test]
    fn test_bounding_box_from_corners() {
        let bbox = BoundingBox::from_corners(Point::new(50.0, 80.0), Point::new(10.0, 20.0));
        assert_eq!(bbox, BoundingBox::new(10.0, 20.0, 50.0, 80.0));
        assert_eq!(bbox.width(), 40.0);
        assert_eq!(bbox.height(), 60.0);
        assert_eq!(bbox.center(), Point::new(30.0, 50.0));
    }

    #[test]
    fn test_bounding_box_from_center() {
        let bbox = BoundingBox::from_center(150.0, 130.0, 100.0, 60.0);
        assert_eq!(bbox, BoundingBox::new(100.0, 100.0, 200.0, 160.0));
    }

    #[test]
    fn test_enclosing_box() {
        let points = [
            Point::new(5.0, 9.0),
            Point::new(-2.0, 4.0),
            Point::new(7.0, 1.0),
        ];
        let bbox = BoundingBox::enclosing(&points).unwrap();
        assert_eq!(bbox, BoundingBox::new(-2.0, 1.0, 7.0, 9.0));
        assert!(BoundingBox::enclosing(&[]).is_none());
    }

    #[test]
    fn test_snap_point_outside() {
        let (p, snapped) = snap_point_to_canvas(-5.0, 50.0, 100.0, 100.0);
        assert_eq!(p, Point::new(0.0, 50.0));
        assert!(snapped);

        let (p, snapped) = snap_point_to_canvas(120.0, 130.0, 100.0, 100.0);
        assert_eq!(p, Point::new(100.0, 100.0));
        assert!(snapped);
    }

    #[test]
    fn test_snap_point_inside() {
        let (p, snapped) = snap_point_to_canvas(50.0, 50.0, 100.0, 100.0);
        assert_eq!(p, Point::new(50.0, 50.0));
        assert!(!snapped);

        // Points exactly on the border are already inside
        let (_, snapped) = snap_point_to_canvas(100.0, 0.0, 100.0, 100.0);
        assert!(!snapped);
    }

    #[test]
    fn test_distance_to_segment() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert!((distance_to_segment(&Point::new(5.0, 3.0), &a, &b) - 3.0).abs() < 0.001);
        assert!((distance_to_segment(&Point::new(13.0, 4.0), &a, &b) - 5.0).abs() < 0.001);
        assert!((distance_to_segment(&Point::new(1.0, 1.0), &a, &a) - 2f32.sqrt()).abs() < 0.001);
    }
}
