//! Editable polygon annotations and their geometric queries.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color_utils::{Rgba, color_for_label};
use crate::model::geometry::{BoundingBox, Point, distance_to_segment};
use crate::model::record::AnnotationRecord;

/// Minimum number of vertices a shape needs before it can be closed.
pub const MIN_CLOSED_VERTICES: usize = 2;

/// Errors from shape construction and editing.
///
/// A failed operation never leaves the shape partially modified.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Closing needs at least two vertices
    #[error("Shape has {count} vertices, at least 2 are required")]
    TooFewVertices {
        /// Number of vertices the shape had
        count: usize,
    },

    /// Vertex index outside the shape
    #[error("Vertex index {index} out of range for shape with {len} vertices")]
    IndexOutOfRange {
        /// The requested index
        index: usize,
        /// Number of vertices in the shape
        len: usize,
    },

    /// Vertices can only be appended while the shape is open
    #[error("Cannot add a vertex to a closed shape")]
    ShapeClosed,

    /// Shapes must carry a label
    #[error("Shape label must not be empty")]
    EmptyLabel,
}

/// Line and fill colors applied to newly constructed shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeStyle {
    pub line_color: Rgba,
    pub fill_color: Rgba,
}

impl ShapeStyle {
    /// Style derived from the label text, identical for every shape of a class.
    pub fn for_label(label: &str) -> Self {
        let color = color_for_label(label);
        Self {
            line_color: color,
            fill_color: color,
        }
    }
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            line_color: [0, 255, 0, 128],
            fill_color: [255, 0, 0, 128],
        }
    }
}

/// A polygon annotation. Rectangles are closed four-vertex polygons.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    vertices: Vec<Point>,
    closed: bool,
    label: String,
    /// "Hard example" flag.
    pub difficult: bool,
    pub line_color: Rgba,
    pub fill_color: Rgba,
    /// Transient selection state, never persisted.
    pub selected: bool,
    /// Hidden shapes are neither drawn nor hit-tested.
    pub visible: bool,
}

impl Shape {
    /// Start an open shape at `first`.
    pub fn new(label: impl Into<String>, first: Point, style: ShapeStyle) -> Result<Self, GeometryError> {
        let label = label.into();
        if label.is_empty() {
            return Err(GeometryError::EmptyLabel);
        }

        Ok(Self {
            vertices: vec![first],
            closed: false,
            label,
            difficult: false,
            line_color: style.line_color,
            fill_color: style.fill_color,
            selected: false,
            visible: true,
        })
    }

    /// Closed axis-aligned rectangle spanning two opposite corners.
    pub fn rectangle(
        label: impl Into<String>,
        corner: Point,
        opposite: Point,
        style: ShapeStyle,
    ) -> Result<Self, GeometryError> {
        let [first, rest @ ..] = BoundingBox::from_corners(corner, opposite).corners();
        let mut shape = Self::new(label, first, style)?;
        shape.vertices.extend(rest);
        shape.closed = true;
        Ok(shape)
    }

    /// Rebuild a closed shape from a decoded record.
    ///
    /// Missing colors fall back to the label-derived style.
    pub fn from_record(record: &AnnotationRecord) -> Result<Self, GeometryError> {
        let fallback = ShapeStyle::for_label(&record.label);
        let style = ShapeStyle {
            line_color: record.line_color.unwrap_or(fallback.line_color),
            fill_color: record.fill_color.unwrap_or(fallback.fill_color),
        };

        let Some((first, rest)) = record.points.split_first() else {
            return Err(GeometryError::TooFewVertices { count: 0 });
        };

        let mut shape = Self::new(record.label.clone(), *first, style)?;
        shape.vertices.extend_from_slice(rest);
        shape.difficult = record.difficult;
        shape.close()?;
        Ok(shape)
    }

    /// Snapshot for the codecs.
    pub fn to_record(&self) -> AnnotationRecord {
        AnnotationRecord {
            label: self.label.clone(),
            difficult: self.difficult,
            points: self.vertices.clone(),
            line_color: Some(self.line_color),
            fill_color: Some(self.fill_color),
        }
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Change the label. The line color follows the new label.
    pub fn set_label(&mut self, label: impl Into<String>) -> Result<(), GeometryError> {
        let label = label.into();
        if label.is_empty() {
            return Err(GeometryError::EmptyLabel);
        }
        if label != self.label {
            self.line_color = color_for_label(&label);
            self.label = label;
        }
        Ok(())
    }

    /// Append a vertex to an open shape.
    pub fn add_point(&mut self, point: Point) -> Result<(), GeometryError> {
        if self.closed {
            return Err(GeometryError::ShapeClosed);
        }
        self.vertices.push(point);
        Ok(())
    }

    /// Mark the shape closed.
    pub fn close(&mut self) -> Result<(), GeometryError> {
        if self.vertices.len() < MIN_CLOSED_VERTICES {
            return Err(GeometryError::TooFewVertices {
                count: self.vertices.len(),
            });
        }
        self.closed = true;
        Ok(())
    }

    /// Translate every vertex.
    pub fn move_by(&mut self, dx: f32, dy: f32) {
        for v in &mut self.vertices {
            *v = v.offset(dx, dy);
        }
    }

    /// Translate a single vertex.
    pub fn move_vertex(&mut self, index: usize, dx: f32, dy: f32) -> Result<(), GeometryError> {
        let len = self.vertices.len();
        let vertex = self
            .vertices
            .get_mut(index)
            .ok_or(GeometryError::IndexOutOfRange { index, len })?;
        *vertex = vertex.offset(dx, dy);
        Ok(())
    }

    /// Replace every vertex at once, keeping the vertex count.
    ///
    /// Used to restore a snapshot, so the count must match.
    pub(crate) fn restore_vertices(&mut self, vertices: &[Point]) {
        if vertices.len() == self.vertices.len() {
            self.vertices.copy_from_slice(vertices);
        }
    }

    /// Axis-aligned bounding box over all vertices.
    pub fn bounding_box(&self) -> BoundingBox {
        // `vertices` is never empty, so the box always exists
        BoundingBox::enclosing(&self.vertices)
            .unwrap_or_else(|| BoundingBox::new(0.0, 0.0, 0.0, 0.0))
    }

    /// Index of the closest vertex within `threshold` of `point`.
    ///
    /// Ties keep the vertex that was inserted first.
    pub fn nearest_vertex(&self, point: &Point, threshold: f32) -> Option<usize> {
        let limit = threshold * threshold;
        let mut best: Option<(usize, f32)> = None;

        for (i, v) in self.vertices.iter().enumerate() {
            let d = v.distance_squared(point);
            if d > limit {
                continue;
            }
            match best {
                Some((_, best_d)) if d >= best_d => {}
                _ => best = Some((i, d)),
            }
        }

        best.map(|(i, _)| i)
    }

    /// Even-odd point-in-polygon test.
    pub fn contains_point(&self, point: &Point) -> bool {
        let n = self.vertices.len();
        if n < 3 {
            return false;
        }

        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let vi = &self.vertices[i];
            let vj = &self.vertices[j];

            if ((vi.y > point.y) != (vj.y > point.y))
                && (point.x < (vj.x - vi.x) * (point.y - vi.y) / (vj.y - vi.y) + vi.x)
            {
                inside = !inside;
            }
            j = i;
        }

        inside
    }

    /// Shortest distance from `point` to the outline.
    ///
    /// The closing edge only counts once the shape is closed.
    pub fn distance_to_outline(&self, point: &Point) -> f32 {
        let n = self.vertices.len();
        if n == 1 {
            return point.distance_to(&self.vertices[0]);
        }

        let mut best = self
            .vertices
            .windows(2)
            .map(|edge| distance_to_segment(point, &edge[0], &edge[1]))
            .fold(f32::INFINITY, f32::min);

        if self.closed && n > 2 {
            best = best.min(distance_to_segment(point, &self.vertices[n - 1], &self.vertices[0]));
        }

        best
    }

    /// Body or outline hit within `stroke_tolerance`.
    pub fn hit(&self, point: &Point, stroke_tolerance: f32) -> bool {
        self.contains_point(point) || self.distance_to_outline(point) <= stroke_tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Shape {
        let mut shape = Shape::new("box", Point::new(0.0, 0.0), ShapeStyle::default()).unwrap();
        shape.add_point(Point::new(10.0, 0.0)).unwrap();
        shape.add_point(Point::new(10.0, 10.0)).unwrap();
        shape.add_point(Point::new(0.0, 10.0)).unwrap();
        shape.close().unwrap();
        shape
    }

    #[test]
    fn test_empty_label_rejected() {
        let err = Shape::new("", Point::new(0.0, 0.0), ShapeStyle::default()).unwrap_err();
        assert_eq!(err, GeometryError::EmptyLabel);
    }

    #[test]
    fn test_close_needs_two_vertices() {
        let mut shape = Shape::new("a", Point::new(1.0, 1.0), ShapeStyle::default()).unwrap();
        assert_eq!(shape.close(), Err(GeometryError::TooFewVertices { count: 1 }));
        assert!(!shape.is_closed());

        shape.add_point(Point::new(2.0, 2.0)).unwrap();
        assert!(shape.close().is_ok());
        assert!(shape.is_closed());
    }

    #[test]
    fn test_add_point_after_close_fails() {
        let mut shape = square();
        assert_eq!(shape.add_point(Point::new(5.0, 5.0)), Err(GeometryError::ShapeClosed));
        assert_eq!(shape.vertices().len(), 4);
    }

    #[test]
    fn test_move_by() {
        let mut shape = square();
        shape.move_by(5.0, -2.0);
        assert_eq!(shape.bounding_box(), BoundingBox::new(5.0, -2.0, 15.0, 8.0));
    }

    #[test]
    fn test_move_vertex() {
        let mut shape = square();
        shape.move_vertex(2, 5.0, 5.0).unwrap();
        assert_eq!(shape.vertices()[2], Point::new(15.0, 15.0));
    }

    #[test]
    fn test_move_vertex_out_of_range_leaves_shape_unchanged() {
        let mut shape = square();
        let before = shape.clone();
        let err = shape.move_vertex(4, 1.0, 1.0).unwrap_err();
        assert_eq!(err, GeometryError::IndexOutOfRange { index: 4, len: 4 });
        assert_eq!(shape, before);
    }

    #[test]
    fn test_bounding_box_of_open_shape() {
        let mut shape = Shape::new("a", Point::new(3.0, 7.0), ShapeStyle::default()).unwrap();
        assert_eq!(shape.bounding_box(), BoundingBox::new(3.0, 7.0, 3.0, 7.0));
        shape.add_point(Point::new(-1.0, 9.0)).unwrap();
        assert_eq!(shape.bounding_box(), BoundingBox::new(-1.0, 7.0, 3.0, 9.0));
    }

    #[test]
    fn test_nearest_vertex() {
        let shape = square();
        assert_eq!(shape.nearest_vertex(&Point::new(1.0, 1.0), 3.0), Some(0));
        assert_eq!(shape.nearest_vertex(&Point::new(9.0, 9.5), 3.0), Some(2));
        assert_eq!(shape.nearest_vertex(&Point::new(50.0, 50.0), 3.0), None);
    }

    #[test]
    fn test_nearest_vertex_tie_keeps_first() {
        let mut shape = Shape::new("a", Point::new(0.0, 0.0), ShapeStyle::default()).unwrap();
        shape.add_point(Point::new(4.0, 0.0)).unwrap();
        // Equidistant from both vertices
        assert_eq!(shape.nearest_vertex(&Point::new(2.0, 0.0), 3.0), Some(0));
    }

    #[test]
    fn test_contains_point() {
        let shape = square();
        assert!(shape.contains_point(&Point::new(5.0, 5.0)));
        assert!(!shape.contains_point(&Point::new(15.0, 5.0)));
    }

    #[test]
    fn test_contains_point_concave() {
        // U shape: the notch between the arms is outside
        let mut shape = Shape::new("u", Point::new(0.0, 0.0), ShapeStyle::default()).unwrap();
        for (x, y) in [(30.0, 0.0), (30.0, 30.0), (20.0, 30.0), (20.0, 10.0), (10.0, 10.0), (10.0, 30.0), (0.0, 30.0)] {
            shape.add_point(Point::new(x, y)).unwrap();
        }
        shape.close().unwrap();

        assert!(shape.contains_point(&Point::new(5.0, 20.0)));
        assert!(!shape.contains_point(&Point::new(15.0, 20.0)));
    }

    #[test]
    fn test_hit_with_stroke_tolerance() {
        let shape = square();
        assert!(shape.hit(&Point::new(11.0, 5.0), 2.0));
        assert!(!shape.hit(&Point::new(14.0, 5.0), 2.0));
    }

    #[test]
    fn test_rectangle_from_corners() {
        let shape = Shape::rectangle("r", Point::new(20.0, 5.0), Point::new(10.0, 15.0), ShapeStyle::default()).unwrap();
        assert!(shape.is_closed());
        assert_eq!(
            shape.vertices(),
            &[
                Point::new(10.0, 5.0),
                Point::new(20.0, 5.0),
                Point::new(20.0, 15.0),
                Point::new(10.0, 15.0),
            ]
        );
    }

    #[test]
    fn test_record_round_trip_keeps_geometry() {
        let mut shape = square();
        shape.difficult = true;
        shape.selected = true;

        let record = shape.to_record();
        let rebuilt = Shape::from_record(&record).unwrap();
        assert_eq!(rebuilt.vertices(), shape.vertices());
        assert!(rebuilt.difficult);
        assert!(!rebuilt.selected);
    }

    #[test]
    fn test_from_record_defaults_colors_from_label() {
        let record = AnnotationRecord::rectangle("dog", BoundingBox::new(0.0, 0.0, 4.0, 4.0));
        let shape = Shape::from_record(&record).unwrap();
        assert_eq!(shape.line_color, color_for_label("dog"));
        assert_eq!(shape.fill_color, color_for_label("dog"));
    }

    #[test]
    fn test_from_record_rejects_single_point() {
        let record = AnnotationRecord::new("dog", vec![Point::new(1.0, 1.0)]);
        assert_eq!(
            Shape::from_record(&record),
            Err(GeometryError::TooFewVertices { count: 1 })
        );
    }

    #[test]
    fn test_relabel_updates_line_color() {
        let mut shape = square();
        shape.set_label("cat").unwrap();
        assert_eq!(shape.label(), "cat");
        assert_eq!(shape.line_color, color_for_label("cat"));
        assert_eq!(shape.set_label(""), Err(GeometryError::EmptyLabel));
    }
}
