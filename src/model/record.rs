//! Interchange snapshot of a shape, as seen by the format codecs.

use crate::color_utils::Rgba;
use crate::model::geometry::{BoundingBox, Point};

/// A shape snapshot decoupled from editor state.
///
/// Codecs only ever see records, never live shapes, so transient state such as
/// selection or visibility cannot leak into a file.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationRecord {
    pub label: String,
    pub difficult: bool,
    /// Vertices in drawing order.
    pub points: Vec<Point>,
    pub line_color: Option<Rgba>,
    pub fill_color: Option<Rgba>,
}

impl AnnotationRecord {
    pub fn new(label: impl Into<String>, points: Vec<Point>) -> Self {
        Self {
            label: label.into(),
            difficult: false,
            points,
            line_color: None,
            fill_color: None,
        }
    }

    /// Record for an axis-aligned box, as every codec produces on decode.
    pub fn rectangle(label: impl Into<String>, bbox: BoundingBox) -> Self {
        Self::new(label, bbox.corners().to_vec())
    }

    pub fn with_difficult(mut self, difficult: bool) -> Self {
        self.difficult = difficult;
        self
    }

    pub fn with_colors(mut self, line_color: Rgba, fill_color: Rgba) -> Self {
        self.line_color = Some(line_color);
        self.fill_color = Some(fill_color);
        self
    }

    /// Bounding box of the points, `None` when the record has no points.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::enclosing(&self.points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_record_has_four_points() {
        let record = AnnotationRecord::rectangle("car", BoundingBox::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(record.points.len(), 4);
        assert_eq!(record.bounding_box(), Some(BoundingBox::new(1.0, 2.0, 3.0, 4.0)));
        assert!(!record.difficult);
    }

    #[test]
    fn test_empty_record_has_no_box() {
        let record = AnnotationRecord::new("car", Vec::new());
        assert!(record.bounding_box().is_none());
    }
}
