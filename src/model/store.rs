//! Arena of live shapes keyed by stable ids.

use std::collections::BTreeMap;
use std::fmt;

use crate::model::geometry::Point;
use crate::model::record::AnnotationRecord;
use crate::model::shape::Shape;

/// Stable identifier of a shape in a [`ShapeStore`].
///
/// Ids are handed out in increasing order and never reused, so id order is
/// creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShapeId(u32);

impl ShapeId {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Storage for the shapes of a single image.
#[derive(Debug, Clone, Default)]
pub struct ShapeStore {
    shapes: BTreeMap<ShapeId, Shape>,
    next_id: u32,
    selected_id: Option<ShapeId>,
}

impl ShapeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a shape and return its id.
    pub fn add(&mut self, mut shape: Shape) -> ShapeId {
        let id = ShapeId(self.next_id);
        self.next_id += 1;
        shape.selected = false;
        self.shapes.insert(id, shape);
        id
    }

    /// Remove a shape by id, clearing the selection if it pointed there.
    pub fn remove(&mut self, id: ShapeId) -> Option<Shape> {
        if self.selected_id == Some(id) {
            self.selected_id = None;
        }
        self.shapes.remove(&id).map(|mut shape| {
            shape.selected = false;
            shape
        })
    }

    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(&id)
    }

    pub fn get_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.get_mut(&id)
    }

    /// All shapes in creation order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (ShapeId, &Shape)> {
        self.shapes.iter().map(|(id, shape)| (*id, shape))
    }

    pub fn ids(&self) -> Vec<ShapeId> {
        self.shapes.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Clear all shapes. Ids keep counting up.
    pub fn clear(&mut self) {
        self.shapes.clear();
        self.selected_id = None;
    }

    /// Select a shape, or clear the selection with `None`.
    ///
    /// Returns whether the selection changed. Unknown ids clear the selection.
    pub fn select(&mut self, id: Option<ShapeId>) -> bool {
        let id = id.filter(|id| self.shapes.contains_key(id));
        if self.selected_id == id {
            return false;
        }

        if let Some(old) = self.selected_id.and_then(|old| self.shapes.get_mut(&old)) {
            old.selected = false;
        }
        if let Some(new) = id.and_then(|new| self.shapes.get_mut(&new)) {
            new.selected = true;
        }
        self.selected_id = id;
        true
    }

    /// Get the selected shape id.
    pub fn selected(&self) -> Option<ShapeId> {
        self.selected_id
    }

    pub fn selected_shape(&self) -> Option<&Shape> {
        self.selected_id.and_then(|id| self.shapes.get(&id))
    }

    /// Find the topmost visible shape at `point`.
    ///
    /// Later shapes are drawn on top, so they are tested first.
    pub fn hit_test(&self, point: &Point, stroke_tolerance: f32) -> Option<ShapeId> {
        self.shapes
            .iter()
            .rev()
            .filter(|(_, shape)| shape.visible)
            .find(|(_, shape)| shape.hit(point, stroke_tolerance))
            .map(|(id, _)| *id)
    }

    /// Snapshot every closed shape for saving.
    pub fn records(&self) -> Vec<AnnotationRecord> {
        self.shapes
            .values()
            .filter(|shape| shape.is_closed())
            .map(Shape::to_record)
            .collect()
    }
}
