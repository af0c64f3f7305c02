//! Data models for imglabel: geometry, shapes and the session class list.

mod class_registry;
mod geometry;
mod record;
mod shape;
mod store;

pub use class_registry::ClassRegistry;
pub use geometry::{BoundingBox, Point, distance_to_segment, snap_point_to_canvas};
pub use record::AnnotationRecord;
pub use shape::{GeometryError, MIN_CLOSED_VERTICES, Shape, ShapeStyle};
pub use store::{ShapeId, ShapeStore};
