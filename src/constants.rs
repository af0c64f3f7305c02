//! Global constants for imglabel

/// Hit radius for grabbing a vertex of the selected shape (image pixels at 1x zoom).
pub const VERTEX_HIT_RADIUS: f32 = 10.0;

/// Distance threshold for closing a polygon by clicking near its first vertex.
pub const POLYGON_CLOSE_THRESHOLD: f32 = 15.0;

/// Distance from a shape's outline that still counts as hitting the shape.
pub const STROKE_TOLERANCE: f32 = 3.0;

/// Smallest zoom factor used when scaling hit radii.
pub const MIN_HIT_SCALE: f32 = 0.1;

/// Offset applied to a duplicated shape so it does not hide the original.
pub const DUPLICATE_OFFSET: f32 = 10.0;

/// Distance a shape moves per arrow-key press.
pub const NUDGE_STEP: f32 = 1.0;

/// Name of the class list written beside normalized-text annotations.
pub const CLASSES_FILENAME: &str = "classes.txt";
