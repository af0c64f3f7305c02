//! Notifications and key input of the canvas.

use crate::model::ShapeId;

/// Change notification, queued synchronously after each mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasEvent {
    ShapeCreated(ShapeId),
    ShapeModified(ShapeId),
    ShapeRemoved(ShapeId),
    SelectionChanged(Option<ShapeId>),
}

/// Keys the canvas reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasKey {
    /// Cancel creation or an active drag.
    Escape,
    /// Close the polygon being created.
    Enter,
    /// Delete the selected shape.
    Delete,
    Left,
    Right,
    Up,
    Down,
}

impl CanvasKey {
    /// Unit direction for arrow keys, in image coordinates.
    pub fn direction(&self) -> Option<(f32, f32)> {
        match self {
            CanvasKey::Left => Some((-1.0, 0.0)),
            CanvasKey::Right => Some((1.0, 0.0)),
            CanvasKey::Up => Some((0.0, -1.0)),
            CanvasKey::Down => Some((0.0, 1.0)),
            _ => None,
        }
    }
}
