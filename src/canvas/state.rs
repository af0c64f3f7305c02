//! Interaction states of the canvas.

use crate::model::{Point, Shape, ShapeId};

/// Kind of shape a create request produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CreateMode {
    /// Free polygon, closed explicitly or by clicking near the first vertex.
    #[default]
    Polygon,
    /// Axis-aligned box from two opposite corners.
    Rectangle,
}

/// What the canvas is doing between pointer events.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum InteractionState {
    /// Waiting for a create request or a click on a shape.
    #[default]
    Idle,
    /// Building a new shape.
    Creating {
        mode: CreateMode,
        label: String,
        /// The shape so far, `None` until the first click.
        shape: Option<Shape>,
        /// Last pointer position, for previews.
        cursor: Option<Point>,
    },
    /// Moving one vertex of the selected shape.
    DraggingVertex {
        shape_id: ShapeId,
        vertex: usize,
        start: Point,
        /// Vertices at drag start, restored if the drag is abandoned.
        original: Vec<Point>,
    },
    /// Moving the whole selected shape.
    DraggingShape {
        shape_id: ShapeId,
        start: Point,
        /// Vertices at drag start, restored if the drag is abandoned.
        original: Vec<Point>,
    },
}

impl InteractionState {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            InteractionState::Idle => "idle",
            InteractionState::Creating { .. } => "creating",
            InteractionState::DraggingVertex { .. } => "dragging-vertex",
            InteractionState::DraggingShape { .. } => "dragging-shape",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionState::Idle)
    }

    pub fn is_creating(&self) -> bool {
        matches!(self, InteractionState::Creating { .. })
    }

    pub fn is_dragging(&self) -> bool {
        matches!(
            self,
            InteractionState::DraggingVertex { .. } | InteractionState::DraggingShape { .. }
        )
    }

    /// The in-progress shape while creating.
    pub fn pending_shape(&self) -> Option<&Shape> {
        match self {
            InteractionState::Creating { shape, .. } => shape.as_ref(),
            _ => None,
        }
    }

    /// Id of the shape being dragged.
    pub fn dragged_shape(&self) -> Option<ShapeId> {
        match self {
            InteractionState::DraggingVertex { shape_id, .. }
            | InteractionState::DraggingShape { shape_id, .. } => Some(*shape_id),
            _ => None,
        }
    }
}
