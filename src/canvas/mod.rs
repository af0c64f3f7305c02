//! Interaction state machine for the annotation canvas.
//!
//! [`Canvas`] owns the live shapes of one image and turns discrete pointer and
//! key events into shape mutations. Every event is handled to completion before
//! the next one; change notifications are queued synchronously and collected
//! with [`Canvas::drain_events`].
//!
//! States:
//! - `Idle`: a click selects the topmost shape under the pointer and starts
//!   dragging it, or grabs a vertex of the already selected shape.
//! - `Creating`: each click adds a vertex. Rectangles close on the second
//!   click; polygons close on Enter or on a click near the first vertex.
//! - `DraggingVertex` / `DraggingShape`: every move is applied immediately.
//!   Pointer-up commits and marks the document dirty. Losing the pointer
//!   (or Escape) reverts the shape to its drag-start geometry.

mod event;
mod state;


pub use event::{CanvasEvent, CanvasKey};
pub use state::{CreateMode, InteractionState};

use crate::constants::{
    DUPLICATE_OFFSET, MIN_HIT_SCALE, NUDGE_STEP, POLYGON_CLOSE_THRESHOLD, STROKE_TOLERANCE,
    VERTEX_HIT_RADIUS,
};
use crate::format::ImageSize;
use crate::model::{
    AnnotationRecord, BoundingBox, GeometryError, MIN_CLOSED_VERTICES, Point, Shape, ShapeId,
    ShapeStore, ShapeStyle, snap_point_to_canvas,
};

/// Hit-testing distances, in image pixels at 1x zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasConfig {
    /// Radius for grabbing a vertex of the selected shape.
    pub vertex_hit_radius: f32,
    /// Distance to the first vertex that closes a polygon.
    pub close_threshold: f32,
    /// Distance to an outline that still hits the shape.
    pub stroke_tolerance: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            vertex_hit_radius: VERTEX_HIT_RADIUS,
            close_threshold: POLYGON_CLOSE_THRESHOLD,
            stroke_tolerance: STROKE_TOLERANCE,
        }
    }
}

/// Live shapes of one image plus the interaction state driving them.
#[derive(Debug, Clone)]
pub struct Canvas {
    store: ShapeStore,
    state: InteractionState,
    config: CanvasConfig,
    /// Style for new shapes; `None` derives colors from the label.
    style: Option<ShapeStyle>,
    image_size: Option<ImageSize>,
    /// Zoom factor; hit radii shrink as it grows.
    scale: f32,
    draw_square: bool,
    dirty: bool,
    events: Vec<CanvasEvent>,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(CanvasConfig::default())
    }
}

impl Canvas {
    pub fn new(config: CanvasConfig) -> Self {
        Self {
            store: ShapeStore::new(),
            state: InteractionState::Idle,
            config,
            style: None,
            image_size: None,
            scale: 1.0,
            draw_square: false,
            dirty: false,
            events: Vec::new(),
        }
    }

    pub fn with_style(mut self, style: ShapeStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn set_style(&mut self, style: Option<ShapeStyle>) {
        self.style = style;
    }

    /// Bound for clamping points and drags. `None` disables clamping.
    pub fn set_image_size(&mut self, size: Option<ImageSize>) {
        self.image_size = size.filter(ImageSize::is_valid);
    }

    /// Set the zoom factor. Non-positive values are ignored.
    pub fn set_scale(&mut self, scale: f32) {
        if scale.is_finite() && scale > 0.0 {
            self.scale = scale;
        }
    }

    pub fn set_draw_square(&mut self, draw_square: bool) {
        self.draw_square = draw_square;
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn shapes(&self) -> &ShapeStore {
        &self.store
    }

    /// Current shapes in creation order.
    pub fn get_shapes(&self) -> Vec<(ShapeId, &Shape)> {
        self.store.iter().collect()
    }

    pub fn selected(&self) -> Option<ShapeId> {
        self.store.selected()
    }

    /// Whether shapes changed since the last [`mark_clean`](Self::mark_clean).
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Take all queued notifications, oldest first.
    pub fn drain_events(&mut self) -> Vec<CanvasEvent> {
        std::mem::take(&mut self.events)
    }

    /// Snapshot every closed shape for saving.
    pub fn records(&self) -> Vec<AnnotationRecord> {
        self.store.records()
    }

    // ---------------------------------------------------------------------
    // Shape list management
    // ---------------------------------------------------------------------

    /// Add a finished shape.
    pub fn add_shape(&mut self, shape: Shape) -> ShapeId {
        self.insert(shape)
    }

    /// Remove a shape, returning it if it existed.
    pub fn remove_shape(&mut self, id: ShapeId) -> Option<Shape> {
        if self.state.dragged_shape() == Some(id) {
            self.state = InteractionState::Idle;
        }

        let was_selected = self.store.selected() == Some(id);
        let removed = self.store.remove(id)?;
        if was_selected {
            self.events.push(CanvasEvent::SelectionChanged(None));
        }
        self.events.push(CanvasEvent::ShapeRemoved(id));
        self.dirty = true;
        log::debug!("Removed shape {} '{}'", id, removed.label());
        Some(removed)
    }

    /// Replace all shapes with shapes built from decoded records.
    ///
    /// Points outside the image are snapped onto it, and the canvas is dirty
    /// afterwards only if that happened. Nothing changes if any record cannot
    /// form a closed shape.
    pub fn load_shapes(&mut self, records: &[AnnotationRecord]) -> Result<Vec<ShapeId>, GeometryError> {
        let mut snapped_any = false;
        let mut shapes = Vec::with_capacity(records.len());

        for record in records {
            let mut record = record.clone();
            for point in &mut record.points {
                let (clamped, snapped) = clamp_point(self.image_size, *point);
                *point = clamped;
                snapped_any |= snapped;
            }
            shapes.push(Shape::from_record(&record)?);
        }

        self.state = InteractionState::Idle;
        if self.store.selected().is_some() {
            self.events.push(CanvasEvent::SelectionChanged(None));
        }
        for id in self.store.ids() {
            self.events.push(CanvasEvent::ShapeRemoved(id));
        }
        self.store.clear();

        let ids: Vec<ShapeId> = shapes
            .into_iter()
            .map(|shape| {
                let id = self.store.add(shape);
                self.events.push(CanvasEvent::ShapeCreated(id));
                id
            })
            .collect();

        self.dirty = snapped_any;
        if snapped_any {
            log::warn!("Snapped out-of-image points onto the image while loading");
        }
        log::info!("Loaded {} shapes", ids.len());
        Ok(ids)
    }

    /// Select a shape, or clear the selection with `None`.
    pub fn select(&mut self, id: Option<ShapeId>) -> bool {
        let changed = self.store.select(id);
        if changed {
            self.events.push(CanvasEvent::SelectionChanged(self.store.selected()));
        }
        changed
    }

    /// Change a shape's label. Returns `false` for unknown ids.
    pub fn relabel(&mut self, id: ShapeId, label: &str) -> Result<bool, GeometryError> {
        let Some(shape) = self.store.get_mut(id) else {
            return Ok(false);
        };
        if shape.label() == label {
            return Ok(true);
        }
        shape.set_label(label)?;
        self.modified(id);
        Ok(true)
    }

    /// Set a shape's difficult flag. Returns `false` for unknown ids.
    pub fn set_difficult(&mut self, id: ShapeId, difficult: bool) -> bool {
        let Some(shape) = self.store.get_mut(id) else {
            return false;
        };
        if shape.difficult != difficult {
            shape.difficult = difficult;
            self.modified(id);
        }
        true
    }

    /// Show or hide a shape. Hidden shapes cannot be selected or dragged.
    pub fn set_shape_visible(&mut self, id: ShapeId, visible: bool) -> bool {
        if self.store.get(id).is_none() {
            return false;
        }
        if !visible {
            if self.state.dragged_shape() == Some(id) {
                self.revert_drag();
            }
            if self.store.selected() == Some(id) {
                self.select(None);
            }
        }
        if let Some(shape) = self.store.get_mut(id) {
            shape.visible = visible;
        }
        true
    }

    /// Copy the selected shape, offset so both stay visible, and select the copy.
    pub fn duplicate_selected(&mut self) -> Option<ShapeId> {
        if !self.state.is_idle() {
            return None;
        }

        let mut copy = self.store.selected_shape()?.clone();
        let (dx, dy) = bounded_delta(
            self.image_size,
            &copy.bounding_box(),
            DUPLICATE_OFFSET,
            DUPLICATE_OFFSET,
        );
        copy.move_by(dx, dy);

        let id = self.insert(copy);
        self.select(Some(id));
        Some(id)
    }

    /// Remove the selected shape.
    pub fn delete_selected(&mut self) -> Option<Shape> {
        let id = self.store.selected()?;
        self.remove_shape(id)
    }

    // ---------------------------------------------------------------------
    // Creation
    // ---------------------------------------------------------------------

    /// Start creating a shape with `label`.
    ///
    /// Only valid while idle; returns `Ok(false)` otherwise.
    pub fn begin_create(&mut self, mode: CreateMode, label: &str) -> Result<bool, GeometryError> {
        if label.is_empty() {
            return Err(GeometryError::EmptyLabel);
        }
        if !self.state.is_idle() {
            log::debug!("Ignoring create request in state {}", self.state.name());
            return Ok(false);
        }

        self.select(None);
        self.state = InteractionState::Creating {
            mode,
            label: label.to_string(),
            shape: None,
            cursor: None,
        };
        log::debug!("Creating {:?} '{}'", mode, label);
        Ok(true)
    }

    /// Close the polygon being created.
    ///
    /// Fails with [`GeometryError::TooFewVertices`] and keeps creating when the
    /// polygon is too short. Returns `Ok(None)` when there is no polygon to
    /// close.
    pub fn close_shape(&mut self) -> Result<Option<ShapeId>, GeometryError> {
        let InteractionState::Creating {
            mode: CreateMode::Polygon,
            shape,
            ..
        } = &mut self.state
        else {
            return Ok(None);
        };
        let Some(pending) = shape.as_mut() else {
            return Err(GeometryError::TooFewVertices { count: 0 });
        };

        pending.close()?;
        let finished = shape.take();
        Ok(finished.map(|shape| self.commit(shape)))
    }

    /// Abandon creation or an active drag. Returns whether anything was cancelled.
    pub fn cancel(&mut self) -> bool {
        match self.state {
            InteractionState::Creating { .. } => {
                self.state = InteractionState::Idle;
                log::debug!("Creation cancelled");
                true
            }
            InteractionState::DraggingVertex { .. } | InteractionState::DraggingShape { .. } => {
                self.revert_drag()
            }
            InteractionState::Idle => false,
        }
    }

    // ---------------------------------------------------------------------
    // Pointer and key input
    // ---------------------------------------------------------------------

    pub fn pointer_down(&mut self, point: Point) -> Result<(), GeometryError> {
        log::trace!(
            "Pointer down at ({:.1}, {:.1}) in {}",
            point.x,
            point.y,
            self.state.name()
        );

        if self.state.is_idle() {
            self.begin_edit(point);
            return Ok(());
        }

        let (point, _) = clamp_point(self.image_size, point);
        let close_radius = self.scaled(self.config.close_threshold);
        let draw_square = self.draw_square;
        let default_style = self.style;

        let InteractionState::Creating {
            mode,
            label,
            shape,
            cursor,
        } = &mut self.state
        else {
            return Ok(());
        };
        *cursor = Some(point);

        if shape.is_none() {
            let style = default_style.unwrap_or_else(|| ShapeStyle::for_label(label));
            *shape = Some(Shape::new(label.clone(), point, style)?);
            return Ok(());
        }
        let Some(pending) = shape.as_mut() else {
            return Ok(());
        };
        let first = pending.vertices()[0];

        let finished = match mode {
            CreateMode::Rectangle => {
                let opposite = if draw_square {
                    square_corner(first, point)
                } else {
                    point
                };
                if first.x == opposite.x || first.y == opposite.y {
                    log::debug!("Ignoring zero-area rectangle corner");
                    return Ok(());
                }
                let style = ShapeStyle {
                    line_color: pending.line_color,
                    fill_color: pending.fill_color,
                };
                Shape::rectangle(label.clone(), first, opposite, style)?
            }
            CreateMode::Polygon => {
                let near_first = first.distance_to(&point) <= close_radius;
                if near_first && pending.vertices().len() >= MIN_CLOSED_VERTICES {
                    pending.close()?;
                } else {
                    pending.add_point(point)?;
                    return Ok(());
                }
                match shape.take() {
                    Some(closed) => closed,
                    None => return Ok(()),
                }
            }
        };

        self.commit(finished);
        Ok(())
    }

    /// Apply pointer movement to the active drag, or track the creation cursor.
    ///
    /// Drags are recomputed from the drag-start geometry and kept inside the
    /// image.
    pub fn pointer_move(&mut self, point: Point) -> Result<(), GeometryError> {
        log::trace!("Pointer move to ({:.1}, {:.1})", point.x, point.y);

        let image_size = self.image_size;
        match &mut self.state {
            InteractionState::Idle => Ok(()),
            InteractionState::Creating { cursor, .. } => {
                *cursor = Some(clamp_point(image_size, point).0);
                Ok(())
            }
            InteractionState::DraggingVertex {
                shape_id,
                vertex,
                start,
                original,
            } => {
                let (id, vertex) = (*shape_id, *vertex);
                let origin = *original.get(vertex).ok_or(GeometryError::IndexOutOfRange {
                    index: vertex,
                    len: original.len(),
                })?;
                let (target, _) = clamp_point(
                    image_size,
                    origin.offset(point.x - start.x, point.y - start.y),
                );

                let Some(shape) = self.store.get_mut(id) else {
                    self.state = InteractionState::Idle;
                    return Ok(());
                };
                if shape.vertices().get(vertex) == Some(&target) {
                    return Ok(());
                }
                shape.restore_vertices(original);
                shape.move_vertex(vertex, target.x - origin.x, target.y - origin.y)?;
                self.events.push(CanvasEvent::ShapeModified(id));
                Ok(())
            }
            InteractionState::DraggingShape {
                shape_id,
                start,
                original,
            } => {
                let id = *shape_id;
                let bbox = BoundingBox::enclosing(original)
                    .ok_or(GeometryError::TooFewVertices { count: 0 })?;
                let (dx, dy) = bounded_delta(image_size, &bbox, point.x - start.x, point.y - start.y);

                let Some(shape) = self.store.get_mut(id) else {
                    self.state = InteractionState::Idle;
                    return Ok(());
                };
                if shape.vertices().first() == original.first().map(|v| v.offset(dx, dy)).as_ref() {
                    return Ok(());
                }
                shape.restore_vertices(original);
                shape.move_by(dx, dy);
                self.events.push(CanvasEvent::ShapeModified(id));
                Ok(())
            }
        }
    }

    /// Finish a drag at `point`.
    pub fn pointer_up(&mut self, point: Point) -> Result<(), GeometryError> {
        if !self.state.is_dragging() {
            return Ok(());
        }
        self.pointer_move(point)?;

        match std::mem::take(&mut self.state) {
            InteractionState::DraggingVertex {
                shape_id, original, ..
            }
            | InteractionState::DraggingShape {
                shape_id, original, ..
            } => {
                let moved = self
                    .store
                    .get(shape_id)
                    .is_some_and(|shape| shape.vertices() != original.as_slice());
                if moved {
                    self.dirty = true;
                    log::debug!("Finished moving shape {}", shape_id);
                }
            }
            other => self.state = other,
        }
        Ok(())
    }

    /// The pointer left the canvas: an active drag is reverted.
    pub fn pointer_leave(&mut self) {
        if self.state.is_dragging() {
            self.revert_drag();
        }
    }

    /// Handle a key press. Returns whether the key did anything.
    pub fn key_press(&mut self, key: CanvasKey) -> bool {
        match key {
            CanvasKey::Escape => self.cancel(),
            CanvasKey::Enter => match self.close_shape() {
                Ok(id) => id.is_some(),
                Err(e) => {
                    log::warn!("Cannot close shape: {}", e);
                    false
                }
            },
            CanvasKey::Delete => self.state.is_idle() && self.delete_selected().is_some(),
            CanvasKey::Left | CanvasKey::Right | CanvasKey::Up | CanvasKey::Down => key
                .direction()
                .is_some_and(|(x, y)| self.nudge_selected(x * NUDGE_STEP, y * NUDGE_STEP)),
        }
    }

    /// Move the selected shape by a small step, kept inside the image.
    pub fn nudge_selected(&mut self, dx: f32, dy: f32) -> bool {
        if !self.state.is_idle() {
            return false;
        }
        let Some(id) = self.store.selected() else {
            return false;
        };
        let image_size = self.image_size;
        let Some(shape) = self.store.get_mut(id) else {
            return false;
        };

        let (dx, dy) = bounded_delta(image_size, &shape.bounding_box(), dx, dy);
        if dx == 0.0 && dy == 0.0 {
            return false;
        }
        shape.move_by(dx, dy);
        self.modified(id);
        true
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    /// Pointer-down while idle: grab a vertex, or select and drag a shape.
    fn begin_edit(&mut self, point: Point) {
        let vertex_radius = self.scaled(self.config.vertex_hit_radius);
        let tolerance = self.scaled(self.config.stroke_tolerance);

        if let Some(id) = self.store.selected() {
            let grabbed = self
                .store
                .get(id)
                .filter(|shape| shape.visible)
                .and_then(|shape| {
                    shape
                        .nearest_vertex(&point, vertex_radius)
                        .map(|vertex| (vertex, shape.vertices().to_vec()))
                });
            if let Some((vertex, original)) = grabbed {
                log::debug!("Dragging vertex {} of shape {}", vertex, id);
                self.state = InteractionState::DraggingVertex {
                    shape_id: id,
                    vertex,
                    start: point,
                    original,
                };
                return;
            }
        }

        let Some(id) = self.store.hit_test(&point, tolerance) else {
            self.select(None);
            return;
        };
        self.select(Some(id));
        if let Some(shape) = self.store.get(id) {
            log::debug!("Dragging shape {}", id);
            self.state = InteractionState::DraggingShape {
                shape_id: id,
                start: point,
                original: shape.vertices().to_vec(),
            };
        }
    }

    /// Restore the dragged shape to its drag-start geometry.
    fn revert_drag(&mut self) -> bool {
        match std::mem::take(&mut self.state) {
            InteractionState::DraggingVertex {
                shape_id, original, ..
            }
            | InteractionState::DraggingShape {
                shape_id, original, ..
            } => {
                if let Some(shape) = self.store.get_mut(shape_id) {
                    if shape.vertices() != original.as_slice() {
                        shape.restore_vertices(&original);
                        self.events.push(CanvasEvent::ShapeModified(shape_id));
                    }
                }
                log::debug!("Drag of shape {} abandoned, reverted", shape_id);
                true
            }
            other => {
                self.state = other;
                false
            }
        }
    }

    /// Store a finished shape and return to idle.
    fn commit(&mut self, shape: Shape) -> ShapeId {
        self.state = InteractionState::Idle;
        self.insert(shape)
    }

    fn insert(&mut self, shape: Shape) -> ShapeId {
        let vertex_count = shape.vertices().len();
        let label = shape.label().to_string();
        let id = self.store.add(shape);
        self.dirty = true;
        self.events.push(CanvasEvent::ShapeCreated(id));
        log::debug!("Created shape {} '{}' with {} vertices", id, label, vertex_count);
        id
    }

    fn modified(&mut self, id: ShapeId) {
        self.dirty = true;
        self.events.push(CanvasEvent::ShapeModified(id));
    }

    /// Screen-space radius converted to image pixels.
    fn scaled(&self, radius: f32) -> f32 {
        radius / self.scale.max(MIN_HIT_SCALE)
    }
}

/// Clamp a point into the image, if its size is known.
fn clamp_point(size: Option<ImageSize>, point: Point) -> (Point, bool) {
    match size {
        Some(size) => snap_point_to_canvas(point.x, point.y, size.width as f32, size.height as f32),
        None => (point, false),
    }
}

/// Limit a translation so a box inside the image stays inside.
///
/// A box already crossing an edge is never pushed further out, nor forced back.
fn bounded_delta(size: Option<ImageSize>, bbox: &BoundingBox, dx: f32, dy: f32) -> (f32, f32) {
    let Some(size) = size else {
        return (dx, dy);
    };
    let bound = |d: f32, min: f32, max: f32, limit: f32| {
        d.max((-min).min(0.0)).min((limit - max).max(0.0))
    };
    (
        bound(dx, bbox.min_x, bbox.max_x, size.width as f32),
        bound(dy, bbox.min_y, bbox.max_y, size.height as f32),
    )
}

/// Opposite corner of the largest square from `corner` towards `point`.
fn square_corner(corner: Point, point: Point) -> Point {
    let dx = point.x - corner.x;
    let dy = point.y - corner.y;
    let side = dx.abs().min(dy.abs());
    Point::new(corner.x + side.copysign(dx), corner.y + side.copysign(dy))
}
