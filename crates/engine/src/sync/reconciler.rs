use std::fmt;

use thiserror::Error;
use tracing::{debug, warn};

use super::drawable::Drawable;
use super::event::UpdateEvent;
use super::records::{CircleRecord, LineRecord, PointRecord, RectangleRecord};
use super::store::{EntityKey, EntityStore, RenderRecord, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Point,
    Line,
    Circle,
    Rectangle,
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GeometryKind::Point => "point",
            GeometryKind::Line => "line",
            GeometryKind::Circle => "circle",
            GeometryKind::Rectangle => "rectangle",
        };
        f.write_str(label)
    }
}

/// Names one entity's drawable to the scene adapter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DrawableHandle {
    pub kind: GeometryKind,
    pub key: EntityKey,
}

impl DrawableHandle {
    pub fn new(kind: GeometryKind, key: EntityKey) -> Self {
        Self { kind, key }
    }
}

/// Rendering collaborator. Notifications are fire-and-forget; the adapter
/// reads current drawables from the mirror on its own refresh cadence.
pub trait SceneAdapter {
    fn attach(&mut self, handle: DrawableHandle);
    fn detach(&mut self, handle: DrawableHandle);
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    #[error("duplicate {kind} entity {key}")]
    DuplicateEntity { kind: GeometryKind, key: EntityKey },
}

/// The four per-kind stores taken together.
#[derive(Debug, Default)]
pub struct SceneMirror {
    points: EntityStore<PointRecord>,
    lines: EntityStore<LineRecord>,
    circles: EntityStore<CircleRecord>,
    rectangles: EntityStore<RectangleRecord>,
}

impl SceneMirror {
    pub fn points(&self) -> &EntityStore<PointRecord> {
        &self.points
    }

    pub fn lines(&self) -> &EntityStore<LineRecord> {
        &self.lines
    }

    pub fn circles(&self) -> &EntityStore<CircleRecord> {
        &self.circles
    }

    pub fn rectangles(&self) -> &EntityStore<RectangleRecord> {
        &self.rectangles
    }

    pub fn entity_count(&self) -> usize {
        self.points.len() + self.lines.len() + self.circles.len() + self.rectangles.len()
    }

    /// Kind-ambiguous lookup, probing stores in the fixed priority order
    /// points, lines, circles, rectangles. The order is a tie-break for
    /// producers that reuse keys across kinds, not semantics.
    pub fn kind_of(&self, key: &EntityKey) -> Option<GeometryKind> {
        if self.points.contains(key) {
            Some(GeometryKind::Point)
        } else if self.lines.contains(key) {
            Some(GeometryKind::Line)
        } else if self.circles.contains(key) {
            Some(GeometryKind::Circle)
        } else if self.rectangles.contains(key) {
            Some(GeometryKind::Rectangle)
        } else {
            None
        }
    }

    pub fn drawable(&self, handle: &DrawableHandle) -> Option<&Drawable> {
        match handle.kind {
            GeometryKind::Point => self.points.get(&handle.key).map(RenderRecord::drawable),
            GeometryKind::Line => self.lines.get(&handle.key).map(RenderRecord::drawable),
            GeometryKind::Circle => self.circles.get(&handle.key).map(RenderRecord::drawable),
            GeometryKind::Rectangle => {
                self.rectangles.get(&handle.key).map(RenderRecord::drawable)
            }
        }
    }

    fn set_selected(&mut self, kind: GeometryKind, key: &EntityKey, selected: bool) {
        match kind {
            GeometryKind::Point => self.points.set_selected(key, selected),
            GeometryKind::Line => self.lines.set_selected(key, selected),
            GeometryKind::Circle => self.circles.set_selected(key, selected),
            GeometryKind::Rectangle => self.rectangles.set_selected(key, selected),
        };
    }

    fn remove(&mut self, kind: GeometryKind, key: &EntityKey) -> bool {
        match kind {
            GeometryKind::Point => self.points.remove(key),
            GeometryKind::Line => self.lines.remove(key),
            GeometryKind::Circle => self.circles.remove(key),
            GeometryKind::Rectangle => self.rectangles.remove(key),
        }
    }
}

/// Sole writer of the mirror. Applies decoded operations and notifies the
/// scene adapter of attachments and detachments.
#[derive(Debug)]
pub struct Reconciler<A> {
    mirror: SceneMirror,
    adapter: A,
}

impl<A: SceneAdapter> Reconciler<A> {
    pub fn new(adapter: A) -> Self {
        Self {
            mirror: SceneMirror::default(),
            adapter,
        }
    }

    pub fn mirror(&self) -> &SceneMirror {
        &self.mirror
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Split borrow for rendering: the adapter draws from the mirror.
    pub fn render_parts(&mut self) -> (&SceneMirror, &mut A) {
        (&self.mirror, &mut self.adapter)
    }

    pub fn into_adapter(self) -> A {
        self.adapter
    }

    /// Applies one decoded operation. Unknown entities and unknown tags are
    /// logged no-ops; a duplicate insert is reported to the caller and
    /// leaves the existing record untouched.
    pub fn apply(&mut self, event: UpdateEvent) -> Result<(), ApplyError> {
        match event {
            UpdateEvent::None => Ok(()),
            UpdateEvent::InsertPoint {
                entity,
                position,
                style,
            } => {
                self.mirror
                    .points
                    .insert(entity.clone(), position, style)
                    .map_err(|err| duplicate(GeometryKind::Point, err))?;
                self.attach(GeometryKind::Point, entity);
                Ok(())
            }
            UpdateEvent::InsertLine {
                entity,
                line,
                style,
            } => {
                self.mirror
                    .lines
                    .insert(entity.clone(), line, style)
                    .map_err(|err| duplicate(GeometryKind::Line, err))?;
                self.attach(GeometryKind::Line, entity);
                Ok(())
            }
            UpdateEvent::InsertCircle {
                entity,
                circle,
                style,
            } => {
                self.mirror
                    .circles
                    .insert(entity.clone(), circle, style)
                    .map_err(|err| duplicate(GeometryKind::Circle, err))?;
                self.attach(GeometryKind::Circle, entity);
                Ok(())
            }
            UpdateEvent::InsertRectangle {
                entity,
                rect,
                style,
            } => {
                self.mirror
                    .rectangles
                    .insert(entity.clone(), rect, style)
                    .map_err(|err| duplicate(GeometryKind::Rectangle, err))?;
                self.attach(GeometryKind::Rectangle, entity);
                Ok(())
            }
            UpdateEvent::UpdatePointGeometry { entity, position } => {
                absorb_unknown(self.mirror.points.update_geometry(&entity, position));
                Ok(())
            }
            UpdateEvent::UpdateLineGeometry { entity, line } => {
                absorb_unknown(self.mirror.lines.update_geometry(&entity, line));
                Ok(())
            }
            UpdateEvent::UpdateCircleGeometry { entity, circle } => {
                absorb_unknown(self.mirror.circles.update_geometry(&entity, circle));
                Ok(())
            }
            UpdateEvent::UpdateRectangleGeometry { entity, rect } => {
                absorb_unknown(self.mirror.rectangles.update_geometry(&entity, rect));
                Ok(())
            }
            UpdateEvent::UpdatePointStyle { entity, style } => {
                absorb_unknown(self.mirror.points.update_style(&entity, style));
                Ok(())
            }
            UpdateEvent::UpdateLineStyle { entity, style } => {
                absorb_unknown(self.mirror.lines.update_style(&entity, style));
                Ok(())
            }
            UpdateEvent::UpdateCircleStyle { entity, style } => {
                absorb_unknown(self.mirror.circles.update_style(&entity, style));
                Ok(())
            }
            UpdateEvent::UpdateRectangleStyle { entity, style } => {
                absorb_unknown(self.mirror.rectangles.update_style(&entity, style));
                Ok(())
            }
            UpdateEvent::Remove { entity } => {
                if let Some(kind) = self.mirror.kind_of(&entity) {
                    // Detach first so the scene never references a record
                    // that has already left the store.
                    self.adapter
                        .detach(DrawableHandle::new(kind, entity.clone()));
                    self.mirror.remove(kind, &entity);
                    debug!(entity = %entity, %kind, "entity_removed");
                } else {
                    debug!(entity = %entity, "remove_for_absent_entity");
                }
                Ok(())
            }
            UpdateEvent::Select { entity } => {
                self.set_selected(&entity, true);
                Ok(())
            }
            UpdateEvent::Deselect { entity } => {
                self.set_selected(&entity, false);
                Ok(())
            }
            UpdateEvent::Unknown { tag } => {
                warn!(tag, "unrecognized_event_tag");
                Ok(())
            }
        }
    }

    fn attach(&mut self, kind: GeometryKind, entity: EntityKey) {
        debug!(entity = %entity, %kind, "entity_inserted");
        self.adapter.attach(DrawableHandle::new(kind, entity));
    }

    fn set_selected(&mut self, entity: &EntityKey, selected: bool) {
        match self.mirror.kind_of(entity) {
            Some(kind) => self.mirror.set_selected(kind, entity, selected),
            None => debug!(entity = %entity, selected, "selection_for_absent_entity"),
        }
    }
}

// Insert only ever fails on a duplicate key.
fn duplicate(kind: GeometryKind, err: StoreError) -> ApplyError {
    let (StoreError::DuplicateEntity(key) | StoreError::UnknownEntity(key)) = err;
    ApplyError::DuplicateEntity { kind, key }
}

fn absorb_unknown(result: Result<(), StoreError>) {
    if let Err(StoreError::UnknownEntity(key)) = result {
        debug!(entity = %key, "update_for_absent_entity");
    }
}
