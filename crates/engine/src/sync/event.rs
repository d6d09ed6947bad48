use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use super::geometry::{
    CircleShape, CircleStyle, LineSegment, LineStyle, PointStyle, Position, RectShape,
    RectangleStyle,
};
use super::store::EntityKey;

const TAG_NONE: u64 = 0;
const TAG_INSERT_POINT: u64 = 1;
const TAG_INSERT_LINE: u64 = 2;
const TAG_INSERT_CIRCLE: u64 = 3;
const TAG_INSERT_RECTANGLE: u64 = 4;
const TAG_UPDATE_POINT_GEOMETRY: u64 = 5;
const TAG_UPDATE_LINE_GEOMETRY: u64 = 6;
const TAG_UPDATE_CIRCLE_GEOMETRY: u64 = 7;
const TAG_UPDATE_RECTANGLE_GEOMETRY: u64 = 8;
const TAG_UPDATE_POINT_STYLE: u64 = 9;
const TAG_UPDATE_LINE_STYLE: u64 = 10;
const TAG_UPDATE_CIRCLE_STYLE: u64 = 11;
const TAG_UPDATE_RECTANGLE_STYLE: u64 = 12;
const TAG_REMOVE: u64 = 13;
const TAG_SELECT: u64 = 14;
const TAG_DESELECT: u64 = 15;

/// One decoded mutation from the simulation boundary. `None` is the "no
/// event this poll" marker; `Unknown` is any tag outside 0..=15 and is
/// applied as a logged no-op so the pipeline never stops on a stray event.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateEvent {
    None,
    InsertPoint {
        entity: EntityKey,
        position: Position,
        style: PointStyle,
    },
    InsertLine {
        entity: EntityKey,
        line: LineSegment,
        style: LineStyle,
    },
    InsertCircle {
        entity: EntityKey,
        circle: CircleShape,
        style: CircleStyle,
    },
    InsertRectangle {
        entity: EntityKey,
        rect: RectShape,
        style: RectangleStyle,
    },
    UpdatePointGeometry {
        entity: EntityKey,
        position: Position,
    },
    UpdateLineGeometry {
        entity: EntityKey,
        line: LineSegment,
    },
    UpdateCircleGeometry {
        entity: EntityKey,
        circle: CircleShape,
    },
    UpdateRectangleGeometry {
        entity: EntityKey,
        rect: RectShape,
    },
    UpdatePointStyle {
        entity: EntityKey,
        style: PointStyle,
    },
    UpdateLineStyle {
        entity: EntityKey,
        style: LineStyle,
    },
    UpdateCircleStyle {
        entity: EntityKey,
        style: CircleStyle,
    },
    UpdateRectangleStyle {
        entity: EntityKey,
        style: RectangleStyle,
    },
    Remove {
        entity: EntityKey,
    },
    Select {
        entity: EntityKey,
    },
    Deselect {
        entity: EntityKey,
    },
    Unknown {
        tag: u64,
    },
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("event is not a JSON object")]
    NotAnObject,
    #[error("event object carries no integer `type` discriminant")]
    MissingTag,
    #[error("malformed payload for event tag {tag}: {source}")]
    MalformedPayload {
        tag: u64,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
struct InsertPayload<G, S> {
    entity: EntityKey,
    #[serde(flatten)]
    geometry: G,
    style: S,
}

#[derive(Deserialize)]
struct GeometryPayload<G> {
    entity: EntityKey,
    #[serde(flatten)]
    geometry: G,
}

#[derive(Deserialize)]
struct StylePayload<S> {
    entity: EntityKey,
    style: S,
}

#[derive(Deserialize)]
struct EntityOnlyPayload {
    entity: EntityKey,
}

#[derive(Deserialize)]
struct PositionField {
    position: Position,
}

#[derive(Deserialize)]
struct LineField {
    line: LineSegment,
}

#[derive(Deserialize)]
struct CircleField {
    circle: CircleShape,
}

#[derive(Deserialize)]
struct RectField {
    rect: RectShape,
}

/// Interprets one tagged value from the boundary. Pure; never touches the
/// stores. Unrecognized tags decode to `Unknown`, recognized tags with a
/// broken payload are a `DecodeError` for the caller to absorb.
pub fn decode_event(value: &Value) -> Result<UpdateEvent, DecodeError> {
    if !value.is_object() {
        return Err(DecodeError::NotAnObject);
    }
    let tag = value
        .get("type")
        .and_then(Value::as_u64)
        .ok_or(DecodeError::MissingTag)?;

    fn payload<T: for<'de> Deserialize<'de>>(tag: u64, value: &Value) -> Result<T, DecodeError> {
        serde_json::from_value(value.clone())
            .map_err(|source| DecodeError::MalformedPayload { tag, source })
    }

    let event = match tag {
        TAG_NONE => UpdateEvent::None,
        TAG_INSERT_POINT => {
            let p: InsertPayload<PositionField, PointStyle> = payload(tag, value)?;
            UpdateEvent::InsertPoint {
                entity: p.entity,
                position: p.geometry.position,
                style: p.style,
            }
        }
        TAG_INSERT_LINE => {
            let p: InsertPayload<LineField, LineStyle> = payload(tag, value)?;
            UpdateEvent::InsertLine {
                entity: p.entity,
                line: p.geometry.line,
                style: p.style,
            }
        }
        TAG_INSERT_CIRCLE => {
            let p: InsertPayload<CircleField, CircleStyle> = payload(tag, value)?;
            UpdateEvent::InsertCircle {
                entity: p.entity,
                circle: p.geometry.circle,
                style: p.style,
            }
        }
        TAG_INSERT_RECTANGLE => {
            let p: InsertPayload<RectField, RectangleStyle> = payload(tag, value)?;
            UpdateEvent::InsertRectangle {
                entity: p.entity,
                rect: p.geometry.rect,
                style: p.style,
            }
        }
        TAG_UPDATE_POINT_GEOMETRY => {
            let p: GeometryPayload<PositionField> = payload(tag, value)?;
            UpdateEvent::UpdatePointGeometry {
                entity: p.entity,
                position: p.geometry.position,
            }
        }
        TAG_UPDATE_LINE_GEOMETRY => {
            let p: GeometryPayload<LineField> = payload(tag, value)?;
            UpdateEvent::UpdateLineGeometry {
                entity: p.entity,
                line: p.geometry.line,
            }
        }
        TAG_UPDATE_CIRCLE_GEOMETRY => {
            let p: GeometryPayload<CircleField> = payload(tag, value)?;
            UpdateEvent::UpdateCircleGeometry {
                entity: p.entity,
                circle: p.geometry.circle,
            }
        }
        TAG_UPDATE_RECTANGLE_GEOMETRY => {
            let p: GeometryPayload<RectField> = payload(tag, value)?;
            UpdateEvent::UpdateRectangleGeometry {
                entity: p.entity,
                rect: p.geometry.rect,
            }
        }
        TAG_UPDATE_POINT_STYLE => {
            let p: StylePayload<PointStyle> = payload(tag, value)?;
            UpdateEvent::UpdatePointStyle {
                entity: p.entity,
                style: p.style,
            }
        }
        TAG_UPDATE_LINE_STYLE => {
            let p: StylePayload<LineStyle> = payload(tag, value)?;
            UpdateEvent::UpdateLineStyle {
                entity: p.entity,
                style: p.style,
            }
        }
        TAG_UPDATE_CIRCLE_STYLE => {
            let p: StylePayload<CircleStyle> = payload(tag, value)?;
            UpdateEvent::UpdateCircleStyle {
                entity: p.entity,
                style: p.style,
            }
        }
        TAG_UPDATE_RECTANGLE_STYLE => {
            let p: StylePayload<RectangleStyle> = payload(tag, value)?;
            UpdateEvent::UpdateRectangleStyle {
                entity: p.entity,
                style: p.style,
            }
        }
        TAG_REMOVE => {
            let p: EntityOnlyPayload = payload(tag, value)?;
            UpdateEvent::Remove { entity: p.entity }
        }
        TAG_SELECT => {
            let p: EntityOnlyPayload = payload(tag, value)?;
            UpdateEvent::Select { entity: p.entity }
        }
        TAG_DESELECT => {
            let p: EntityOnlyPayload = payload(tag, value)?;
            UpdateEvent::Deselect { entity: p.entity }
        }
        tag => UpdateEvent::Unknown { tag },
    };
    Ok(event)
}

/// Inverse of [`decode_event`], used by producers and the round-trip tests.
pub fn encode_event(event: &UpdateEvent) -> Value {
    fn tagged(tag: u64, mut payload: Value) -> Value {
        if let Value::Object(map) = &mut payload {
            map.insert("type".to_string(), json!(tag));
        }
        payload
    }

    match event {
        UpdateEvent::None => json!({ "type": TAG_NONE }),
        UpdateEvent::InsertPoint {
            entity,
            position,
            style,
        } => tagged(
            TAG_INSERT_POINT,
            json!({ "entity": entity, "position": position, "style": style }),
        ),
        UpdateEvent::InsertLine {
            entity,
            line,
            style,
        } => tagged(
            TAG_INSERT_LINE,
            json!({ "entity": entity, "line": line, "style": style }),
        ),
        UpdateEvent::InsertCircle {
            entity,
            circle,
            style,
        } => tagged(
            TAG_INSERT_CIRCLE,
            json!({ "entity": entity, "circle": circle, "style": style }),
        ),
        UpdateEvent::InsertRectangle {
            entity,
            rect,
            style,
        } => tagged(
            TAG_INSERT_RECTANGLE,
            json!({ "entity": entity, "rect": rect, "style": style }),
        ),
        UpdateEvent::UpdatePointGeometry { entity, position } => tagged(
            TAG_UPDATE_POINT_GEOMETRY,
            json!({ "entity": entity, "position": position }),
        ),
        UpdateEvent::UpdateLineGeometry { entity, line } => tagged(
            TAG_UPDATE_LINE_GEOMETRY,
            json!({ "entity": entity, "line": line }),
        ),
        UpdateEvent::UpdateCircleGeometry { entity, circle } => tagged(
            TAG_UPDATE_CIRCLE_GEOMETRY,
            json!({ "entity": entity, "circle": circle }),
        ),
        UpdateEvent::UpdateRectangleGeometry { entity, rect } => tagged(
            TAG_UPDATE_RECTANGLE_GEOMETRY,
            json!({ "entity": entity, "rect": rect }),
        ),
        UpdateEvent::UpdatePointStyle { entity, style } => tagged(
            TAG_UPDATE_POINT_STYLE,
            json!({ "entity": entity, "style": style }),
        ),
        UpdateEvent::UpdateLineStyle { entity, style } => tagged(
            TAG_UPDATE_LINE_STYLE,
            json!({ "entity": entity, "style": style }),
        ),
        UpdateEvent::UpdateCircleStyle { entity, style } => tagged(
            TAG_UPDATE_CIRCLE_STYLE,
            json!({ "entity": entity, "style": style }),
        ),
        UpdateEvent::UpdateRectangleStyle { entity, style } => tagged(
            TAG_UPDATE_RECTANGLE_STYLE,
            json!({ "entity": entity, "style": style }),
        ),
        UpdateEvent::Remove { entity } => tagged(TAG_REMOVE, json!({ "entity": entity })),
        UpdateEvent::Select { entity } => tagged(TAG_SELECT, json!({ "entity": entity })),
        UpdateEvent::Deselect { entity } => tagged(TAG_DESELECT, json!({ "entity": entity })),
        UpdateEvent::Unknown { tag } => json!({ "type": tag }),
    }
}
