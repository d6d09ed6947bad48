mod drawable;
mod event;
mod forwarder;
mod geometry;
mod reconciler;
mod records;
mod session;
mod store;

pub use drawable::{
    Drawable, Paint, Primitive, Shape, Stroke, SELECTION_COLOR, SELECTION_HALO_MARGIN,
    SELECTION_STROKE_WIDTH,
};
pub use event::{decode_event, encode_event, DecodeError, UpdateEvent};
pub use forwarder::InputForwarder;
pub use geometry::{
    CircleShape, CircleStyle, LineSegment, LineStyle, PointStyle, Position, RectShape,
    RectangleStyle,
};
pub use reconciler::{
    ApplyError, DrawableHandle, GeometryKind, Reconciler, SceneAdapter, SceneMirror,
};
pub use records::{CircleRecord, LineRecord, PointRecord, RectangleRecord};
pub use session::{
    BoundaryError, PumpReport, SessionConfig, SimulationHandle, SyncSession,
};
pub use store::{EntityKey, EntityStore, RenderRecord, StoreError};
