pub mod app;
pub mod sync;

pub use app::{
    run_shell, run_shell_with_metrics, CanvasRenderer, MetricsHandle, SessionMetricsSnapshot,
    ShellConfig, ShellError,
};
pub use sync::{
    decode_event, encode_event, ApplyError, BoundaryError, CircleRecord, CircleShape, CircleStyle,
    DecodeError, Drawable, DrawableHandle, EntityKey, EntityStore, GeometryKind, InputForwarder,
    LineRecord, LineSegment, LineStyle, Paint, PointRecord, PointStyle, Position, Primitive,
    PumpReport, RectShape, RectangleRecord, RectangleStyle, Reconciler, RenderRecord, SceneAdapter,
    SceneMirror, SessionConfig, Shape, SimulationHandle, StoreError, Stroke, SyncSession,
    UpdateEvent,
};
