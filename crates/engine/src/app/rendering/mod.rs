mod canvas;

pub use canvas::CanvasRenderer;
