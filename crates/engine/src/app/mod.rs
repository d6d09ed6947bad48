mod loop_runner;
mod metrics;
mod rendering;

pub use loop_runner::{run_shell, run_shell_with_metrics, ShellConfig, ShellError};
pub use metrics::{MetricsHandle, SessionMetricsSnapshot};
pub use rendering::CanvasRenderer;
