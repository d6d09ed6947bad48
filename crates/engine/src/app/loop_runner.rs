use std::sync::Arc;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use crate::sync::{SessionConfig, SimulationHandle, SyncSession};

use super::metrics::MetricsAccumulator;
use super::rendering::CanvasRenderer;
use super::MetricsHandle;

#[derive(Debug, Clone)]
pub struct ShellConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub metrics_log_interval: Duration,
    pub session: SessionConfig,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            window_title: "Sketchpad".to_string(),
            window_width: 1280,
            window_height: 720,
            metrics_log_interval: Duration::from_secs(1),
            session: SessionConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize canvas: {0}")]
    CreateCanvas(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_shell<S: SimulationHandle + 'static>(
    config: ShellConfig,
    boundary: S,
) -> Result<(), ShellError> {
    let metrics_handle = MetricsHandle::default();
    run_shell_with_metrics(config, boundary, metrics_handle)
}

/// Hosts one scene synchronization session in a window: forwards window
/// input to the session, pumps it once per redraw, and rasterizes the
/// mirror. A session that shut itself down keeps its last frame on screen
/// until the window closes.
pub fn run_shell_with_metrics<S: SimulationHandle + 'static>(
    config: ShellConfig,
    boundary: S,
    metrics_handle: MetricsHandle,
) -> Result<(), ShellError> {
    let event_loop = EventLoop::new().map_err(ShellError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(ShellError::CreateWindow)?,
    );
    let window_for_loop = Arc::clone(&window);
    let canvas = CanvasRenderer::new(window).map_err(ShellError::CreateCanvas)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let metrics_log_interval = normalize_non_zero_duration(
        config.metrics_log_interval,
        Duration::from_secs(1),
    );
    let mut session = SyncSession::new(boundary, canvas, config.session.clone());
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);

    info!(
        window_width = config.window_width,
        window_height = config.window_height,
        tick_interval_ms = config.session.tick_interval.as_millis() as u64,
        max_events_per_pump = config.session.max_events_per_pump,
        "shell_config"
    );

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window_for_loop.id() => {
                match event {
                    WindowEvent::CloseRequested => {
                        info!(reason = "window_close", "shutdown_requested");
                        session.shutdown();
                        window_target.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        let (_, canvas) = session.render_parts();
                        if let Err(error) = canvas.resize(new_size.width, new_size.height) {
                            warn!(error = %error, "canvas_resize_failed");
                            window_target.exit();
                        }
                    }
                    WindowEvent::ScaleFactorChanged { .. } => {
                        let size = window_for_loop.inner_size();
                        let (_, canvas) = session.render_parts();
                        if let Err(error) = canvas.resize(size.width, size.height) {
                            warn!(error = %error, "canvas_resize_failed");
                            window_target.exit();
                        }
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        session.pointer_moved(position.x, position.y);
                    }
                    WindowEvent::MouseInput { state, button, .. } => {
                        if button == MouseButton::Left {
                            match state {
                                ElementState::Pressed => session.pointer_down(),
                                ElementState::Released => session.pointer_up(),
                            }
                        }
                    }
                    WindowEvent::KeyboardInput { event, .. } => {
                        if let Some(code) = boundary_key_code(event.physical_key) {
                            match event.state {
                                ElementState::Pressed => session.key_down(code),
                                ElementState::Released => session.key_up(code),
                            }
                        }
                    }
                    WindowEvent::RedrawRequested => {
                        let report = session.pump();
                        metrics_accumulator.record_frame();
                        metrics_accumulator.record_ticks(report.ticks_issued);
                        metrics_accumulator.record_events(report.events_applied);

                        let (mirror, canvas) = session.render_parts();
                        if let Err(error) = canvas.render(mirror) {
                            warn!(error = %error, "canvas_draw_failed");
                            window_target.exit();
                        }

                        if let Some(snapshot) = metrics_accumulator.maybe_snapshot(Instant::now())
                        {
                            metrics_handle.publish(snapshot);
                            info!(
                                fps = snapshot.fps,
                                tps = snapshot.tps,
                                eps = snapshot.eps,
                                entity_count = session.mirror().entity_count(),
                                "session_metrics"
                            );
                        }
                    }
                    _ => {}
                }
            }
            Event::AboutToWait => {
                window_for_loop.request_redraw();
            }
            Event::LoopExiting => {
                session.shutdown();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(ShellError::EventLoopRun)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

/// Maps physical keys into the numeric vocabulary the simulation consumes.
/// Unmapped keys are dropped without forwarding.
fn boundary_key_code(key: PhysicalKey) -> Option<u32> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    let mapped = match code {
        KeyCode::Backspace => 8,
        KeyCode::ShiftLeft | KeyCode::ShiftRight => 16,
        KeyCode::ControlLeft | KeyCode::ControlRight => 17,
        KeyCode::AltLeft | KeyCode::AltRight => 18,
        KeyCode::Space => 32,
        KeyCode::Digit0 => 48,
        KeyCode::Digit1 => 49,
        KeyCode::Digit2 => 50,
        KeyCode::Digit3 => 51,
        KeyCode::Digit4 => 52,
        KeyCode::Digit5 => 53,
        KeyCode::Digit6 => 54,
        KeyCode::Digit7 => 55,
        KeyCode::Digit8 => 56,
        KeyCode::Digit9 => 57,
        KeyCode::KeyA => 65,
        KeyCode::KeyB => 66,
        KeyCode::KeyC => 67,
        KeyCode::KeyD => 68,
        KeyCode::KeyE => 69,
        KeyCode::KeyF => 70,
        KeyCode::KeyG => 71,
        KeyCode::KeyH => 72,
        KeyCode::KeyI => 73,
        KeyCode::KeyJ => 74,
        KeyCode::KeyK => 75,
        KeyCode::KeyL => 76,
        KeyCode::KeyM => 77,
        KeyCode::KeyN => 78,
        KeyCode::KeyO => 79,
        KeyCode::KeyP => 80,
        KeyCode::KeyQ => 81,
        KeyCode::KeyR => 82,
        KeyCode::KeyS => 83,
        KeyCode::KeyT => 84,
        KeyCode::KeyU => 85,
        KeyCode::KeyV => 86,
        KeyCode::KeyW => 87,
        KeyCode::KeyX => 88,
        KeyCode::KeyY => 89,
        KeyCode::KeyZ => 90,
        KeyCode::SuperLeft => 91,
        KeyCode::SuperRight => 93,
        KeyCode::Equal => 187,
        KeyCode::Minus => 189,
        KeyCode::Backslash => 220,
        _ => return None,
    };
    Some(mapped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_map_to_ascii_uppercase_codes() {
        assert_eq!(
            boundary_key_code(PhysicalKey::Code(KeyCode::KeyA)),
            Some(65)
        );
        assert_eq!(
            boundary_key_code(PhysicalKey::Code(KeyCode::KeyZ)),
            Some(90)
        );
    }

    #[test]
    fn digits_map_to_ascii_digit_codes() {
        assert_eq!(
            boundary_key_code(PhysicalKey::Code(KeyCode::Digit0)),
            Some(48)
        );
        assert_eq!(
            boundary_key_code(PhysicalKey::Code(KeyCode::Digit9)),
            Some(57)
        );
    }

    #[test]
    fn modifier_pairs_collapse_to_one_code() {
        assert_eq!(
            boundary_key_code(PhysicalKey::Code(KeyCode::ShiftLeft)),
            boundary_key_code(PhysicalKey::Code(KeyCode::ShiftRight))
        );
        assert_eq!(
            boundary_key_code(PhysicalKey::Code(KeyCode::ControlLeft)),
            Some(17)
        );
    }

    #[test]
    fn unmapped_keys_are_dropped() {
        assert_eq!(boundary_key_code(PhysicalKey::Code(KeyCode::F12)), None);
        assert_eq!(boundary_key_code(PhysicalKey::Code(KeyCode::ArrowUp)), None);
    }

    #[test]
    fn zero_metrics_interval_falls_back() {
        assert_eq!(
            normalize_non_zero_duration(Duration::ZERO, Duration::from_secs(1)),
            Duration::from_secs(1)
        );
        assert_eq!(
            normalize_non_zero_duration(Duration::from_millis(250), Duration::from_secs(1)),
            Duration::from_millis(250)
        );
    }
}
