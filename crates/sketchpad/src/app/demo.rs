use std::collections::VecDeque;

use engine::{
    encode_event, BoundaryError, CircleShape, CircleStyle, EntityKey, LineSegment, LineStyle,
    PointStyle, Position, RectShape, RectangleStyle, SimulationHandle, UpdateEvent,
};
use serde_json::Value;
use tracing::info;

const HUB_KEY: &str = "hub";
const TRACER_KEY: &str = "tracer";
const SPOKE_KEY: &str = "spoke";
const FRAME_KEY: &str = "frame";
const ANCHOR_KEYS: [&str; 3] = ["anchor_0", "anchor_1", "anchor_2"];
const EDGE_KEYS: [&str; 3] = ["edge_0", "edge_1", "edge_2"];

const ANCHOR_POSITIONS: [Position; 3] = [
    Position { x: 540.0, y: 300.0 },
    Position { x: 740.0, y: 300.0 },
    Position { x: 640.0, y: 440.0 },
];
const HUB_CENTER: Position = Position { x: 640.0, y: 347.0 };
const HUB_BASE_RADIUS: f64 = 90.0;
const HUB_RADIUS_SWING: f64 = 18.0;
const HUB_PULSE_RADIANS_PER_TICK: f64 = 0.02;
const TRACER_RADIANS_PER_TICK: f64 = 0.03;
const FRAME_MIN: Position = Position { x: 80.0, y: 80.0 };
const FRAME_MAX: Position = Position { x: 1200.0, y: 640.0 };

const SELECTION_PULSE_PERIOD_TICKS: u64 = 240;
const SELECTION_PULSE_ON_TICK: u64 = 60;
const SELECTION_PULSE_OFF_TICK: u64 = 180;
const ANCHOR_RESTYLE_PERIOD_TICKS: u64 = 300;
const FRAME_PULSE_PERIOD_TICKS: u64 = 180;
const ACCENT_RESTYLE_PERIOD_TICKS: u64 = 360;
const FRAME_INSET: f64 = 12.0;

const KEY_CODE_BACKSPACE: u32 = 8;
const KEY_CODE_C: u32 = 67;

/// Scripted stand-in for the authoritative simulation: seeds a small
/// construction on the first advance, animates it afterwards, echoes
/// pointer clicks as new points, and wires backspace/C to removals. Exists
/// so the shell can run without the real solver; exercises every wire tag.
pub(crate) struct DemoSimulation {
    queue: VecDeque<Value>,
    cursor: Position,
    ticks: u64,
    user_points: Vec<EntityKey>,
    next_user_point: u64,
    warm_palette: bool,
    frame_inset: bool,
    accent_styles: bool,
    shut_down: bool,
}

impl DemoSimulation {
    pub(crate) fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            cursor: Position::default(),
            ticks: 0,
            user_points: Vec::new(),
            next_user_point: 0,
            warm_palette: false,
            frame_inset: false,
            accent_styles: false,
            shut_down: false,
        }
    }

    fn push(&mut self, event: UpdateEvent) {
        self.queue.push_back(encode_event(&event));
    }

    fn hub_radius(&self) -> f64 {
        HUB_BASE_RADIUS + HUB_RADIUS_SWING * (self.ticks as f64 * HUB_PULSE_RADIANS_PER_TICK).sin()
    }

    fn tracer_position(&self) -> Position {
        let angle = self.ticks as f64 * TRACER_RADIANS_PER_TICK;
        let radius = self.hub_radius();
        Position {
            x: HUB_CENTER.x + radius * angle.cos(),
            y: HUB_CENTER.y + radius * angle.sin(),
        }
    }

    fn seed_scene(&mut self) {
        for (key, position) in ANCHOR_KEYS.iter().zip(ANCHOR_POSITIONS) {
            self.push(UpdateEvent::InsertPoint {
                entity: EntityKey::from(*key),
                position,
                style: anchor_style(self.warm_palette),
            });
        }
        for (index, key) in EDGE_KEYS.iter().enumerate() {
            self.push(UpdateEvent::InsertLine {
                entity: EntityKey::from(*key),
                line: LineSegment {
                    from: ANCHOR_POSITIONS[index],
                    to: ANCHOR_POSITIONS[(index + 1) % ANCHOR_POSITIONS.len()],
                },
                style: edge_style(),
            });
        }
        self.push(UpdateEvent::InsertCircle {
            entity: EntityKey::from(HUB_KEY),
            circle: CircleShape {
                center: HUB_CENTER,
                radius: self.hub_radius(),
            },
            style: hub_style(self.accent_styles),
        });
        self.push(UpdateEvent::InsertPoint {
            entity: EntityKey::from(TRACER_KEY),
            position: self.tracer_position(),
            style: tracer_style(),
        });
        self.push(UpdateEvent::InsertLine {
            entity: EntityKey::from(SPOKE_KEY),
            line: LineSegment {
                from: HUB_CENTER,
                to: self.tracer_position(),
            },
            style: spoke_style(self.accent_styles),
        });
        self.push(UpdateEvent::InsertRectangle {
            entity: EntityKey::from(FRAME_KEY),
            rect: frame_rect(self.frame_inset),
            style: frame_style(self.accent_styles),
        });
    }

    fn animate(&mut self) {
        self.push(UpdateEvent::UpdateCircleGeometry {
            entity: EntityKey::from(HUB_KEY),
            circle: CircleShape {
                center: HUB_CENTER,
                radius: self.hub_radius(),
            },
        });
        self.push(UpdateEvent::UpdatePointGeometry {
            entity: EntityKey::from(TRACER_KEY),
            position: self.tracer_position(),
        });
        self.push(UpdateEvent::UpdateLineGeometry {
            entity: EntityKey::from(SPOKE_KEY),
            line: LineSegment {
                from: HUB_CENTER,
                to: self.tracer_position(),
            },
        });
    }

    fn run_pulses(&mut self) {
        match self.ticks % SELECTION_PULSE_PERIOD_TICKS {
            SELECTION_PULSE_ON_TICK => self.push(UpdateEvent::Select {
                entity: EntityKey::from(EDGE_KEYS[0]),
            }),
            SELECTION_PULSE_OFF_TICK => self.push(UpdateEvent::Deselect {
                entity: EntityKey::from(EDGE_KEYS[0]),
            }),
            _ => {}
        }

        if self.ticks % ANCHOR_RESTYLE_PERIOD_TICKS == 0 {
            self.warm_palette = !self.warm_palette;
            for key in ANCHOR_KEYS {
                self.push(UpdateEvent::UpdatePointStyle {
                    entity: EntityKey::from(key),
                    style: anchor_style(self.warm_palette),
                });
            }
        }

        if self.ticks % FRAME_PULSE_PERIOD_TICKS == 0 {
            self.frame_inset = !self.frame_inset;
            self.push(UpdateEvent::UpdateRectangleGeometry {
                entity: EntityKey::from(FRAME_KEY),
                rect: frame_rect(self.frame_inset),
            });
        }

        if self.ticks % ACCENT_RESTYLE_PERIOD_TICKS == 0 {
            self.accent_styles = !self.accent_styles;
            self.push(UpdateEvent::UpdateLineStyle {
                entity: EntityKey::from(SPOKE_KEY),
                style: spoke_style(self.accent_styles),
            });
            self.push(UpdateEvent::UpdateCircleStyle {
                entity: EntityKey::from(HUB_KEY),
                style: hub_style(self.accent_styles),
            });
            self.push(UpdateEvent::UpdateRectangleStyle {
                entity: EntityKey::from(FRAME_KEY),
                style: frame_style(self.accent_styles),
            });
        }
    }
}

impl SimulationHandle for DemoSimulation {
    fn advance(&mut self) -> Result<(), BoundaryError> {
        if self.shut_down {
            return Ok(());
        }
        self.ticks += 1;
        if self.ticks == 1 {
            self.seed_scene();
        } else {
            self.animate();
        }
        self.run_pulses();
        Ok(())
    }

    fn poll_event(&mut self) -> Result<Value, BoundaryError> {
        Ok(self
            .queue
            .pop_front()
            .unwrap_or_else(|| encode_event(&UpdateEvent::None)))
    }

    fn pointer_moved(&mut self, x: f64, y: f64, _dx: f64, _dy: f64) {
        self.cursor = Position { x, y };
    }

    fn pointer_down(&mut self) {
        if self.shut_down {
            return;
        }
        let key = EntityKey::from(format!("user_{}", self.next_user_point));
        self.next_user_point += 1;
        self.push(UpdateEvent::InsertPoint {
            entity: key.clone(),
            position: self.cursor,
            style: user_point_style(),
        });
        self.push(UpdateEvent::Select {
            entity: key.clone(),
        });
        self.user_points.push(key);
    }

    fn pointer_up(&mut self) {
        if self.shut_down {
            return;
        }
        if let Some(last) = self.user_points.last().cloned() {
            self.push(UpdateEvent::Deselect { entity: last });
        }
    }

    fn key_down(&mut self, code: u32) {
        if self.shut_down {
            return;
        }
        match code {
            KEY_CODE_BACKSPACE => {
                if let Some(last) = self.user_points.pop() {
                    self.push(UpdateEvent::Remove { entity: last });
                }
            }
            KEY_CODE_C => {
                let doomed: Vec<EntityKey> = self.user_points.drain(..).collect();
                for key in doomed {
                    self.push(UpdateEvent::Remove { entity: key });
                }
            }
            _ => {}
        }
    }

    fn key_up(&mut self, _code: u32) {}

    fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.queue.clear();
        info!("demo_simulation_shutdown");
    }
}

fn anchor_style(warm: bool) -> PointStyle {
    PointStyle {
        color: if warm { 0xff6633 } else { 0x6666ff },
        alpha: 1.0,
        radius: 6.0,
        border_color: 0x222244,
        border_alpha: 1.0,
        border_width: 2.0,
    }
}

fn tracer_style() -> PointStyle {
    PointStyle {
        color: 0xcc2255,
        alpha: 1.0,
        radius: 4.0,
        border_color: 0x551122,
        border_alpha: 1.0,
        border_width: 1.0,
    }
}

fn user_point_style() -> PointStyle {
    PointStyle {
        color: 0x22aa66,
        alpha: 1.0,
        radius: 5.0,
        border_color: 0x115533,
        border_alpha: 1.0,
        border_width: 1.0,
    }
}

fn edge_style() -> LineStyle {
    LineStyle {
        color: 0x333344,
        alpha: 1.0,
        width: 2.0,
    }
}

fn spoke_style(accent: bool) -> LineStyle {
    LineStyle {
        color: if accent { 0xcc8833 } else { 0x999999 },
        alpha: 0.8,
        width: 1.0,
    }
}

fn hub_style(accent: bool) -> CircleStyle {
    CircleStyle {
        fill: 0xeef2ff,
        fill_alpha: 0.35,
        border: LineStyle {
            color: if accent { 0x33b5cc } else { 0x3355cc },
            alpha: 1.0,
            width: 2.0,
        },
    }
}

fn frame_rect(inset: bool) -> RectShape {
    let inset = if inset { FRAME_INSET } else { 0.0 };
    RectShape {
        min_corner: Position {
            x: FRAME_MIN.x + inset,
            y: FRAME_MIN.y + inset,
        },
        max_corner: Position {
            x: FRAME_MAX.x - inset,
            y: FRAME_MAX.y - inset,
        },
    }
}

fn frame_style(accent: bool) -> RectangleStyle {
    RectangleStyle {
        fill: 0xffffff,
        fill_alpha: 0.0,
        border: LineStyle {
            color: if accent { 0x99bbcc } else { 0xcccccc },
            alpha: 1.0,
            width: 1.0,
        },
    }
}
