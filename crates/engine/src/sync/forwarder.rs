use super::geometry::Position;
use super::session::SimulationHandle;

/// Converts raw pointer/keyboard signals into the simulation's input
/// vocabulary and forwards them unbuffered, one call per raw signal. The
/// only local state is the previous pointer position used for deltas.
#[derive(Debug, Default)]
pub struct InputForwarder {
    last_position: Position,
}

impl InputForwarder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forwards absolute position plus the delta from the previous signal.
    /// A motion whose delta is exactly (0, 0) is swallowed; returns whether
    /// the signal was forwarded.
    pub fn pointer_moved<S: SimulationHandle>(
        &mut self,
        boundary: &mut S,
        x: f64,
        y: f64,
    ) -> bool {
        let dx = x - self.last_position.x;
        let dy = y - self.last_position.y;
        if dx == 0.0 && dy == 0.0 {
            return false;
        }
        self.last_position = Position { x, y };
        boundary.pointer_moved(x, y, dx, dy);
        true
    }

    pub fn pointer_down<S: SimulationHandle>(&mut self, boundary: &mut S) {
        boundary.pointer_down();
    }

    pub fn pointer_up<S: SimulationHandle>(&mut self, boundary: &mut S) {
        boundary.pointer_up();
    }

    pub fn key_down<S: SimulationHandle>(&mut self, boundary: &mut S, code: u32) {
        boundary.key_down(code);
    }

    pub fn key_up<S: SimulationHandle>(&mut self, boundary: &mut S, code: u32) {
        boundary.key_up(code);
    }

    pub fn last_position(&self) -> Position {
        self.last_position
    }
}
