use super::types::InputEvent;

/// Per-frame input deltas.
///
/// `InputState` holds what is currently down; `InputFrame` holds what changed
/// since the last presented frame. The runtime clears it after each frame.
#[derive(Debug, Default)]
pub struct InputFrame {
    /// Events in arrival order, including key repeats.
    pub events: Vec<InputEvent>,

    /// Accumulated pointer motion in logical pixels.
    pub pointer_delta: (f32, f32),

    /// Accumulated vertical wheel motion in lines.
    pub wheel_lines: f32,
}

impl InputFrame {
    pub fn clear(&mut self) {
        self.events.clear();
        self.pointer_delta = (0.0, 0.0);
        self.wheel_lines = 0.0;
    }
}
