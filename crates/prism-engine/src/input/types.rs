use std::fmt;

/// Keyboard key, by physical position on a US layout.
///
/// Keys without a binding anywhere map to `Key::Unknown` with the platform code.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    BracketLeft,
    BracketRight,
    Minus,
    Equal,
    /// `'A'..='Z'`.
    Letter(char),
    /// Top-row digit, `0..=9`.
    Digit(u8),
    Unknown(u32),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeyState {
    Pressed,
    Released,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MouseButtonState {
    Pressed,
    Released,
}

/// Mouse wheel delta.
///
/// `Line` is notched-wheel input; `Pixel` comes from touchpads.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum MouseWheelDelta {
    Line { x: f32, y: f32 },
    Pixel { x: f32, y: f32 },
}

impl MouseWheelDelta {
    /// Logical pixels treated as one wheel line.
    pub const PIXELS_PER_LINE: f32 = 40.0;

    /// Vertical delta in lines; positive scrolls away from the user.
    pub fn lines_y(self) -> f32 {
        match self {
            Self::Line { y, .. } => y,
            Self::Pixel { y, .. } => y / Self::PIXELS_PER_LINE,
        }
    }
}

/// Platform-agnostic input events emitted by the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Key {
        key: Key,
        state: KeyState,
        /// OS auto-repeat of a held key.
        repeat: bool,
    },

    /// Pointer moved to `(x, y)` in logical pixels.
    PointerMoved { x: f32, y: f32 },

    PointerButton {
        button: MouseButton,
        state: MouseButtonState,
    },

    MouseWheel(MouseWheelDelta),

    PointerLeft,

    Focused(bool),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Letter(c) => write!(f, "{c}"),
            Key::Digit(d) => write!(f, "{d}"),
            Key::BracketLeft => f.write_str("["),
            Key::BracketRight => f.write_str("]"),
            Key::Minus => f.write_str("-"),
            Key::Equal => f.write_str("="),
            Key::Escape => f.write_str("Esc"),
            Key::Unknown(code) => write!(f, "key#{code}"),
        }
    }
}
