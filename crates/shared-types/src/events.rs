//! Pointer events driving the map viewport, independent of any windowing crate

use serde::{Deserialize, Serialize};

/// Position in container pixels, origin top-left
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhysicalPosition {
    pub x: f64,
    pub y: f64,
}

impl PhysicalPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum MouseScrollDelta {
    PixelDelta(PhysicalPosition),
    // LineDelta(f32, f32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementState {
    Pressed,
    Released,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TouchPhase {
    Started,
    Moved,
    Ended,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum WindowEvent {
    MouseWheel {
        delta: MouseScrollDelta,
        phase: TouchPhase,
    },
    CursorMoved {
        position: PhysicalPosition,
    },
    MouseInput {
        state: ElementState,
        button: MouseButton,
    },
    /// Two-finger pinch; `scale` is the multiplicative change since the
    /// previous event of the gesture.
    PinchZoom {
        scale: f64,
        center: PhysicalPosition,
        phase: TouchPhase,
    },
}
