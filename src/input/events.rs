use crate::core::geo::Point;
use serde::{Deserialize, Serialize};

/// Input events dispatched by the host element, in container pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Single click/tap
    Click {
        position: Point,
        button: MouseButton,
    },
    /// Double click/tap
    DoubleClick { position: Point },
    /// Mouse/finger move
    MouseMove { position: Point },
    /// Start of drag operation
    DragStart { position: Point },
    /// Drag in progress
    Drag { delta: Point },
    /// End of drag operation
    DragEnd,
    /// Scroll wheel or pinch zoom
    Scroll { delta: f64, position: Point },
    /// Host element resized
    Resize { size: Point },
}

/// Mouse buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

impl InputEvent {
    /// Left click at `position`
    pub fn click(position: Point) -> Self {
        InputEvent::Click {
            position,
            button: MouseButton::Left,
        }
    }

    /// Gets the primary position associated with this event, if any
    pub fn position(&self) -> Option<Point> {
        match self {
            InputEvent::Click { position, .. }
            | InputEvent::DoubleClick { position }
            | InputEvent::MouseMove { position }
            | InputEvent::DragStart { position }
            | InputEvent::Scroll { position, .. } => Some(*position),
            InputEvent::Drag { .. } | InputEvent::DragEnd | InputEvent::Resize { .. } => None,
        }
    }
}
