//! Input abstraction layer.
//!
//! Normalizes pointer, click, and key events from the host into a single
//! `InputEvent` enum consumed by the canvas controller. Coordinates are
//! stage pixels.

/// Keyboard modifier state at the time of the event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub alt: bool,
    pub ctrl: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        alt: false,
        ctrl: false,
        meta: false,
    };
}

/// A normalized input event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer pressed. Starts a drag or a handle gesture.
    PointerDown { x: f64, y: f64, modifiers: Modifiers },

    PointerMove { x: f64, y: f64 },

    /// Pointer released. Ends the current gesture.
    PointerUp { x: f64, y: f64 },

    /// Press and release without movement.
    Click { x: f64, y: f64, modifiers: Modifiers },

    DoubleClick { x: f64, y: f64 },

    Key { key: String, modifiers: Modifiers },
}

impl InputEvent {
    pub fn click(x: f64, y: f64) -> Self {
        Self::Click {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn pointer_down(x: f64, y: f64) -> Self {
        Self::PointerDown {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn key(key: &str) -> Self {
        Self::Key {
            key: key.to_string(),
            modifiers: Modifiers::NONE,
        }
    }

    /// Extract position if this is a pointer event.
    pub fn position(&self) -> Option<(f64, f64)> {
        match self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y }
            | Self::PointerUp { x, y }
            | Self::Click { x, y, .. }
            | Self::DoubleClick { x, y } => Some((*x, *y)),
            Self::Key { .. } => None,
        }
    }
}
