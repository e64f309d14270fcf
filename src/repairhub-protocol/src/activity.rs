//! User input events that feed the idle timers.

use serde::{Deserialize, Serialize};

/// A user input event observed by the hosting UI.
///
/// Only deliberate interactions reset the idle timers. Passive pointer
/// movement is modeled but never qualifies, so a resting hand on the mouse
/// cannot keep a session alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// Pointer button pressed.
    PointerDown,
    /// Key pressed.
    KeyDown,
    /// Page or element scrolled.
    Scroll,
    /// Touch started.
    TouchStart,
    /// Element clicked.
    Click,
    /// Pointer moved without a button press. Never resets the timers.
    PointerMove,
}

impl ActivityKind {
    /// Whether this event restarts the idle timers.
    pub fn resets_idle_timer(&self) -> bool {
        !matches!(self, ActivityKind::PointerMove)
    }
}
