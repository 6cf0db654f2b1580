use glam::Vec2;

use super::event::InputEvent;

/// Single-pointer drag tracker.
///
/// Owns at most one pointer at a time; any other pointer that goes down while
/// one is held is ignored until the owner is released or cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TouchDragState {
    /// Whether a pointer is currently held.
    pub active: bool,
    /// Identifier of the owning pointer (meaningful only while active).
    pub pointer_id: u64,
    /// Last seen horizontal position.
    pub last_x: f32,
    /// Last seen vertical position.
    pub last_y: f32,
}

impl TouchDragState {
    /// Create an idle tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed an event; returns the drag delta in pixels for moves of the owning
    /// pointer.
    pub fn handle(&mut self, event: &InputEvent) -> Option<Vec2> {
        match *event {
            InputEvent::PointerDown { id, x, y } => {
                if !self.active {
                    *self = Self {
                        active: true,
                        pointer_id: id,
                        last_x: x,
                        last_y: y,
                    };
                }
                None
            }
            InputEvent::PointerMove { id, x, y } => {
                if !self.owns(id) {
                    return None;
                }
                let delta = Vec2::new(x - self.last_x, y - self.last_y);
                self.last_x = x;
                self.last_y = y;
                Some(delta)
            }
            InputEvent::PointerUp { id } | InputEvent::PointerCancel { id } => {
                if self.owns(id) {
                    self.reset();
                }
                None
            }
            InputEvent::Scroll { .. } | InputEvent::Orientation(_) => None,
        }
    }

    /// Drop the owned pointer.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn owns(&self, id: u64) -> bool {
        self.active && self.pointer_id == id
    }
}
