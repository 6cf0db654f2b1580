use glam::{Vec2, Vec3};

use super::core::{Camera, Orientable};
use crate::input::{InputEvent, TouchDragState};

/// Drag-to-orbit, scroll-to-zoom camera control.
///
/// Used by views that opt out of motion fusion and steer their camera
/// themselves. The camera circles `focus_point` at `distance`.
#[derive(Debug, Clone)]
pub struct OrbitControl {
    /// Point the camera orbits around.
    pub focus_point: Vec3,
    /// Current distance from the focus point.
    pub distance: f32,
    yaw: f32,
    pitch: f32,
    drag: TouchDragState,
    rotate_speed: f32,
    zoom_speed: f32,
    min_distance: f32,
    max_distance: f32,
}

impl OrbitControl {
    /// Pitch stays short of the poles so the up vector never flips.
    const PITCH_LIMIT: f32 = 1.5;

    /// Orbit `focus_point` at `distance`, zoom clamped to
    /// `[min_distance, max_distance]`.
    #[must_use]
    pub fn new(focus_point: Vec3, distance: f32, min_distance: f32, max_distance: f32) -> Self {
        Self {
            focus_point,
            distance: distance.clamp(min_distance, max_distance),
            yaw: 0.0,
            pitch: 0.0,
            drag: TouchDragState::new(),
            rotate_speed: 0.005,
            zoom_speed: 0.1,
            min_distance,
            max_distance,
        }
    }

    /// Consume pointer and scroll events. Returns `true` if the event moved
    /// the camera or changed drag state.
    pub fn handle_input(&mut self, event: &InputEvent) -> bool {
        match event {
            InputEvent::Scroll { delta } => {
                self.zoom(*delta);
                true
            }
            InputEvent::Orientation(_) => false,
            _ => {
                if let Some(delta) = self.drag.handle(event) {
                    self.rotate(delta);
                }
                true
            }
        }
    }

    /// Orbit by a drag delta in pixels.
    pub fn rotate(&mut self, delta: Vec2) {
        self.yaw -= delta.x * self.rotate_speed;
        self.pitch = (self.pitch - delta.y * self.rotate_speed)
            .clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT);
    }

    /// Zoom in (positive) or out (negative).
    pub fn zoom(&mut self, delta: f32) {
        self.distance *= 1.0 - delta * self.zoom_speed;
        self.distance = self.distance.clamp(self.min_distance, self.max_distance);
    }

    /// Current orbit yaw in radians.
    #[must_use]
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Current orbit pitch in radians.
    #[must_use]
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Place the camera on the orbit, looking at the focus point.
    pub fn apply(&self, camera: &mut Camera) {
        camera.set_orientation(self.yaw, self.pitch, 0.0);
        camera.position = self.focus_point - camera.forward() * self.distance;
    }
}
