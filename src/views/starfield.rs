use glam::{Mat4, Vec3};
use rand::Rng;

use crate::camera::Camera;
use crate::options::DisplayOptions;
use crate::scene::primitives::star_shell;
use crate::scene::{Geometry, NodeId, Scene};
use crate::surface::{RenderSurface, Viewport};
use crate::view::{resize_surface_and_camera, View};

const INNER_RADIUS: f32 = 200.0;
const OUTER_RADIUS: f32 = 1000.0;
const STAR_SIZE: f32 = 3.0;
/// Radians per second around the tilted drift axis.
const DRIFT_SPEED: f32 = 0.01;

/// A shell of stars around the camera that slowly drifts.
pub struct StarfieldView {
    camera: Camera,
    scene: Scene,
    stars: NodeId,
    drift: f32,
    pixel_ratio_range: (f32, f32),
}

impl StarfieldView {
    /// Scatter `display.star_count` stars around the origin.
    pub fn new(display: &DisplayOptions, rng: &mut impl Rng) -> Self {
        let mut scene = Scene::new();
        let stars = scene.add(Geometry::Points(star_shell(
            rng,
            display.star_count as usize,
            INNER_RADIUS,
            OUTER_RADIUS,
            STAR_SIZE,
        )));
        Self {
            camera: Camera::new(Vec3::ZERO, display.fovy),
            scene,
            stars,
            drift: 0.0,
            pixel_ratio_range: (display.min_pixel_ratio, display.max_pixel_ratio),
        }
    }

    /// Accumulated drift angle in radians.
    #[must_use]
    pub fn drift(&self) -> f32 {
        self.drift
    }
}

impl View for StarfieldView {
    fn name(&self) -> &str {
        "starfield"
    }

    fn camera(&self) -> &Camera {
        &self.camera
    }

    fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    fn scene(&self) -> &Scene {
        &self.scene
    }

    fn update(&mut self, dt: f32) {
        self.drift = (self.drift + DRIFT_SPEED * dt) % std::f32::consts::TAU;
        if let Some(node) = self.scene.node_mut(self.stars) {
            let axis = Vec3::new(0.2, 1.0, 0.1).normalize();
            node.transform = Mat4::from_axis_angle(axis, self.drift);
        }
    }

    fn resize(&mut self, surface: &mut dyn RenderSurface, viewport: Viewport) {
        resize_surface_and_camera(&mut self.camera, surface, viewport, self.pixel_ratio_range);
    }
}
