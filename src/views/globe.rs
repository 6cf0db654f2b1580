use glam::{Mat4, Vec3};

use crate::camera::{Camera, OrbitControl};
use crate::input::InputEvent;
use crate::options::DisplayOptions;
use crate::scene::primitives::uv_sphere;
use crate::scene::{Geometry, NodeId, Scene};
use crate::surface::{RenderSurface, Viewport};
use crate::view::{resize_surface_and_camera, View};

const RADIUS: f32 = 1.0;
/// Radians per second.
const SPIN_SPEED: f32 = 0.1;
/// Axial tilt of the Earth.
const AXIAL_TILT: f32 = 0.409;

const OCEAN: [f32; 4] = [0.05, 0.2, 0.55, 1.0];
const LAND: [f32; 4] = [0.15, 0.45, 0.18, 1.0];
const DESERT: [f32; 4] = [0.7, 0.6, 0.35, 1.0];
const ICE: [f32; 4] = [0.92, 0.95, 1.0, 1.0];

/// Surface color for a unit normal: ice caps, desert belts and a band of
/// pseudo-continents broken up by longitude.
fn surface_color(normal: Vec3) -> [f32; 4] {
    let latitude = normal.y.asin().abs();
    if latitude > 1.2 {
        return ICE;
    }
    let longitude = normal.z.atan2(normal.x);
    let land = (longitude * 3.0).sin() * (normal.y * 5.0).cos() > 0.25;
    if !land {
        OCEAN
    } else if (0.3..0.55).contains(&latitude) {
        DESERT
    } else {
        LAND
    }
}

/// An Earth-like globe the user orbits with drag and scroll.
///
/// Steers its own camera, so it opts out of motion fusion.
pub struct GlobeView {
    camera: Camera,
    scene: Scene,
    globe: NodeId,
    orbit: OrbitControl,
    spin: f32,
    pixel_ratio_range: (f32, f32),
}

impl GlobeView {
    /// Build the globe and place the camera on its orbit.
    pub fn new(display: &DisplayOptions) -> Self {
        let mut scene = Scene::new();
        scene.clear_color = [0.0, 0.0, 0.02, 1.0];
        let globe = scene.add(Geometry::Mesh(uv_sphere(RADIUS, 48, 96, surface_color)));

        let orbit = OrbitControl::new(Vec3::ZERO, 3.5, 1.5, 12.0);
        let mut camera = Camera::new(Vec3::ZERO, 45.0_f32.min(display.fovy));
        orbit.apply(&mut camera);

        Self {
            camera,
            scene,
            globe,
            orbit,
            spin: 0.0,
            pixel_ratio_range: (display.min_pixel_ratio, display.max_pixel_ratio),
        }
    }

    /// The orbit control driving the camera.
    #[must_use]
    pub fn orbit(&self) -> &OrbitControl {
        &self.orbit
    }
}

impl View for GlobeView {
    fn name(&self) -> &str {
        "globe"
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
        self.spin = (self.spin + SPIN_SPEED * dt) % std::f32::consts::TAU;
        if let Some(node) = self.scene.node_mut(self.globe) {
            node.transform =
                Mat4::from_rotation_z(AXIAL_TILT) * Mat4::from_rotation_y(self.spin);
        }
        self.orbit.apply(&mut self.camera);
    }

    fn resize(&mut self, surface: &mut dyn RenderSurface, viewport: Viewport) {
        resize_surface_and_camera(&mut self.camera, surface, viewport, self.pixel_ratio_range);
    }

    fn handle_input(&mut self, event: &InputEvent) -> bool {
        self.orbit.handle_input(event)
    }

    fn uses_motion(&self) -> bool {
        false
    }
}
