use glam::Vec3;
use rand::Rng;

use crate::camera::Camera;
use crate::options::DisplayOptions;
use crate::scene::primitives::random_star_color;
use crate::scene::{Geometry, NodeId, PointCloud, Scene, StarPoint};
use crate::surface::{RenderSurface, Viewport};
use crate::view::{resize_surface_and_camera, View};

/// Stars live in a tube along −Z between these depths.
const FAR_Z: f32 = -600.0;
const NEAR_Z: f32 = 1.0;
const TUBE_INNER: f32 = 4.0;
const TUBE_OUTER: f32 = 120.0;
const STAR_SIZE: f32 = 0.6;
/// World units per second.
const DEFAULT_SPEED: f32 = 120.0;

/// Stars streaming toward the camera, wrapping back to the far end once
/// they pass it.
pub struct WarpView {
    camera: Camera,
    scene: Scene,
    stars: NodeId,
    speed: f32,
    pixel_ratio_range: (f32, f32),
}

impl WarpView {
    /// Fill the tube with `display.star_count` stars.
    pub fn new(display: &DisplayOptions, rng: &mut impl Rng) -> Self {
        let points = (0..display.star_count)
            .map(|_| {
                let angle: f32 = rng.random_range(0.0..std::f32::consts::TAU);
                let radius: f32 = rng.random_range(TUBE_INNER..TUBE_OUTER);
                let z: f32 = rng.random_range(FAR_Z..NEAR_Z);
                StarPoint {
                    position: [radius * angle.cos(), radius * angle.sin(), z],
                    size: STAR_SIZE,
                    color: random_star_color(rng),
                }
            })
            .collect();

        let mut scene = Scene::new();
        let stars = scene.add(Geometry::Points(PointCloud { points }));
        Self {
            camera: Camera::new(Vec3::ZERO, display.fovy),
            scene,
            stars,
            speed: DEFAULT_SPEED,
            pixel_ratio_range: (display.min_pixel_ratio, display.max_pixel_ratio),
        }
    }

    /// Set the streaming speed in world units per second.
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.max(0.0);
    }

    fn stars_mut(&mut self) -> Option<&mut PointCloud> {
        match self.scene.node_mut(self.stars)?.geometry_mut() {
            Geometry::Points(cloud) => Some(cloud),
            Geometry::Mesh(_) => None,
        }
    }
}

impl View for WarpView {
    fn name(&self) -> &str {
        "warp"
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
        let step = self.speed * dt;
        if step <= 0.0 {
            return;
        }
        let depth = NEAR_Z - FAR_Z;
        if let Some(cloud) = self.stars_mut() {
            for star in &mut cloud.points {
                star.position[2] += step;
                if star.position[2] > NEAR_Z {
                    star.position[2] = FAR_Z + (star.position[2] - NEAR_Z) % depth;
                }
            }
        }
    }

    fn resize(&mut self, surface: &mut dyn RenderSurface, viewport: Viewport) {
        resize_surface_and_camera(&mut self.camera, surface, viewport, self.pixel_ratio_range);
    }
}
