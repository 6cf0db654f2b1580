use std::path::Path;

use glam::{Mat4, Vec3};

use crate::camera::Camera;
use crate::error::CosmoError;
use crate::options::DisplayOptions;
use crate::scene::primitives::cube;
use crate::scene::{Geometry, Mesh, NodeId, Scene};
use crate::surface::{RenderSurface, Viewport};
use crate::view::{resize_surface_and_camera, View};

const PLACEHOLDER_COLOR: [f32; 4] = [1.0, 0.2, 0.8, 1.0];
/// Radians per second.
const TURN_SPEED: f32 = 0.35;

/// A mesh loaded from a JSON file, turning slowly in front of the camera.
///
/// A missing or malformed file never fails construction: the view logs a
/// warning and shows a magenta cube instead.
pub struct ModelView {
    camera: Camera,
    scene: Scene,
    model: NodeId,
    turn: f32,
    placeholder: bool,
    pixel_ratio_range: (f32, f32),
}

impl ModelView {
    /// Load the model named by `display.model_path`.
    #[must_use]
    pub fn new(display: &DisplayOptions) -> Self {
        let loaded = match display.model_path.as_deref() {
            Some(path) => Mesh::load_json(Path::new(path)),
            None => Err(CosmoError::AssetLoad("no model path configured".into())),
        };
        Self::from_result(loaded, display)
    }

    /// Build from an already-parsed mesh (or the error that prevented it).
    #[must_use]
    pub fn from_result(mesh: Result<Mesh, CosmoError>, display: &DisplayOptions) -> Self {
        let (mesh, placeholder) = match mesh {
            Ok(mesh) => (mesh, false),
            Err(e) => {
                log::warn!("model unavailable, showing placeholder: {e}");
                (cube(1.0, PLACEHOLDER_COLOR), true)
            }
        };

        let radius = bounding_radius(&mesh).max(0.01);
        let mut scene = Scene::new();
        scene.clear_color = [0.01, 0.01, 0.03, 1.0];
        let model = scene.add(Geometry::Mesh(mesh));

        let distance = radius / (display.fovy.to_radians() * 0.5).tan() * 1.4;
        let mut camera = Camera::new(Vec3::new(0.0, 0.0, distance), display.fovy);
        camera.znear = (distance * 0.01).max(0.01);
        camera.zfar = distance * 10.0;

        Self {
            camera,
            scene,
            model,
            turn: 0.0,
            placeholder,
            pixel_ratio_range: (display.min_pixel_ratio, display.max_pixel_ratio),
        }
    }

    /// Whether the placeholder cube stands in for a failed load.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }
}

/// Largest vertex distance from the origin.
fn bounding_radius(mesh: &Mesh) -> f32 {
    mesh.vertices
        .iter()
        .map(|v| Vec3::from(v.position).length())
        .fold(0.0, f32::max)
}

impl View for ModelView {
    fn name(&self) -> &str {
        "model"
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
        self.turn = (self.turn + TURN_SPEED * dt) % std::f32::consts::TAU;
        if let Some(node) = self.scene.node_mut(self.model) {
            node.transform = Mat4::from_rotation_y(self.turn);
        }
    }

    fn resize(&mut self, surface: &mut dyn RenderSurface, viewport: Viewport) {
        resize_surface_and_camera(&mut self.camera, surface, viewport, self.pixel_ratio_range);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = r#"{
        "vertices": [
            {"position": [0, 2, 0], "normal": [0, 0, 1], "color": [1, 1, 1, 1]},
            {"position": [-2, -2, 0], "normal": [0, 0, 1], "color": [1, 1, 1, 1]},
            {"position": [2, -2, 0], "normal": [0, 0, 1], "color": [1, 1, 1, 1]}
        ],
        "indices": [0, 1, 2]
    }"#;

    #[test]
    fn missing_file_shows_placeholder() {
        let display = DisplayOptions {
            model_path: Some("/nonexistent/model.json".into()),
            ..DisplayOptions::default()
        };
        let view = ModelView::new(&display);
        assert!(view.is_placeholder());
        assert_eq!(view.scene().len(), 1);
    }

    #[test]
    fn unset_path_shows_placeholder() {
        assert!(ModelView::new(&DisplayOptions::default()).is_placeholder());
    }

    #[test]
    fn parsed_mesh_is_framed_by_the_camera() {
        let display = DisplayOptions::default();
        let view = ModelView::from_result(Mesh::from_json(TRIANGLE), &display);
        assert!(!view.is_placeholder());

        let radius = 8.0_f32.sqrt();
        let half_fov = (display.fovy.to_radians() * 0.5).tan();
        assert!(view.camera().position.z * half_fov > radius);
        assert!(view.camera().zfar > view.camera().position.z);
    }

    #[test]
    fn malformed_mesh_falls_back() {
        let bad = Mesh::from_json(r#"{"vertices": [], "indices": [0]}"#);
        let view = ModelView::from_result(bad, &DisplayOptions::default());
        assert!(view.is_placeholder());
    }

    #[test]
    fn update_turns_the_model() {
        let mut view = ModelView::new(&DisplayOptions::default());
        view.update(1.0);
        let node = &view.scene().nodes()[0];
        assert_ne!(node.transform, Mat4::IDENTITY);
    }
}
