use glam::{Mat4, Vec3};
use rand::Rng;

use crate::camera::Camera;
use crate::options::DisplayOptions;
use crate::scene::primitives::star_shell;
use crate::scene::{Geometry, NodeId, Scene};
use crate::surface::{
    FullscreenPass, OffscreenId, PassUniforms, RenderSurface, RenderTarget, Viewport,
};
use crate::view::{resize_surface_and_camera, RenderPath, View};

/// Lensing composite over the offscreen starfield.
pub const LENSING_PASS: FullscreenPass = FullscreenPass {
    label: "black_hole_lensing",
    source: include_str!("../../assets/shaders/black_hole.wgsl"),
};

const DEFAULT_MASS: f32 = 1.0;
const DISK_BRIGHTNESS: f32 = 1.2;
const DRIFT_SPEED: f32 = 0.004;

/// A black hole bending the starfield behind it.
///
/// Renders the stars into an offscreen target, then composites them through
/// a fullscreen lensing pass.
pub struct BlackHoleView {
    camera: Camera,
    scene: Scene,
    stars: NodeId,
    background: Option<OffscreenId>,
    mass: f32,
    drift: f32,
    pixel_ratio_range: (f32, f32),
}

impl BlackHoleView {
    /// Scatter the background stars.
    pub fn new(display: &DisplayOptions, rng: &mut impl Rng) -> Self {
        let mut scene = Scene::new();
        let stars = scene.add(Geometry::Points(star_shell(
            rng,
            display.star_count as usize,
            300.0,
            1000.0,
            3.0,
        )));
        Self {
            camera: Camera::new(Vec3::ZERO, display.fovy),
            scene,
            stars,
            background: None,
            mass: DEFAULT_MASS,
            drift: 0.0,
            pixel_ratio_range: (display.min_pixel_ratio, display.max_pixel_ratio),
        }
    }

    /// Scale the horizon and lensing strength. Clamped to `[0.1, 4]`.
    pub fn set_mass(&mut self, mass: f32) {
        self.mass = mass.clamp(0.1, 4.0);
    }

    /// Current mass.
    #[must_use]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Uniform values fed to the lensing pass for a `width` x `height`
    /// target at host time `time_ms`.
    #[must_use]
    pub fn pass_uniforms(&self, width: u32, height: u32, time_ms: f64) -> PassUniforms {
        PassUniforms {
            resolution: [width as f32, height as f32],
            time: (time_ms / 1000.0) as f32,
            aspect: self.camera.aspect,
            params: [
                self.mass,
                (self.camera.fovy.to_radians() * 0.5).tan(),
                DISK_BRIGHTNESS,
                0.0,
            ],
            rotation: Mat4::from_quat(self.camera.rotation()).to_cols_array_2d(),
        }
    }

    fn background(&mut self, surface: &mut dyn RenderSurface) -> OffscreenId {
        *self
            .background
            .get_or_insert_with(|| surface.create_offscreen("black hole background"))
    }
}

impl View for BlackHoleView {
    fn name(&self) -> &str {
        "black hole"
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
        self.drift += DRIFT_SPEED * dt;
        if let Some(node) = self.scene.node_mut(self.stars) {
            node.transform = Mat4::from_rotation_y(self.drift);
        }
    }

    fn resize(&mut self, surface: &mut dyn RenderSurface, viewport: Viewport) {
        resize_surface_and_camera(&mut self.camera, surface, viewport, self.pixel_ratio_range);
        let _ = self.background(surface);
    }

    fn render_path(&self) -> RenderPath {
        RenderPath::Custom
    }

    fn render(&mut self, surface: &mut dyn RenderSurface, time: f64) {
        let background = self.background(surface);
        surface.render(&self.scene, &self.camera, RenderTarget::Offscreen(background));
        let (width, height) = surface.size();
        let uniforms = self.pass_uniforms(width, height, time);
        surface.draw_fullscreen(&LENSING_PASS, Some(background), &uniforms);
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::camera::Orientable;
    use crate::surface::testing::{RecordingSurface, SurfaceCall};

    fn view() -> BlackHoleView {
        let display = DisplayOptions {
            star_count: 20,
            ..DisplayOptions::default()
        };
        BlackHoleView::new(&display, &mut StdRng::seed_from_u64(3))
    }

    #[test]
    fn render_goes_offscreen_then_composites() {
        let mut view = view();
        let mut surface = RecordingSurface::default();
        view.resize(&mut surface, Viewport::new(300, 200, 1.0));
        surface.clear();

        view.render(&mut surface, 1500.0);
        view.render(&mut surface, 1516.0);

        let target = RenderTarget::Offscreen(OffscreenId(1));
        let once = [
            SurfaceCall::Render { nodes: 1, target },
            SurfaceCall::Fullscreen {
                label: LENSING_PASS.label,
                source: Some(OffscreenId(1)),
            },
        ];
        assert_eq!(surface.calls, [once.clone(), once].concat());
    }

    #[test]
    fn offscreen_target_is_created_once() {
        let mut view = view();
        let mut surface = RecordingSurface::default();
        view.resize(&mut surface, Viewport::new(300, 200, 1.0));
        view.resize(&mut surface, Viewport::new(600, 400, 1.0));
        view.render(&mut surface, 0.0);
        let created = surface
            .calls
            .iter()
            .filter(|c| matches!(c, SurfaceCall::CreateOffscreen(_)))
            .count();
        assert_eq!(created, 1);
    }

    #[test]
    fn uniforms_follow_camera_and_time() {
        let mut view = view();
        view.set_mass(10.0);
        view.camera_mut().set_orientation(0.3, -0.2, 0.0);
        let uniforms = view.pass_uniforms(640, 480, 2500.0);
        assert_eq!(uniforms.resolution, [640.0, 480.0]);
        assert!((uniforms.time - 2.5).abs() < 1e-6);
        assert_eq!(uniforms.params[0], 4.0);
        assert!((uniforms.params[1] - (30.0_f32.to_radians()).tan()).abs() < 1e-5);
        assert_ne!(uniforms.rotation, Mat4::IDENTITY.to_cols_array_2d());
    }

    #[test]
    fn takes_the_custom_path() {
        assert_eq!(view().render_path(), RenderPath::Custom);
        assert!(view().uses_motion());
    }
}
