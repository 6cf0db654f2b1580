use std::f32::consts::{PI, TAU};

use glam::{Mat4, Quat, Vec3};
use rand::Rng;

use crate::camera::Camera;
use crate::options::DisplayOptions;
use crate::scene::primitives::{cone, star_shell, uv_sphere};
use crate::scene::{Geometry, NodeId, Scene};
use crate::surface::{RenderSurface, Viewport};
use crate::view::{resize_surface_and_camera, View};

/// PSR B1919+21, the first pulsar observed.
const DEFAULT_PERIOD: f32 = 1.337;
const CORE_RADIUS: f32 = 0.6;
const BEAM_LENGTH: f32 = 9.0;
const BEAM_RADIUS: f32 = 1.2;
/// Angle between the spin axis and the magnetic (beam) axis.
const MAGNETIC_TILT: f32 = 0.45;

const CORE_DIM: [f32; 3] = [0.35, 0.45, 1.0];
const CORE_FLASH: [f32; 3] = [1.0, 1.0, 1.0];

/// A spinning neutron star sweeping two beams, its core flashing once per
/// rotation.
pub struct PulsarView {
    camera: Camera,
    scene: Scene,
    core: NodeId,
    beams: [NodeId; 2],
    period: f32,
    phase: f32,
    active: bool,
    pixel_ratio_range: (f32, f32),
}

impl PulsarView {
    /// Build the core, beams and a sparse background.
    pub fn new(display: &DisplayOptions, rng: &mut impl Rng) -> Self {
        let mut scene = Scene::new();
        let _ = scene.add(Geometry::Points(star_shell(
            rng,
            (display.star_count / 2) as usize,
            300.0,
            900.0,
            3.0,
        )));
        let core = scene.add(Geometry::Mesh(uv_sphere(CORE_RADIUS, 24, 32, |_| {
            [1.0, 1.0, 1.0, 1.0]
        })));
        let beam = cone(BEAM_RADIUS, BEAM_LENGTH, 32, [0.55, 0.7, 1.0, 0.8]);
        let beams = [
            scene.add(Geometry::Mesh(beam.clone())),
            scene.add(Geometry::Mesh(beam)),
        ];

        let mut camera = Camera::new(Vec3::new(0.0, 0.0, 14.0), display.fovy);
        camera.look_at(Vec3::ZERO);

        let mut view = Self {
            camera,
            scene,
            core,
            beams,
            period: DEFAULT_PERIOD,
            phase: 0.0,
            active: false,
            pixel_ratio_range: (display.min_pixel_ratio, display.max_pixel_ratio),
        };
        view.apply_phase();
        view
    }

    /// Set the rotation period in seconds. Non-positive values are ignored.
    pub fn set_period(&mut self, period: f32) {
        if period > 0.0 && period.is_finite() {
            self.period = period;
        }
    }

    /// Rotation phase in `[0, 1)`.
    #[must_use]
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Core brightness in `[0, 1]`, peaking when a beam crosses the line of
    /// sight at phase 0.
    #[must_use]
    pub fn pulse(&self) -> f32 {
        let d = self.phase.min(1.0 - self.phase);
        (-(d * d) / 0.002).exp()
    }

    /// Whether the view is currently shown.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    fn apply_phase(&mut self) {
        let spin = Quat::from_rotation_y(self.phase * TAU);
        let tilt = Quat::from_rotation_z(MAGNETIC_TILT);
        let pulse = self.pulse();

        for (i, id) in self.beams.into_iter().enumerate() {
            // The second beam points the opposite way.
            let flip = Quat::from_rotation_z(PI * i as f32);
            if let Some(node) = self.scene.node_mut(id) {
                node.transform = Mat4::from_quat(spin * tilt * flip);
            }
        }

        if let Some(core) = self.scene.node_mut(self.core) {
            let color = Vec3::from(CORE_DIM).lerp(Vec3::from(CORE_FLASH), pulse);
            core.tint = [color.x, color.y, color.z, 1.0];
            core.transform = Mat4::from_scale(Vec3::splat(1.0 + 0.15 * pulse));
        }
    }
}

impl View for PulsarView {
    fn name(&self) -> &str {
        "pulsar"
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
        self.phase = (self.phase + dt / self.period).rem_euclid(1.0);
        self.apply_phase();
    }

    fn resize(&mut self, surface: &mut dyn RenderSurface, viewport: Viewport) {
        resize_surface_and_camera(&mut self.camera, surface, viewport, self.pixel_ratio_range);
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
        if active {
            log::info!("pulsar active, period {:.3}s", self.period);
        } else {
            log::info!("pulsar inactive");
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    fn view() -> PulsarView {
        let display = DisplayOptions {
            star_count: 10,
            ..DisplayOptions::default()
        };
        PulsarView::new(&display, &mut StdRng::seed_from_u64(5))
    }

    #[test]
    fn phase_wraps_once_per_period() {
        let mut view = view();
        view.set_period(2.0);
        view.update(1.0);
        assert!((view.phase() - 0.5).abs() < 1e-5);
        view.update(1.5);
        assert!((view.phase() - 0.25).abs() < 1e-5);
    }

    #[test]
    fn core_flashes_at_phase_zero() {
        let mut view = view();
        assert!((view.pulse() - 1.0).abs() < 1e-6);
        let bright = view.scene().node(view.core).unwrap().tint;

        view.update(DEFAULT_PERIOD * 0.5);
        assert!(view.pulse() < 0.01);
        let dim = view.scene().node(view.core).unwrap().tint;
        assert!(dim[0] < bright[0]);
    }

    #[test]
    fn beams_point_opposite_ways() {
        let mut view = view();
        view.update(0.3);
        let axis = |id: NodeId| {
            view.scene()
                .node(id)
                .unwrap()
                .transform
                .transform_vector3(Vec3::Y)
        };
        let sum = axis(view.beams[0]) + axis(view.beams[1]);
        assert!(sum.length() < 1e-4);
    }

    #[test]
    fn invalid_period_is_ignored() {
        let mut view = view();
        view.set_period(0.0);
        view.set_period(f32::NAN);
        assert_eq!(view.period, DEFAULT_PERIOD);
    }

    #[test]
    fn tracks_activation() {
        let mut view = view();
        view.set_active(true);
        assert!(view.is_active());
        view.set_active(false);
        assert!(!view.is_active());
    }
}
