//! The contract every scene implements.
//!
//! A view owns its camera, scene and resources for its whole lifetime. The
//! runtime only talks to the active view, through this trait.

use crate::camera::Camera;
use crate::input::InputEvent;
use crate::scene::Scene;
use crate::surface::{RenderSurface, Viewport};

/// How the runtime draws a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPath {
    /// The runtime resets the surface and renders [`View::scene`] through
    /// [`View::camera`] onto the screen.
    Default,
    /// The runtime calls [`View::render`] and the view sequences its own
    /// passes.
    Custom,
}

/// An interchangeable unit of renderable content.
///
/// `update`, `resize` and the scene/camera accessors are required. The
/// remaining hooks have no-op defaults.
pub trait View {
    /// Short display name, used in logs and the window title.
    fn name(&self) -> &str;

    /// The camera the runtime renders through and the fusion controller
    /// writes to.
    fn camera(&self) -> &Camera;

    /// Mutable access to the camera.
    fn camera_mut(&mut self) -> &mut Camera;

    /// The scene drawn on the default render path.
    fn scene(&self) -> &Scene;

    /// Advance animated state by `dt` seconds.
    fn update(&mut self, dt: f32);

    /// Reconfigure the projection and the shared surface size. Views clamp
    /// the pixel ratio to bound GPU cost.
    fn resize(&mut self, surface: &mut dyn RenderSurface, viewport: Viewport);

    /// Which render path the runtime takes.
    fn render_path(&self) -> RenderPath {
        RenderPath::Default
    }

    /// Draw the frame. Only called for [`RenderPath::Custom`]; `time` is
    /// the host timestamp in milliseconds.
    fn render(&mut self, surface: &mut dyn RenderSurface, time: f64) {
        let _ = (surface, time);
    }

    /// Start or stop side effects when the view gains or loses focus.
    fn set_active(&mut self, active: bool) {
        let _ = active;
    }

    /// One-time setup that must wait for a real user input event.
    fn on_user_gesture(&mut self) {}

    /// Input for views that steer their own camera. Returns `true` if
    /// consumed.
    fn handle_input(&mut self, event: &InputEvent) -> bool {
        let _ = event;
        false
    }

    /// Whether the fusion controller drives this view's camera.
    fn uses_motion(&self) -> bool {
        true
    }
}

/// Shared `resize` body for views that render through a perspective camera:
/// clamp the pixel ratio, size the surface, fix the camera aspect.
pub fn resize_surface_and_camera(
    camera: &mut Camera,
    surface: &mut dyn RenderSurface,
    viewport: Viewport,
    pixel_ratio_range: (f32, f32),
) {
    let (min, max) = pixel_ratio_range;
    surface.set_pixel_ratio(viewport.clamped_pixel_ratio(min, max));
    surface.set_size(viewport.width, viewport.height);
    camera.resize(viewport.width, viewport.height);
}
