//! The shared drawing surface every view renders through.
//!
//! The runtime and views only see [`RenderSurface`]; the wgpu implementation
//! lives in [`crate::gpu::surface`]. One surface is shared by all views, and
//! whichever view is active owns it for the frame.

use crate::camera::Camera;
use crate::scene::Scene;

/// Logical viewport size and device pixel density reported by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Width in logical (CSS) pixels.
    pub width: u32,
    /// Height in logical (CSS) pixels.
    pub height: u32,
    /// Device pixels per logical pixel.
    pub pixel_ratio: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1,
            height: 1,
            pixel_ratio: 1.0,
        }
    }
}

impl Viewport {
    /// Viewport with a sanitized size (at least 1x1) and ratio.
    #[must_use]
    pub fn new(width: u32, height: u32, pixel_ratio: f32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            pixel_ratio: if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
                pixel_ratio
            } else {
                1.0
            },
        }
    }

    /// Width over height.
    #[must_use]
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// Pixel ratio clamped to `[min, max]` to bound GPU cost on dense
    /// displays. Unusable bounds are ignored.
    #[must_use]
    pub fn clamped_pixel_ratio(&self, min: f32, max: f32) -> f32 {
        let min = if min.is_finite() && min > 0.0 { min } else { 1.0 };
        let max = if max.is_finite() { max.max(min) } else { min.max(self.pixel_ratio) };
        self.pixel_ratio.clamp(min, max)
    }
}

/// Handle to an offscreen color target created by the surface. Offscreen
/// targets follow the surface size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OffscreenId(pub u32);

/// Where a scene render lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTarget {
    /// The presented surface.
    Screen,
    /// An offscreen target, later sampled by a fullscreen pass.
    Offscreen(OffscreenId),
}

/// A fullscreen fragment pass. The shader body is opaque to the runtime.
///
/// `source` is WGSL with `vs_main`/`fs_main` entry points, the
/// [`PassUniforms`] block at `@group(0) @binding(0)` and, when a source
/// target is bound, a texture at binding 1 and sampler at binding 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FullscreenPass {
    /// Cache key and debug label.
    pub label: &'static str,
    /// WGSL source.
    pub source: &'static str,
}

/// Per-frame values fed to a fullscreen pass.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PassUniforms {
    /// Target size in physical pixels.
    pub resolution: [f32; 2],
    /// Seconds since the host started.
    pub time: f32,
    /// Width over height.
    pub aspect: f32,
    /// Pass-specific parameters.
    pub params: [f32; 4],
    /// Camera rotation (column-major) for view-dependent passes.
    pub rotation: [[f32; 4]; 4],
}

impl Default for PassUniforms {
    fn default() -> Self {
        Self {
            resolution: [1.0, 1.0],
            time: 0.0,
            aspect: 1.0,
            params: [0.0; 4],
            rotation: glam::Mat4::IDENTITY.to_cols_array_2d(),
        }
    }
}

/// The host rendering surface.
///
/// Implementations accept scene/camera pairs and fullscreen passes and own
/// the size of the drawing buffer. Per-frame calls never fail upward: a
/// surface that cannot draw logs and skips.
pub trait RenderSurface {
    /// Resize the drawing buffer to a logical size.
    fn set_size(&mut self, width: u32, height: u32);

    /// Set device pixels per logical pixel.
    fn set_pixel_ratio(&mut self, ratio: f32);

    /// Drawing buffer size in physical pixels.
    fn size(&self) -> (u32, u32);

    /// Forget any state a previous owner left behind, so the next draw
    /// starts from defaults (clear, no bound pass inputs).
    fn reset_state(&mut self);

    /// Draw `scene` as seen by `camera` into `target`.
    fn render(&mut self, scene: &Scene, camera: &Camera, target: RenderTarget);

    /// Allocate an offscreen color target sized like the surface.
    fn create_offscreen(&mut self, label: &str) -> OffscreenId;

    /// Run a fullscreen pass onto the screen, optionally sampling an
    /// offscreen target.
    fn draw_fullscreen(
        &mut self,
        pass: &FullscreenPass,
        source: Option<OffscreenId>,
        uniforms: &PassUniforms,
    );
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory surface that records every call.

    use super::{
        Camera, FullscreenPass, OffscreenId, PassUniforms, RenderSurface,
        RenderTarget, Scene,
    };

    /// One recorded surface call.
    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum SurfaceCall {
        SetSize(u32, u32),
        SetPixelRatio(f32),
        Reset,
        Render { nodes: usize, target: RenderTarget },
        CreateOffscreen(String),
        Fullscreen { label: &'static str, source: Option<OffscreenId> },
    }

    #[derive(Debug, Default)]
    pub(crate) struct RecordingSurface {
        pub(crate) calls: Vec<SurfaceCall>,
        pub(crate) logical: (u32, u32),
        pub(crate) ratio: f32,
        next_offscreen: u32,
    }

    impl RecordingSurface {
        pub(crate) fn clear(&mut self) {
            self.calls.clear();
        }
    }

    impl RenderSurface for RecordingSurface {
        fn set_size(&mut self, width: u32, height: u32) {
            self.logical = (width, height);
            self.calls.push(SurfaceCall::SetSize(width, height));
        }

        fn set_pixel_ratio(&mut self, ratio: f32) {
            self.ratio = ratio;
            self.calls.push(SurfaceCall::SetPixelRatio(ratio));
        }

        fn size(&self) -> (u32, u32) {
            let ratio = if self.ratio > 0.0 { self.ratio } else { 1.0 };
            (
                (self.logical.0 as f32 * ratio) as u32,
                (self.logical.1 as f32 * ratio) as u32,
            )
        }

        fn reset_state(&mut self) {
            self.calls.push(SurfaceCall::Reset);
        }

        fn render(&mut self, scene: &Scene, _camera: &Camera, target: RenderTarget) {
            self.calls.push(SurfaceCall::Render {
                nodes: scene.len(),
                target,
            });
        }

        fn create_offscreen(&mut self, label: &str) -> OffscreenId {
            self.next_offscreen += 1;
            self.calls.push(SurfaceCall::CreateOffscreen(label.to_owned()));
            OffscreenId(self.next_offscreen)
        }

        fn draw_fullscreen(
            &mut self,
            pass: &FullscreenPass,
            source: Option<OffscreenId>,
            _uniforms: &PassUniforms,
        ) {
            self.calls.push(SurfaceCall::Fullscreen {
                label: pass.label,
                source,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_ratio_is_clamped() {
        assert_eq!(Viewport::new(10, 10, 3.0).clamped_pixel_ratio(1.0, 2.0), 2.0);
        assert_eq!(Viewport::new(10, 10, 0.5).clamped_pixel_ratio(1.0, 2.0), 1.0);
        assert_eq!(Viewport::new(10, 10, 1.5).clamped_pixel_ratio(1.0, 2.0), 1.5);
    }

    #[test]
    fn unusable_bounds_do_not_panic() {
        let vp = Viewport::new(100, 100, 1.5);
        assert_eq!(vp.clamped_pixel_ratio(f32::NAN, 2.0), 1.5);
        assert_eq!(vp.clamped_pixel_ratio(1.0, f32::NAN), 1.5);
        assert_eq!(vp.clamped_pixel_ratio(-1.0, 1.25), 1.25);
        assert_eq!(vp.clamped_pixel_ratio(3.0, 2.0), 3.0);
    }

    #[test]
    fn degenerate_viewport_is_sanitized() {
        let vp = Viewport::new(0, 0, f32::NAN);
        assert_eq!((vp.width, vp.height, vp.pixel_ratio), (1, 1, 1.0));
        assert_eq!(vp.aspect(), 1.0);
    }
}
