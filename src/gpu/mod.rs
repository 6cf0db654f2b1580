//! GPU backend: wgpu device setup and the shared [`surface::GpuSurface`].

/// Growable GPU buffers for per-node geometry.
pub mod dynamic_buffer;
/// Shared wgpu boilerplate for scene and fullscreen pipelines.
pub mod pipeline_helpers;
/// wgpu device, surface, and queue initialization.
pub mod render_context;
/// The [`crate::surface::RenderSurface`] implementation.
pub mod surface;
/// Offscreen color and depth textures.
pub mod texture;

pub use render_context::{RenderContext, RenderContextError};
pub use surface::GpuSurface;
