//! Cameras: the Euler-angle perspective camera driven by motion fusion and
//! the orbit control used by views with their own drag handling.

/// Perspective camera, the [`Orientable`] trait and GPU uniform.
pub mod core;
/// Drag-to-orbit camera control.
pub mod orbit;

pub use self::core::{Camera, CameraUniform, Orientable};
pub use self::orbit::OrbitControl;
