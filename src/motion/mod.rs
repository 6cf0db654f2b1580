//! Orientation/input fusion: turns device attitude or touch drags into the
//! single smoothed yaw/pitch applied to motion-driven cameras.

/// The fusion controller and its diagnostics snapshot.
pub mod controller;
/// Two-state permission handle and the platform prompt trait.
pub mod permission;

pub use controller::{FusionController, MotionStatus, NeutralBaseline};
pub use permission::{
    MotionPermission, NoMotionSensors, PermissionError, PermissionRequest,
    PermissionResolver, PermissionState,
};
