use glam::{EulerRot, Mat4, Quat, Vec3};

/// Anything whose attitude can be driven by yaw/pitch/roll angles.
pub trait Orientable {
    /// Set the rotation from Euler angles in radians, applied yaw (vertical
    /// axis) first, then pitch (horizontal axis), then roll.
    fn set_orientation(&mut self, yaw: f32, pitch: f32, roll: f32);
}

/// Perspective camera positioned in world space and rotated by Euler angles.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Eye (camera) position in world space.
    pub position: Vec3,
    /// Rotation around the vertical axis, radians.
    pub yaw: f32,
    /// Rotation around the horizontal axis, radians.
    pub pitch: f32,
    /// Rotation around the view axis, radians.
    pub roll: f32,
    /// Viewport aspect ratio (width / height).
    pub aspect: f32,
    /// Vertical field of view in degrees.
    pub fovy: f32,
    /// Near clipping plane distance.
    pub znear: f32,
    /// Far clipping plane distance.
    pub zfar: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            roll: 0.0,
            aspect: 1.0,
            fovy: 60.0,
            znear: 0.1,
            zfar: 2000.0,
        }
    }
}

impl Camera {
    /// Camera at `position` with the given vertical field of view.
    #[must_use]
    pub fn new(position: Vec3, fovy: f32) -> Self {
        Self {
            position,
            fovy,
            ..Self::default()
        }
    }

    /// Rotation built in `YXZ` order so pitch never couples into roll.
    #[must_use]
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, self.roll)
    }

    /// Direction the camera looks along (−Z rotated).
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.rotation() * Vec3::NEG_Z
    }

    /// Point the camera at `target` by deriving yaw and pitch. Roll is
    /// cleared.
    pub fn look_at(&mut self, target: Vec3) {
        let dir = (target - self.position).normalize_or_zero();
        if dir == Vec3::ZERO {
            return;
        }
        self.yaw = (-dir.x).atan2(-dir.z);
        self.pitch = dir.y.clamp(-1.0, 1.0).asin();
        self.roll = 0.0;
    }

    /// World-to-view matrix.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation(), self.position)
            .inverse()
    }

    /// Projection matrix. `perspective_rh` already uses the [0,1] depth
    /// range of wgpu.
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fovy.to_radians(),
            self.aspect.max(f32::EPSILON),
            self.znear,
            self.zfar,
        )
    }

    /// Build the combined view-projection matrix.
    #[must_use]
    pub fn build_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Update the aspect ratio from a surface size. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }
}

impl Orientable for Camera {
    fn set_orientation(&mut self, yaw: f32, pitch: f32, roll: f32) {
        self.yaw = yaw;
        self.pitch = pitch;
        self.roll = roll;
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
/// GPU uniform buffer holding the view-projection matrix and camera metadata.
pub struct CameraUniform {
    /// Combined view-projection matrix.
    pub view_proj: [[f32; 4]; 4],
    /// Camera world-space position.
    pub position: [f32; 3],
    /// Viewport aspect ratio.
    pub aspect: f32,
    /// Camera right vector, for billboarding.
    pub right: [f32; 3],
    /// Vertical field of view in degrees.
    pub fovy: f32,
    /// Camera up vector, for billboarding.
    pub up: [f32; 3],
    /// Padding for GPU alignment.
    pub(crate) _pad: f32,
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraUniform {
    /// Create a new camera uniform with identity view-projection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            position: [0.0; 3],
            aspect: 1.0,
            right: [1.0, 0.0, 0.0],
            fovy: 60.0,
            up: [0.0, 1.0, 0.0],
            _pad: 0.0,
        }
    }

    /// Update uniform fields from the given camera's current state.
    pub fn update_view_proj(&mut self, camera: &Camera) {
        let rotation = camera.rotation();
        self.view_proj = camera.build_matrix().to_cols_array_2d();
        self.position = camera.position.to_array();
        self.aspect = camera.aspect;
        self.right = (rotation * Vec3::X).to_array();
        self.up = (rotation * Vec3::Y).to_array();
        self.fovy = camera.fovy;
    }
}
