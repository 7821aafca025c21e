//! # First-Person Camera
//!
//! Euler-angle camera driven by keyboard and mouse input.
//!
//! ## Conventions
//!
//! - Rotation is stored in degrees as (pitch, yaw, roll) and applied X, then Y,
//!   then Z.
//! - `position` is the translation applied to the world, so the eye sits at
//!   `-position`. This is why the uniform data negates it before upload.
//! - Projection is right-handed with a [0, 1] depth range; `flip_y` negates the
//!   vertical scale for hosts that render with an upward Y axis in NDC.
//!
//! Matrices are computed on demand. The camera is tiny and is only read once
//! per frame.

use crate::core::config::CameraConfig;
use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};

/// Directional movement keys currently held down
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CameraKeys {
    /// Strafe left
    pub left: bool,
    /// Strafe right
    pub right: bool,
    /// Move forward
    pub up: bool,
    /// Move backward
    pub down: bool,
}

impl CameraKeys {
    /// Whether any movement key is held
    pub fn any(&self) -> bool {
        self.left || self.right || self.up || self.down
    }
}

/// First-person camera
#[derive(Debug, Clone)]
pub struct Camera {
    /// World translation; the eye sits at `-position`
    pub position: Vec3,
    /// Euler rotation in degrees
    pub rotation: Vec3,
    /// Held movement keys
    pub keys: CameraKeys,
    /// Units per second
    pub movement_speed: f32,
    /// Degrees per pixel of mouse movement
    pub rotation_speed: f32,
    /// Negate the projection's Y scale
    pub flip_y: bool,
    fov: f32,
    znear: f32,
    zfar: f32,
    aspect: f32,
}

impl Camera {
    /// Create a camera with a perspective projection
    ///
    /// `fov_degrees` is the vertical field of view.
    pub fn new(position: Vec3, rotation: Vec3, fov_degrees: f32, aspect: f32, znear: f32, zfar: f32) -> Self {
        Self {
            position,
            rotation,
            keys: CameraKeys::default(),
            movement_speed: 1.0,
            rotation_speed: 1.0,
            flip_y: false,
            fov: fov_degrees,
            znear,
            zfar,
            aspect,
        }
    }

    /// Create the demo camera from configuration
    pub fn from_config(config: &CameraConfig, aspect: f32) -> Self {
        let mut camera = Self::new(
            Vec3::from(config.position),
            Vec3::from(config.rotation),
            config.fov,
            aspect,
            config.near,
            config.far,
        );
        camera.movement_speed = config.movement_speed;
        camera.rotation_speed = config.rotation_speed;
        camera.flip_y = config.flip_y;
        camera
    }

    /// Replace the projection parameters
    pub fn set_perspective(&mut self, fov_degrees: f32, aspect: f32, znear: f32, zfar: f32) {
        self.fov = fov_degrees;
        self.aspect = aspect;
        self.znear = znear;
        self.zfar = zfar;
    }

    /// Keep the field of view but adopt a new viewport aspect ratio
    pub fn update_aspect_ratio(&mut self, aspect: f32) {
        self.aspect = aspect;
        log::trace!("Camera aspect ratio updated to {aspect}");
    }

    /// Current aspect ratio
    pub fn aspect_ratio(&self) -> f32 {
        self.aspect
    }

    /// Vertical field of view in degrees
    pub fn fov(&self) -> f32 {
        self.fov
    }

    /// Near clip plane distance
    pub fn near_clip(&self) -> f32 {
        self.znear
    }

    /// Far clip plane distance
    pub fn far_clip(&self) -> f32 {
        self.zfar
    }

    /// Add a rotation delta in degrees
    pub fn rotate(&mut self, delta: Vec3) {
        self.rotation += delta;
    }

    /// Apply a mouse-drag delta in pixels
    pub fn rotate_by_mouse(&mut self, dx: f32, dy: f32) {
        self.rotate(Vec3::new(dy * self.rotation_speed, -dx * self.rotation_speed, 0.0));
    }

    /// Add a translation delta
    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }

    /// Unit vector the camera moves along when moving forward
    pub fn front(&self) -> Vec3 {
        let pitch = utils::deg_to_rad(self.rotation.x);
        let yaw = utils::deg_to_rad(self.rotation.y);
        Vec3::new(-pitch.cos() * yaw.sin(), pitch.sin(), pitch.cos() * yaw.cos()).normalize()
    }

    /// Move according to the held keys
    ///
    /// Returns whether the camera moved.
    pub fn update(&mut self, delta_seconds: f32) -> bool {
        if !self.keys.any() {
            return false;
        }

        let front = self.front();
        let right = front.cross(&Vec3::y()).normalize();
        let step = delta_seconds * self.movement_speed;

        if self.keys.up {
            self.position += front * step;
        }
        if self.keys.down {
            self.position -= front * step;
        }
        if self.keys.left {
            self.position -= right * step;
        }
        if self.keys.right {
            self.position += right * step;
        }
        true
    }

    /// View matrix: rotation applied after translation
    pub fn view_matrix(&self) -> Mat4 {
        let pitch = if self.flip_y { -self.rotation.x } else { self.rotation.x };
        let rotation = Mat4::rotation_x(utils::deg_to_rad(pitch))
            * Mat4::rotation_y(utils::deg_to_rad(self.rotation.y))
            * Mat4::rotation_z(utils::deg_to_rad(self.rotation.z));

        let mut translation = self.position;
        if self.flip_y {
            translation.y = -translation.y;
        }

        rotation * Mat4::new_translation(&translation)
    }

    /// Perspective projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        let mut projection = Mat4::perspective_rh_zo(utils::deg_to_rad(self.fov), self.aspect, self.znear, self.zfar);
        if self.flip_y {
            projection[(1, 1)] *= -1.0;
        }
        projection
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default(), 16.0 / 9.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_from_config() {
        let camera = Camera::from_config(&CameraConfig::default(), 1.5);

        assert_relative_eq!(camera.position, Vec3::new(10.0, 13.0, 1.8));
        assert_relative_eq!(camera.rotation, Vec3::new(-62.5, 90.0, 0.0));
        assert_relative_eq!(camera.movement_speed, 4.0);
        assert_relative_eq!(camera.aspect_ratio(), 1.5);
        assert_relative_eq!(camera.fov(), 60.0);
    }

    #[test]
    fn test_identity_view_is_translation() {
        let camera = Camera::new(Vec3::new(1.0, 2.0, 3.0), Vec3::zeros(), 60.0, 1.0, 0.1, 100.0);
        let view = camera.view_matrix();

        assert_relative_eq!(view, Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0)), epsilon = EPSILON);
    }

    #[test]
    fn test_front_vector() {
        let mut camera = Camera::new(Vec3::zeros(), Vec3::zeros(), 60.0, 1.0, 0.1, 100.0);
        assert_relative_eq!(camera.front(), Vec3::new(0.0, 0.0, 1.0), epsilon = EPSILON);

        camera.rotation = Vec3::new(0.0, 90.0, 0.0);
        assert_relative_eq!(camera.front(), Vec3::new(-1.0, 0.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_update_moves_by_speed_and_delta() {
        let mut camera = Camera::new(Vec3::zeros(), Vec3::zeros(), 60.0, 1.0, 0.1, 100.0);
        camera.movement_speed = 4.0;

        assert!(!camera.update(1.0));

        camera.keys.up = true;
        assert!(camera.update(0.5));
        assert_relative_eq!(camera.position, Vec3::new(0.0, 0.0, 2.0), epsilon = EPSILON);

        camera.keys = CameraKeys { right: true, ..CameraKeys::default() };
        camera.update(0.25);
        // front (0,0,1) x up (0,1,0) = (-1,0,0)
        assert_relative_eq!(camera.position, Vec3::new(-1.0, 0.0, 2.0), epsilon = EPSILON);
    }

    #[test]
    fn test_mouse_rotation() {
        let mut camera = Camera::new(Vec3::zeros(), Vec3::zeros(), 60.0, 1.0, 0.1, 100.0);
        camera.rotation_speed = 0.25;
        camera.rotate_by_mouse(8.0, 4.0);

        assert_relative_eq!(camera.rotation, Vec3::new(1.0, -2.0, 0.0));
    }

    #[test]
    fn test_projection_flip_y() {
        let mut camera = Camera::new(Vec3::zeros(), Vec3::zeros(), 60.0, 2.0, 0.1, 256.0);
        let projection = camera.projection_matrix();
        let f = 1.0 / (30.0_f32.to_radians()).tan();

        assert_relative_eq!(projection[(1, 1)], f, epsilon = EPSILON);
        assert_relative_eq!(projection[(0, 0)], f / 2.0, epsilon = EPSILON);

        camera.flip_y = true;
        assert_relative_eq!(camera.projection_matrix()[(1, 1)], -f, epsilon = EPSILON);
    }
}
