//! Math utilities and types
//!
//! Provides the fundamental math types used by the camera and uniform code.

pub use nalgebra::{
    Vector3, Vector4,
    Matrix3, Matrix4,
};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// 2 * Pi
    pub const TAU: f32 = 2.0 * PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }
}

/// Extension trait for building transformation matrices
pub trait Mat4Ext {
    /// Create a rotation matrix around the X axis
    fn rotation_x(angle: f32) -> Mat4;

    /// Create a rotation matrix around the Y axis
    fn rotation_y(angle: f32) -> Mat4;

    /// Create a rotation matrix around the Z axis
    fn rotation_z(angle: f32) -> Mat4;

    /// Right-handed perspective projection with a [0, 1] depth range
    ///
    /// Same element layout as `glm::perspectiveRH_ZO`, which is what the
    /// SPIR-V shaders of this demo were written against.
    fn perspective_rh_zo(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Convert to the column-major array layout uniform buffers expect
    fn to_cols_array_2d(&self) -> [[f32; 4]; 4];
}

impl Mat4Ext for Mat4 {
    fn rotation_x(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::x_axis(), angle)
    }

    fn rotation_y(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::y_axis(), angle)
    }

    fn rotation_z(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::z_axis(), angle)
    }

    fn perspective_rh_zo(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let tan_half_fovy = (fov_y * 0.5).tan();

        let mut result = Mat4::zeros();
        result[(0, 0)] = 1.0 / (aspect * tan_half_fovy);
        result[(1, 1)] = 1.0 / tan_half_fovy;
        result[(2, 2)] = far / (near - far);
        result[(3, 2)] = -1.0;
        result[(2, 3)] = -(far * near) / (far - near);
        result
    }

    fn to_cols_array_2d(&self) -> [[f32; 4]; 4] {
        (*self).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rotation_y_quarter_turn() {
        let rotation = Mat4::rotation_y(constants::PI * 0.5);
        let rotated = rotation.transform_vector(&Vec3::new(1.0, 0.0, 0.0));

        // Right-handed: +X rotates onto -Z
        assert_relative_eq!(rotated, Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-6);
    }

    #[test]
    fn test_perspective_depth_range() {
        let near = 0.1;
        let far = 256.0;
        let projection = Mat4::perspective_rh_zo(utils::deg_to_rad(60.0), 1.0, near, far);

        let project_depth = |z: f32| {
            let clip = projection * Vec4::new(0.0, 0.0, z, 1.0);
            clip.z / clip.w
        };

        // Looking down -Z, near maps to 0 and far maps to 1
        assert_relative_eq!(project_depth(-near), 0.0, epsilon = 1e-5);
        assert_relative_eq!(project_depth(-far), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_cols_array_is_column_major() {
        let translation = Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0));
        let cols = translation.to_cols_array_2d();

        assert_eq!(cols[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(cols[0], [1.0, 0.0, 0.0, 0.0]);
    }
}
