//! Uniform data model
//!
//! GPU-visible records for the camera and the four lights, the per-draw
//! push-constant layout, and the copy into persistently mapped memory.
//! All records are `#[repr(C)]` and laid out to std140 rules: every member
//! starts on a 16-byte boundary.

use bytemuck::{Pod, Zeroable};

use super::camera::Camera;
use super::error::{RenderError, RenderResult};
use crate::foundation::math::{constants, utils, Mat4, Mat4Ext};

/// Number of lights in [`LightParams`]
pub const LIGHT_COUNT: usize = 4;

/// Byte offset of the vertex-stage push constants (object world position)
pub const VERTEX_PUSH_OFFSET: u32 = 0;
/// Byte size of the vertex-stage push constants
pub const VERTEX_PUSH_SIZE: u32 = 12;
/// Byte offset of the fragment-stage push constants (material block)
pub const FRAGMENT_PUSH_OFFSET: u32 = VERTEX_PUSH_OFFSET + VERTEX_PUSH_SIZE;
/// Byte size of the fragment-stage push constants
pub const FRAGMENT_PUSH_SIZE: u32 = 20;

/// Camera and object transforms, binding 0
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CameraFrameUniforms {
    /// Projection matrix, column-major
    pub projection: [[f32; 4]; 4],
    /// Model matrix, column-major
    pub model: [[f32; 4]; 4],
    /// View matrix, column-major
    pub view: [[f32; 4]; 4],
    /// Camera position as seen by the shader
    pub cam_pos: [f32; 3],
    /// Pads `cam_pos` to a full vec4 slot
    pub _pad: f32,
}

/// One spot light, 64 bytes
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Light {
    /// World position, w = 1
    pub position: [f32; 4],
    /// RGB color, w = radius
    pub color_and_radius: [f32; 4],
    /// Spot direction
    pub direction: [f32; 4],
    /// Inner cut-off, outer cut-off, unused, range
    pub cut_off: [f32; 4],
}

/// All lights, binding 1
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightParams {
    /// Fixed-size light array
    pub lights: [Light; LIGHT_COUNT],
}

/// Extra yaw applied to the model matrix of the teapot, in degrees
const TEAPOT_YAW: f32 = 45.0;

/// Compute the camera record for a frame
///
/// The model rotates every object by -90° about +Y; the teapot (object 1)
/// gets another 45° so its spout faces the camera.
pub fn update_camera_uniforms(camera: &Camera, object_index: usize) -> CameraFrameUniforms {
    let yaw = -90.0 + if object_index == 1 { TEAPOT_YAW } else { 0.0 };
    let model = Mat4::rotation_y(utils::deg_to_rad(yaw));
    let eye = -camera.position;

    CameraFrameUniforms {
        projection: camera.projection_matrix().to_cols_array_2d(),
        model: model.to_cols_array_2d(),
        view: camera.view_matrix().to_cols_array_2d(),
        cam_pos: [eye.x, eye.y, eye.z],
        _pad: 0.0,
    }
}

/// The light configuration before any animation
pub fn base_lights() -> LightParams {
    const P: f32 = 15.0;
    const INTENSITY: f32 = P + 0.1;
    let wide_cut_off = [12.5, 18.5, 0.0, 0.0];

    LightParams {
        lights: [
            Light {
                position: [-P * 0.5, -P * 0.5, -P, 1.0],
                color_and_radius: [1.0, 0.0, 0.0, INTENSITY],
                direction: [1.0, 0.0, 0.0, 1.0],
                cut_off: wide_cut_off,
            },
            Light {
                position: [-P * 2.5, -P * 0.5, P, 1.0],
                color_and_radius: [0.0, 1.0, 0.0, INTENSITY],
                direction: [0.0, 1.0, 0.0, 1.0],
                cut_off: wide_cut_off,
            },
            Light {
                position: [P * 0.5, -P * 0.5, P * 0.5, 1.0],
                color_and_radius: [0.0, 0.0, 1.0, INTENSITY],
                direction: [0.0, 0.0, 1.0, 1.0],
                cut_off: wide_cut_off,
            },
            Light {
                position: [0.0, -P * 0.5, 0.0, 1.0],
                color_and_radius: [1.0, 1.0, 0.0, INTENSITY],
                direction: [0.0, 1.0, 0.0, 1.0],
                cut_off: [
                    utils::deg_to_rad(12.5).cos(),
                    utils::deg_to_rad(50.5).cos(),
                    0.0,
                    20.0,
                ],
            },
        ],
    }
}

/// Orbit offset shared by lights 1 and 3
fn orbit_xy(light: &mut Light, angle: f32) {
    light.position[0] = angle.cos() * 5.0;
    light.position[1] = angle.sin() * 5.0;
}

/// Compute the light record for animation time `timer` in [0, 1)
///
/// Pure in its inputs. When paused the base configuration is returned
/// untouched; otherwise lights 0, 1 and 3 orbit while light 2 stays put.
pub fn update_lights(timer: f32, paused: bool) -> LightParams {
    let mut params = base_lights();
    if paused {
        return params;
    }

    let angle = timer * 5.0 * constants::TAU;
    let [first, second, _, fourth] = &mut params.lights;

    first.position[0] = angle.sin() * 5.0;
    first.position[2] = angle.cos() * 5.0;
    orbit_xy(second, angle);
    orbit_xy(fourth, angle);

    params
}

/// Copy the byte image of `value` to the start of a mapped region
pub fn copy_to_mapped<T: Pod>(mapped: &mut [u8], value: &T) -> RenderResult<()> {
    let bytes = bytemuck::bytes_of(value);
    let available = mapped.len();
    let region = mapped.get_mut(..bytes.len()).ok_or(RenderError::UniformSize {
        required: bytes.len(),
        available,
    })?;
    region.copy_from_slice(bytes);
    Ok(())
}

/// Read a record back from the start of a mapped region
pub fn read_from_mapped<T: Pod>(mapped: &[u8]) -> RenderResult<T> {
    let size = std::mem::size_of::<T>();
    let region = mapped.get(..size).ok_or(RenderError::UniformSize {
        required: size,
        available: mapped.len(),
    })?;
    Ok(bytemuck::pod_read_unaligned(region))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Vec3, Vec4};
    use approx::assert_relative_eq;
    use std::mem::{offset_of, size_of};

    const EPSILON: f32 = 1e-5;

    fn test_camera() -> Camera {
        Camera::new(Vec3::new(10.0, 13.0, 1.8), Vec3::new(-62.5, 90.0, 0.0), 60.0, 1.5, 0.1, 256.0)
    }

    #[test]
    fn test_std140_layouts() {
        assert_eq!(size_of::<CameraFrameUniforms>(), 208);
        assert_eq!(offset_of!(CameraFrameUniforms, projection), 0);
        assert_eq!(offset_of!(CameraFrameUniforms, model), 64);
        assert_eq!(offset_of!(CameraFrameUniforms, view), 128);
        assert_eq!(offset_of!(CameraFrameUniforms, cam_pos), 192);

        assert_eq!(size_of::<Light>(), 64);
        assert_eq!(size_of::<LightParams>(), 256);
        assert_eq!(offset_of!(Light, cut_off), 48);
    }

    #[test]
    fn test_push_constant_ranges() {
        assert_eq!(FRAGMENT_PUSH_OFFSET, 12);
        assert_eq!(FRAGMENT_PUSH_OFFSET + FRAGMENT_PUSH_SIZE, 32);
        assert_eq!(
            FRAGMENT_PUSH_SIZE as usize,
            size_of::<crate::render::material::MaterialPushBlock>()
        );
    }

    #[test]
    fn test_model_rotation_per_object() {
        let camera = test_camera();
        let rotated = |object_index: usize| {
            let uniforms = update_camera_uniforms(&camera, object_index);
            Mat4::from(uniforms.model) * Vec4::new(1.0, 0.0, 0.0, 0.0)
        };

        // -90° about +Y carries +X onto +Z
        assert_relative_eq!(rotated(0), Vec4::new(0.0, 0.0, 1.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(rotated(3), rotated(0), epsilon = EPSILON);

        // -45° for the teapot
        let half = std::f32::consts::FRAC_1_SQRT_2;
        assert_relative_eq!(rotated(1), Vec4::new(half, 0.0, half, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_camera_record_contents() {
        let camera = test_camera();
        let uniforms = update_camera_uniforms(&camera, 0);

        assert_eq!(uniforms.cam_pos, [-10.0, -13.0, -1.8]);
        assert_eq!(uniforms.view, camera.view_matrix().to_cols_array_2d());
        assert_eq!(uniforms.projection, camera.projection_matrix().to_cols_array_2d());
        assert_eq!(uniforms._pad, 0.0);
    }

    #[test]
    fn test_base_lights() {
        let lights = base_lights().lights;

        assert_eq!(lights[0].position, [-7.5, -7.5, -15.0, 1.0]);
        assert_eq!(lights[1].position, [-37.5, -7.5, 15.0, 1.0]);
        assert_eq!(lights[2].position, [7.5, -7.5, 7.5, 1.0]);
        assert_eq!(lights[3].position, [0.0, -7.5, 0.0, 1.0]);
        assert_eq!(lights[0].color_and_radius, [1.0, 0.0, 0.0, 15.1]);
        assert_eq!(lights[3].direction, [0.0, 1.0, 0.0, 1.0]);
        assert_relative_eq!(lights[3].cut_off[0], 12.5_f32.to_radians().cos(), epsilon = EPSILON);
        assert_relative_eq!(lights[3].cut_off[1], 50.5_f32.to_radians().cos(), epsilon = EPSILON);
        assert_eq!(lights[3].cut_off[3], 20.0);
    }

    #[test]
    fn test_light_animation() {
        // a = 2π·5·0.05 = π/2
        let lights = update_lights(0.05, false).lights;

        assert_relative_eq!(lights[0].position[0], 5.0, epsilon = EPSILON);
        assert_relative_eq!(lights[0].position[2], 0.0, epsilon = EPSILON);
        assert_relative_eq!(lights[0].position[1], -7.5);

        for orbiting in [lights[1], lights[3]] {
            assert_relative_eq!(orbiting.position[0], 0.0, epsilon = EPSILON);
            assert_relative_eq!(orbiting.position[1], 5.0, epsilon = EPSILON);
        }
        assert_relative_eq!(lights[1].position[2], 15.0);

        assert_eq!(lights[2], base_lights().lights[2]);
    }

    #[test]
    fn test_light_animation_at_time_zero() {
        let lights = update_lights(0.0, false).lights;

        assert_relative_eq!(lights[0].position[0], 0.0, epsilon = EPSILON);
        assert_relative_eq!(lights[0].position[2], 5.0, epsilon = EPSILON);
        assert_relative_eq!(lights[1].position[0], 5.0, epsilon = EPSILON);
        assert_relative_eq!(lights[1].position[1], 0.0, epsilon = EPSILON);
    }

    #[test]
    fn test_lights_are_deterministic() {
        assert_eq!(update_lights(0.37, false), update_lights(0.37, false));
    }

    #[test]
    fn test_paused_lights_are_time_independent() {
        let a = update_lights(0.1, true);
        let b = update_lights(0.9, true);

        assert_eq!(bytemuck::bytes_of(&a), bytemuck::bytes_of(&b));
        assert_eq!(a, base_lights());
    }

    #[test]
    fn test_mapped_round_trip() {
        let uniforms = update_camera_uniforms(&test_camera(), 1);
        let mut mapped = vec![0xAB_u8; 256];

        copy_to_mapped(&mut mapped, &uniforms).unwrap();
        let read_back: CameraFrameUniforms = read_from_mapped(&mapped).unwrap();

        assert_eq!(read_back, uniforms);
        // Bytes past the record are untouched
        assert!(mapped[208..].iter().all(|b| *b == 0xAB));
    }

    #[test]
    fn test_mapped_region_too_small() {
        let mut mapped = vec![0_u8; 100];
        let result = copy_to_mapped(&mut mapped, &base_lights());

        assert!(matches!(
            result,
            Err(RenderError::UniformSize { required: 256, available: 100 })
        ));
        assert!(read_from_mapped::<LightParams>(&mapped).is_err());
    }
}
