//! # Rendering
//!
//! Backend-independent half of the demo: what gets drawn and in which order.
//!
//! - **Material**: preset catalog, pushed per draw as fragment push constants
//! - **Uniforms**: camera and light records plus their mapped-memory copy
//! - **Scene**: selectable objects and the 7x7 instance grid
//! - **Camera**: first-person camera feeding the view and projection
//! - **Frame**: [`GraphicsContext`] and the [`RenderLoop`] that drives it
//!
//! The Vulkan implementation of [`GraphicsContext`] lives in
//! [`crate::backend::vulkan`].

pub mod camera;
pub mod error;
pub mod frame;
pub mod material;
pub mod scene;
pub mod uniforms;

pub use camera::{Camera, CameraKeys};
pub use error::{RenderError, RenderResult};
pub use frame::{record_scene, DrawRecorder, FrameContext, FrameState, GraphicsContext, RenderLoop, ShaderStage};
pub use material::{Material, MaterialCatalog, MaterialPushBlock};
pub use scene::{grid_position, ObjectKind};
pub use uniforms::{
    copy_to_mapped, read_from_mapped, update_camera_uniforms, update_lights, CameraFrameUniforms, Light, LightParams,
};
