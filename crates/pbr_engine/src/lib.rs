//! # PBR Engine
//!
//! Vulkan rendering core for the "physically based shading basics" demo.
//!
//! ## Features
//!
//! - **Push-constant materials**: a preset catalog of metals pushed per draw
//! - **Persistently mapped uniforms**: camera matrices and four animated lights
//! - **Single pipeline**: one descriptor set, one graphics pipeline, built once
//! - **Frame lifecycle**: a `RenderLoop` driving any [`render::GraphicsContext`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pbr_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DemoConfig::default();
//!     let mut window = Window::new(
//!         &config.renderer.application_name,
//!         config.renderer.window_width,
//!         config.renderer.window_height,
//!     )?;
//!     let renderer = VulkanPbrRenderer::new(&mut window, &config)?;
//!     let mut camera = Camera::from_config(&config.camera, window.aspect_ratio());
//!     let mut timer = FrameTimer::new(config.scene.timer_speed);
//!     let mut render_loop = RenderLoop::new(renderer, MaterialCatalog::from_config(&config.scene));
//!
//!     render_loop.prepare(&FrameContext::new(&camera, &timer))?;
//!     while !window.should_close() {
//!         window.poll_events();
//!         let dt = timer.tick();
//!         camera.update(dt);
//!         render_loop.render_frame(&FrameContext::new(&camera, &timer))?;
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core configuration
pub mod core;
pub mod config;

pub mod foundation;
pub mod assets;
pub mod render;
pub mod backend;

/// Common imports for demo applications
pub mod prelude {
    pub use crate::{
        assets::{FileLoadingFlags, MeshData, ModelLoader, Vertex},
        backend::vulkan::{VulkanPbrRenderer, Window},
        config::{Config, ConfigError},
        core::config::DemoConfig,
        foundation::{
            math::{Mat4, Vec3},
            time::FrameTimer,
        },
        render::{
            Camera, CameraFrameUniforms, FrameContext, FrameState, GraphicsContext, LightParams,
            Material, MaterialCatalog, ObjectKind, RenderError, RenderLoop, RenderResult,
        },
    };
}
