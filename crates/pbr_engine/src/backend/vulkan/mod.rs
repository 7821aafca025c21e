//! Vulkan backend built on ash and GLFW

pub mod buffer;
pub mod commands;
pub mod context;
pub mod descriptor_set;
pub mod framebuffer;
pub mod mesh;
pub mod render_pass;
pub mod renderer;
pub mod shader;
pub mod swapchain;
pub mod sync;
pub mod vertex_layout;
pub mod window;

pub use context::{VulkanContext, VulkanError, VulkanResult};
pub use descriptor_set::{build_descriptors, PbrDescriptors};
pub use renderer::VulkanPbrRenderer;
pub use shader::{build_pipeline, GraphicsPipeline};
pub use vertex_layout::VertexLayout;
pub use window::{Window, WindowError, WindowResult};
