//! Render error types

use crate::assets::AssetError;
use crate::backend::vulkan::{VulkanError, WindowError};
use crate::config::ConfigError;

/// Errors raised while setting up or driving the renderer
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    /// Vulkan backend failure
    #[error(transparent)]
    Vulkan(#[from] VulkanError),

    /// Model loading failure
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// Window system failure
    #[error(transparent)]
    Window(#[from] WindowError),

    /// Unusable configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Selection index outside its catalog
    #[error("{kind} index {index} out of range (0..{len})")]
    IndexOutOfRange {
        /// Which catalog was indexed
        kind: &'static str,
        /// Requested index
        index: usize,
        /// Catalog length
        len: usize,
    },

    /// Operation not allowed in the current frame state
    #[error("Invalid render state: {0}")]
    InvalidState(String),

    /// Mapped uniform region smaller than the record written to it
    #[error("Uniform record needs {required} bytes but only {available} are mapped")]
    UniformSize {
        /// Bytes the record occupies
        required: usize,
        /// Bytes available in the region
        available: usize,
    },

    /// The swapchain no longer matches the surface and must be rebuilt
    #[error("Swapchain out of date")]
    SwapchainOutOfDate,
}

/// Result type for render operations
pub type RenderResult<T> = Result<T, RenderError>;
