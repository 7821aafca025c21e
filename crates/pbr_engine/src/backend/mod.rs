//! Graphics backends

pub mod vulkan;
