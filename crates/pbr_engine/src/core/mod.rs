//! # Core Module
//!
//! Shared configuration for every subsystem of the demo.

pub mod config;

pub use config::{
    AssetConfig,
    CameraConfig,
    Config,
    ConfigError,
    DemoConfig,
    EngineConfig,
    RendererConfig,
    SceneConfig,
    ShaderConfig,
};
