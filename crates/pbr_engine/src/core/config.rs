//! # Demo Configuration
//!
//! Every tunable of the demo lives here, grouped by subsystem, and is loaded
//! through the [`Config`] trait from either TOML or RON.
//!
//! ## Sections
//!
//! - **Engine**: log level
//! - **Renderer**: window, validation layers, shader binaries
//! - **Assets**: where the glTF models live
//! - **Camera**: initial first-person camera placement and projection
//! - **Scene**: initial selection, pause state, animation speed, extra materials

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use crate::config::{Config, ConfigError};
use crate::render::material::{Material, MaterialCatalog};
use crate::render::scene::ObjectKind;

/// Shader directories probed when resolving relative shader paths
const SHADER_SEARCH_DIRS: [&str; 5] = ["target/shaders/", "shaders/", "../target/shaders/", "../shaders/", "./"];

/// # Shader Configuration
///
/// Paths of the precompiled SPIR-V binaries used by the single graphics pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaderConfig {
    /// Path to the vertex shader SPIR-V file
    pub vertex_shader_path: String,
    /// Path to the fragment shader SPIR-V file
    pub fragment_shader_path: String,
}

impl ShaderConfig {
    /// Create a new shader configuration
    pub fn new(vertex_path: impl Into<String>, fragment_path: impl Into<String>) -> Self {
        Self {
            vertex_shader_path: vertex_path.into(),
            fragment_shader_path: fragment_path.into(),
        }
    }

    /// Resolve shader binaries against the usual shader directories
    ///
    /// Falls back to `target/shaders/<name>` when no candidate exists, so the error
    /// raised later names a sensible path.
    pub fn with_path_resolution(base_vertex: &str, base_fragment: &str) -> Self {
        let resolve = |name: &str| {
            SHADER_SEARCH_DIRS
                .iter()
                .map(|dir| format!("{dir}{name}"))
                .find(|candidate| Path::new(candidate).exists())
                .unwrap_or_else(|| format!("target/shaders/{name}"))
        };

        Self::new(resolve(base_vertex), resolve(base_fragment))
    }

    /// Check that both shader files exist
    pub fn check_files(&self) -> Result<(), ConfigError> {
        for path in [&self.vertex_shader_path, &self.fragment_shader_path] {
            if !Path::new(path).exists() {
                return Err(ConfigError::Invalid(format!("Shader not found: {path}")));
            }
        }
        Ok(())
    }
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self::with_path_resolution("pbrbasic/pbr.vert.spv", "pbrbasic/pbr.frag.spv")
    }
}

/// # Engine Configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default log filter, overridden by `RUST_LOG`
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// # Renderer Configuration
///
/// Window and Vulkan instance settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Application name for the window title and Vulkan instance
    pub application_name: String,
    /// Initial window width in screen coordinates
    pub window_width: u32,
    /// Initial window height in screen coordinates
    pub window_height: u32,
    /// Whether to enable Vulkan validation layers
    ///
    /// `None` enables them in debug builds only.
    pub enable_validation: Option<bool>,
    /// Shader configuration
    pub shaders: ShaderConfig,
}

impl RendererConfig {
    /// Whether validation layers should be requested
    pub fn validation_enabled(&self) -> bool {
        self.enable_validation.unwrap_or(cfg!(debug_assertions))
    }

    /// Enable or disable validation layers
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.enable_validation = Some(enabled);
        self
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            application_name: "Physical based shading basics".to_string(),
            window_width: 1280,
            window_height: 720,
            enable_validation: None,
            shaders: ShaderConfig::default(),
        }
    }
}

/// # Asset Configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Base directory for assets; models are read from `<assets_dir>/models/`
    pub assets_dir: String,
}

impl AssetConfig {
    /// Full path of a model file
    pub fn model_path(&self, file_name: &str) -> PathBuf {
        Path::new(&self.assets_dir).join("models").join(file_name)
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            assets_dir: "assets".to_string(),
        }
    }
}

/// # Camera Configuration
///
/// Angles are in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// World-space camera position
    pub position: [f32; 3],
    /// Euler rotation (pitch, yaw, roll) in degrees
    pub rotation: [f32; 3],
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Near clip plane
    pub near: f32,
    /// Far clip plane
    pub far: f32,
    /// Units per second
    pub movement_speed: f32,
    /// Degrees per pixel of mouse movement
    pub rotation_speed: f32,
    /// Negate the projection's Y scale
    pub flip_y: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [10.0, 13.0, 1.8],
            rotation: [-62.5, 90.0, 0.0],
            fov: 60.0,
            near: 0.1,
            far: 256.0,
            movement_speed: 4.0,
            rotation_speed: 0.25,
            flip_y: false,
        }
    }
}

/// # Scene Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Initially selected material
    pub material_index: usize,
    /// Initially selected object
    pub object_index: usize,
    /// Start with light animation paused
    pub paused: bool,
    /// Animation timer speed in loops per second
    pub timer_speed: f32,
    /// Materials appended after the built-in presets
    pub extra_materials: Vec<Material>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            material_index: 0,
            object_index: 0,
            paused: false,
            timer_speed: 0.25 * 0.25,
            extra_materials: Vec::new(),
        }
    }
}

/// # Complete Demo Configuration
///
/// Top-level configuration loaded by the demo application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Engine core configuration
    pub engine: EngineConfig,
    /// Rendering system configuration
    pub renderer: RendererConfig,
    /// Asset system configuration
    pub assets: AssetConfig,
    /// Initial camera
    pub camera: CameraConfig,
    /// Initial scene selection
    pub scene: SceneConfig,
}

impl DemoConfig {
    /// Validate the entire configuration
    ///
    /// Shader and model files are not checked here; they are opened during
    /// renderer startup and fail there with their own error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let renderer = &self.renderer;
        if renderer.application_name.is_empty() {
            return Err(ConfigError::Invalid("Application name cannot be empty".to_string()));
        }
        if renderer.window_width == 0 || renderer.window_height == 0 {
            return Err(ConfigError::Invalid(format!(
                "Window size must be non-zero, got {}x{}",
                renderer.window_width, renderer.window_height
            )));
        }

        let camera = &self.camera;
        if camera.near <= 0.0 || camera.far <= camera.near {
            return Err(ConfigError::Invalid(format!(
                "Clip planes must satisfy 0 < near < far, got near={} far={}",
                camera.near, camera.far
            )));
        }
        if camera.fov <= 0.0 || camera.fov >= 180.0 {
            return Err(ConfigError::Invalid(format!("Field of view out of range: {}", camera.fov)));
        }

        let scene = &self.scene;
        for material in &scene.extra_materials {
            material.validate()?;
        }
        let material_count = MaterialCatalog::presets().len() + scene.extra_materials.len();
        if scene.material_index >= material_count {
            return Err(ConfigError::Invalid(format!(
                "Material index {} out of range (0..{material_count})",
                scene.material_index
            )));
        }
        if scene.object_index >= ObjectKind::ALL.len() {
            return Err(ConfigError::Invalid(format!(
                "Object index {} out of range (0..{})",
                scene.object_index,
                ObjectKind::ALL.len()
            )));
        }
        if scene.timer_speed < 0.0 {
            return Err(ConfigError::Invalid(format!("Timer speed cannot be negative: {}", scene.timer_speed)));
        }

        Ok(())
    }
}

impl Config for DemoConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults_match_demo() {
        let config = DemoConfig::default();

        assert_eq!(config.camera.position, [10.0, 13.0, 1.8]);
        assert_eq!(config.camera.rotation, [-62.5, 90.0, 0.0]);
        assert_relative_eq!(config.camera.fov, 60.0);
        assert_relative_eq!(config.scene.timer_speed, 0.0625);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = DemoConfig::default();
        config.renderer.window_width = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = DemoConfig::default();
        config.scene.material_index = MaterialCatalog::presets().len();
        assert!(config.validate().is_err());

        let mut config = DemoConfig::default();
        config.scene.object_index = ObjectKind::ALL.len();
        assert!(config.validate().is_err());

        let mut config = DemoConfig::default();
        config.camera.near = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_extra_materials_extend_index_range() {
        let mut config = DemoConfig::default();
        config.scene.extra_materials.push(Material::new("Iron", [0.56, 0.57, 0.58], 0.3, 1.0));
        config.scene.material_index = MaterialCatalog::presets().len();

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_partial_file_uses_defaults() {
        let source = r#"
            [renderer]
            window_width = 800

            [scene]
            object_index = 1
            paused = true

            [[scene.extra_materials]]
            name = "Iron"
            color = [0.56, 0.57, 0.58]
            roughness = 0.3
            metallic = 1.0
        "#;
        let config: DemoConfig = toml::from_str(source).unwrap();

        assert_eq!(config.renderer.window_width, 800);
        assert_eq!(config.renderer.window_height, 720);
        assert_eq!(config.scene.object_index, 1);
        assert!(config.scene.paused);
        assert_eq!(config.scene.extra_materials[0].name, "Iron");
        assert_eq!(config.camera, CameraConfig::default());
    }

    #[test]
    fn test_toml_and_ron_round_trip() {
        let mut config = DemoConfig::default();
        config.engine.log_level = "debug".to_string();
        config.scene.material_index = 3;
        config.renderer = config.renderer.with_validation(false);

        let toml_text = toml::to_string_pretty(&config).unwrap();
        let from_toml: DemoConfig = toml::from_str(&toml_text).unwrap();
        assert_eq!(from_toml, config);

        let ron_text = ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default()).unwrap();
        let from_ron: DemoConfig = ron::from_str(&ron_text).unwrap();
        assert_eq!(from_ron, config);
    }

    #[test]
    fn test_model_path() {
        let assets = AssetConfig::default();
        assert_eq!(assets.model_path("sphere.gltf"), Path::new("assets/models/sphere.gltf"));
    }

    #[test]
    fn test_sample_config_is_valid() {
        let config: DemoConfig = toml::from_str(include_str!("../../../../pbrbasic.toml")).unwrap();
        config.validate().unwrap();

        assert_eq!(config.camera, CameraConfig::default());
        assert_eq!(config.scene.timer_speed, SceneConfig::default().timer_speed);
        assert_eq!(config.scene.extra_materials.len(), 1);
        assert_eq!(config.renderer.validation_enabled(), RendererConfig::default().validation_enabled());
    }
}
