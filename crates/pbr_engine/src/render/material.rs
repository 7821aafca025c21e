//! Material catalog
//!
//! Materials in this demo are plain parameter sets. They never touch a uniform
//! buffer: the selected entry is written into the fragment push-constant range
//! of every draw.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::core::config::SceneConfig;

/// A named PBR parameter set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Display name
    pub name: String,
    /// Linear base color
    pub color: [f32; 3],
    /// Perceptual roughness in [0, 1]
    pub roughness: f32,
    /// Metalness in [0, 1]
    pub metallic: f32,
}

impl Material {
    /// Create a material
    pub fn new(name: impl Into<String>, color: [f32; 3], roughness: f32, metallic: f32) -> Self {
        Self {
            name: name.into(),
            color,
            roughness,
            metallic,
        }
    }

    /// Shorthand for the preset metals, which all share roughness 0.1 and metallic 1.0
    fn metal(name: &str, r: f32, g: f32, b: f32) -> Self {
        Self::new(name, [r, g, b], 0.1, 1.0)
    }

    /// The fragment push-constant image of this material
    pub fn push_block(&self) -> MaterialPushBlock {
        MaterialPushBlock {
            roughness: self.roughness,
            metallic: self.metallic,
            r: self.color[0],
            g: self.color[1],
            b: self.color[2],
        }
    }

    /// Reject parameters outside the ranges the shader expects
    pub fn validate(&self) -> Result<(), ConfigError> {
        let in_unit_range = |value: f32| (0.0..=1.0).contains(&value);

        if self.name.is_empty() {
            return Err(ConfigError::Invalid("Material name cannot be empty".to_string()));
        }
        if !in_unit_range(self.roughness) || !in_unit_range(self.metallic) {
            return Err(ConfigError::Invalid(format!(
                "Material '{}' roughness/metallic must lie in [0, 1]",
                self.name
            )));
        }
        if self.color.iter().any(|c| !c.is_finite() || *c < 0.0) {
            return Err(ConfigError::Invalid(format!("Material '{}' has an invalid color", self.name)));
        }
        Ok(())
    }
}

/// Fragment-stage push constants: roughness, metallic, then the RGB color
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MaterialPushBlock {
    /// Roughness
    pub roughness: f32,
    /// Metallic
    pub metallic: f32,
    /// Red
    pub r: f32,
    /// Green
    pub g: f32,
    /// Blue
    pub b: f32,
}

/// Ordered, immutable list of selectable materials
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialCatalog {
    materials: Vec<Material>,
}

impl MaterialCatalog {
    /// The built-in metals, Gold first
    pub fn presets() -> Self {
        let materials = vec![
            Material::metal("Gold", 1.0, 0.765557, 0.336057),
            Material::metal("Copper", 0.955008, 0.637427, 0.538163),
            Material::metal("Chromium", 0.549585, 0.556114, 0.554256),
            Material::metal("Nickel", 0.659777, 0.608679, 0.525649),
            Material::metal("Titanium", 0.541931, 0.496791, 0.449419),
            Material::metal("Cobalt", 0.662124, 0.654864, 0.633732),
            Material::metal("Platinum", 0.672411, 0.637331, 0.585456),
            Material::metal("planematerial", 0.955008, 0.654864, 0.336057),
            // Testing materials
            Material::metal("White", 1.0, 1.0, 1.0),
            Material::metal("Red", 1.0, 0.0, 0.0),
            Material::metal("Blue", 0.0, 0.0, 1.0),
            Material::metal("Black", 0.0, 0.0, 0.0),
        ];
        Self { materials }
    }

    /// Presets followed by the configured extra materials
    pub fn from_config(scene: &SceneConfig) -> Self {
        let mut catalog = Self::presets();
        catalog.materials.extend(scene.extra_materials.iter().cloned());
        catalog
    }

    /// Material at `index`, if any
    pub fn get(&self, index: usize) -> Option<&Material> {
        self.materials.get(index)
    }

    /// Number of materials
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Whether the catalog holds no materials
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Display names in catalog order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.materials.iter().map(|m| m.name.as_str())
    }

    /// All materials in catalog order
    pub fn as_slice(&self) -> &[Material] {
        &self.materials
    }

    /// Iterate over all materials
    pub fn iter(&self) -> std::slice::Iter<'_, Material> {
        self.materials.iter()
    }
}

impl Default for MaterialCatalog {
    fn default() -> Self {
        Self::presets()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_presets_order_and_values() {
        let catalog = MaterialCatalog::presets();
        let names: Vec<_> = catalog.names().collect();

        assert_eq!(
            names,
            [
                "Gold",
                "Copper",
                "Chromium",
                "Nickel",
                "Titanium",
                "Cobalt",
                "Platinum",
                "planematerial",
                "White",
                "Red",
                "Blue",
                "Black"
            ]
        );
        assert_eq!(catalog.len(), 12);
        assert_eq!(catalog.get(7).map(|m| m.color), Some([0.955008, 0.654864, 0.336057]));
        assert_eq!(catalog.get(8).map(|m| m.name.as_str()), Some("White"));
        assert_eq!(catalog.get(11).map(|m| m.name.as_str()), Some("Black"));

        let gold = catalog.get(0).unwrap();
        assert_eq!(gold.color, [1.0, 0.765557, 0.336057]);
        assert!(catalog.iter().all(|m| m.roughness == 0.1 && m.metallic == 1.0));
    }

    #[test]
    fn test_push_block_layout() {
        assert_eq!(std::mem::size_of::<MaterialPushBlock>(), 20);

        let copper = MaterialCatalog::presets().get(1).cloned().unwrap();
        let block = copper.push_block();
        let floats: [f32; 5] = bytemuck::cast(block);

        assert_relative_eq!(floats[0], 0.1);
        assert_relative_eq!(floats[1], 1.0);
        assert_eq!(&floats[2..], &copper.color[..]);
    }

    #[test]
    fn test_from_config_appends_extras() {
        let mut scene = SceneConfig::default();
        scene.extra_materials.push(Material::new("Iron", [0.56, 0.57, 0.58], 0.3, 1.0));

        let catalog = MaterialCatalog::from_config(&scene);
        assert_eq!(catalog.len(), MaterialCatalog::presets().len() + 1);
        assert_eq!(catalog.get(catalog.len() - 1).map(|m| m.name.as_str()), Some("Iron"));
        assert!(catalog.get(catalog.len()).is_none());
    }

    #[test]
    fn test_material_validation() {
        assert!(Material::new("Ok", [0.5; 3], 0.5, 0.0).validate().is_ok());
        assert!(Material::new("", [0.5; 3], 0.5, 0.0).validate().is_err());
        assert!(Material::new("Rough", [0.5; 3], 1.5, 0.0).validate().is_err());
        assert!(Material::new("Neg", [-0.1, 0.0, 0.0], 0.5, 0.0).validate().is_err());
    }
}
