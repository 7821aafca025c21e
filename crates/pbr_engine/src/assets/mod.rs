//! Asset loading
//!
//! Only glTF meshes are loaded; shaders are read directly by the Vulkan backend.

pub mod gltf_loader;

pub use gltf_loader::{FileLoadingFlags, MeshData, ModelLoader, Vertex};

use thiserror::Error;

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// The glTF file or one of its buffers could not be imported
    #[error("Failed to import '{path}': {source}")]
    Import {
        /// File that was being imported
        path: String,
        /// Underlying glTF error
        #[source]
        source: gltf::Error,
    },

    /// A primitive lacks a required vertex attribute
    #[error("Mesh '{mesh}' has no {attribute} attribute")]
    MissingAttribute {
        /// Name of the offending mesh
        mesh: String,
        /// Attribute semantic
        attribute: &'static str,
    },

    /// The file contains no drawable triangles
    #[error("No triangle geometry found in '{0}'")]
    EmptyModel(String),
}
