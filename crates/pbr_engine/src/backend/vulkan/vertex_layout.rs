//! Vertex input description for the PBR pipeline

use ash::vk;

use crate::assets::Vertex;

/// Binding and attribute descriptions for one interleaved vertex buffer
#[derive(Debug, Clone)]
pub struct VertexLayout {
    /// The single per-vertex binding
    pub binding: vk::VertexInputBindingDescription,
    /// Attributes read from the binding
    pub attributes: Vec<vk::VertexInputAttributeDescription>,
}

impl VertexLayout {
    /// Position at location 0 and normal at location 1, both three floats
    pub fn position_normal() -> Self {
        let binding = vk::VertexInputBindingDescription {
            binding: 0,
            stride: Vertex::STRIDE,
            input_rate: vk::VertexInputRate::VERTEX,
        };

        let attributes = vec![
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: Vertex::POSITION_OFFSET,
            },
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 1,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: Vertex::NORMAL_OFFSET,
            },
        ];

        Self { binding, attributes }
    }

    /// Binding descriptions as a slice for pipeline creation
    pub fn bindings(&self) -> &[vk::VertexInputBindingDescription] {
        std::slice::from_ref(&self.binding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_normal_layout() {
        let layout = VertexLayout::position_normal();

        assert_eq!(layout.binding.binding, 0);
        assert_eq!(layout.binding.stride, 24);
        assert_eq!(layout.bindings().len(), 1);

        let locations: Vec<_> = layout.attributes.iter().map(|a| (a.location, a.offset)).collect();
        assert_eq!(locations, vec![(0, 0), (1, 12)]);
        assert!(layout
            .attributes
            .iter()
            .all(|a| a.format == vk::Format::R32G32B32_SFLOAT && a.binding == 0));
    }
}
