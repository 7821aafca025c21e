//! SPIR-V shader loading and the PBR graphics pipeline

use std::ffi::CStr;
use std::io::Cursor;
use std::path::Path;

use ash::{vk, Device};

use super::context::{VulkanError, VulkanResult};
use super::vertex_layout::VertexLayout;
use crate::core::config::ShaderConfig;
use crate::render::uniforms::{FRAGMENT_PUSH_OFFSET, FRAGMENT_PUSH_SIZE, VERTEX_PUSH_OFFSET, VERTEX_PUSH_SIZE};

const ENTRY_POINT: &CStr = c"main";

/// Shader module wrapper with RAII cleanup
pub struct ShaderModule {
    device: Device,
    module: vk::ShaderModule,
}

impl ShaderModule {
    /// Create a shader module from SPIR-V bytes
    ///
    /// `origin` names the source in error messages.
    pub fn from_bytes(device: Device, bytes: &[u8], origin: &str) -> VulkanResult<Self> {
        let code = ash::util::read_spv(&mut Cursor::new(bytes)).map_err(|e| VulkanError::Shader {
            path: origin.to_string(),
            reason: format!("not valid SPIR-V: {e}"),
        })?;

        let create_info = vk::ShaderModuleCreateInfo::builder().code(&code);
        let module = unsafe { device.create_shader_module(&create_info, None)? };
        Ok(Self { device, module })
    }

    /// Load a shader from a SPIR-V file
    pub fn from_file<P: AsRef<Path>>(device: Device, path: P) -> VulkanResult<Self> {
        let path = path.as_ref();
        let origin = path.display().to_string();
        let bytes = std::fs::read(path).map_err(|e| VulkanError::Shader {
            path: origin.clone(),
            reason: e.to_string(),
        })?;

        log::debug!("Loaded shader {origin} ({} bytes)", bytes.len());
        Self::from_bytes(device, &bytes, &origin)
    }

    /// Get shader module handle
    pub fn handle(&self) -> vk::ShaderModule {
        self.module
    }

    /// Stage description entering at `main`
    pub fn stage_info(&self, stage: vk::ShaderStageFlags) -> vk::PipelineShaderStageCreateInfo {
        vk::PipelineShaderStageCreateInfo::builder()
            .stage(stage)
            .module(self.module)
            .name(ENTRY_POINT)
            .build()
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_shader_module(self.module, None);
        }
    }
}

/// Graphics pipeline and its layout with RAII cleanup
pub struct GraphicsPipeline {
    device: Device,
    pipeline: vk::Pipeline,
    layout: vk::PipelineLayout,
}

impl GraphicsPipeline {
    /// Get pipeline handle
    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }

    /// Get layout handle
    pub fn layout(&self) -> vk::PipelineLayout {
        self.layout
    }
}

impl Drop for GraphicsPipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline(self.pipeline, None);
            self.device.destroy_pipeline_layout(self.layout, None);
        }
    }
}

/// Vertex range for the instance position, fragment range for the material
pub fn push_constant_ranges() -> [vk::PushConstantRange; 2] {
    [
        vk::PushConstantRange {
            stage_flags: vk::ShaderStageFlags::VERTEX,
            offset: VERTEX_PUSH_OFFSET,
            size: VERTEX_PUSH_SIZE,
        },
        vk::PushConstantRange {
            stage_flags: vk::ShaderStageFlags::FRAGMENT,
            offset: FRAGMENT_PUSH_OFFSET,
            size: FRAGMENT_PUSH_SIZE,
        },
    ]
}

/// Build the single PBR pipeline
///
/// Triangle lists, back faces culled with counter-clockwise front faces, depth
/// test and write with LESS_OR_EQUAL, no blending, dynamic viewport and scissor.
pub fn build_pipeline(
    device: &Device,
    render_pass: vk::RenderPass,
    shaders: &ShaderConfig,
    vertex_layout: &VertexLayout,
    descriptor_layout: vk::DescriptorSetLayout,
) -> VulkanResult<GraphicsPipeline> {
    let vertex_shader = ShaderModule::from_file(device.clone(), &shaders.vertex_shader_path)?;
    let fragment_shader = ShaderModule::from_file(device.clone(), &shaders.fragment_shader_path)?;

    let shader_stages = [
        vertex_shader.stage_info(vk::ShaderStageFlags::VERTEX),
        fragment_shader.stage_info(vk::ShaderStageFlags::FRAGMENT),
    ];

    let vertex_input = vk::PipelineVertexInputStateCreateInfo::builder()
        .vertex_binding_descriptions(vertex_layout.bindings())
        .vertex_attribute_descriptions(&vertex_layout.attributes);

    let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::builder()
        .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
        .primitive_restart_enable(false);

    // Counts only; the rectangles are set while recording
    let viewport_state = vk::PipelineViewportStateCreateInfo::builder()
        .viewport_count(1)
        .scissor_count(1);

    let rasterizer = vk::PipelineRasterizationStateCreateInfo::builder()
        .depth_clamp_enable(false)
        .rasterizer_discard_enable(false)
        .polygon_mode(vk::PolygonMode::FILL)
        .line_width(1.0)
        .cull_mode(vk::CullModeFlags::BACK)
        .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
        .depth_bias_enable(false);

    let multisampling = vk::PipelineMultisampleStateCreateInfo::builder()
        .sample_shading_enable(false)
        .rasterization_samples(vk::SampleCountFlags::TYPE_1);

    let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::builder()
        .depth_test_enable(true)
        .depth_write_enable(true)
        .depth_compare_op(vk::CompareOp::LESS_OR_EQUAL)
        .depth_bounds_test_enable(false)
        .stencil_test_enable(false);

    let color_blend_attachments = [vk::PipelineColorBlendAttachmentState::builder()
        .color_write_mask(vk::ColorComponentFlags::RGBA)
        .blend_enable(false)
        .build()];
    let color_blending = vk::PipelineColorBlendStateCreateInfo::builder()
        .logic_op_enable(false)
        .attachments(&color_blend_attachments);

    let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
    let dynamic_state = vk::PipelineDynamicStateCreateInfo::builder().dynamic_states(&dynamic_states);

    let push_constant_ranges = push_constant_ranges();
    let set_layouts = [descriptor_layout];
    let layout_info = vk::PipelineLayoutCreateInfo::builder()
        .set_layouts(&set_layouts)
        .push_constant_ranges(&push_constant_ranges);
    let layout = unsafe { device.create_pipeline_layout(&layout_info, None)? };

    let pipeline_info = vk::GraphicsPipelineCreateInfo::builder()
        .stages(&shader_stages)
        .vertex_input_state(&vertex_input)
        .input_assembly_state(&input_assembly)
        .viewport_state(&viewport_state)
        .rasterization_state(&rasterizer)
        .multisample_state(&multisampling)
        .depth_stencil_state(&depth_stencil)
        .color_blend_state(&color_blending)
        .dynamic_state(&dynamic_state)
        .layout(layout)
        .render_pass(render_pass)
        .subpass(0);

    let pipelines = unsafe {
        device.create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_info.build()], None)
    };
    let pipeline = match pipelines {
        Ok(pipelines) => pipelines.into_iter().next(),
        Err((_, err)) => {
            unsafe { device.destroy_pipeline_layout(layout, None) };
            return Err(VulkanError::Api(err));
        }
    };
    let Some(pipeline) = pipeline else {
        unsafe { device.destroy_pipeline_layout(layout, None) };
        return Err(VulkanError::InitializationFailed("No pipeline returned".to_string()));
    };

    log::debug!("PBR graphics pipeline created");
    Ok(GraphicsPipeline {
        device: device.clone(),
        pipeline,
        layout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_constant_ranges_are_disjoint() {
        let [vertex, fragment] = push_constant_ranges();

        assert_eq!(vertex.stage_flags, vk::ShaderStageFlags::VERTEX);
        assert_eq!((vertex.offset, vertex.size), (0, 12));
        assert_eq!(fragment.stage_flags, vk::ShaderStageFlags::FRAGMENT);
        assert_eq!((fragment.offset, fragment.size), (12, 20));
        assert_eq!(vertex.offset + vertex.size, fragment.offset);
    }
}
