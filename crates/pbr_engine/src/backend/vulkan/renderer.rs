//! Vulkan implementation of [`GraphicsContext`] for the PBR grid
//!
//! Owns every device object the demo needs. Command buffers are recorded per
//! swapchain image and resubmitted unchanged until the render loop asks for a
//! re-record. One frame is in flight at a time: the fence signaled by
//! `submit_frame` is waited on in `present_frame`.

use ash::{vk, Device};

use super::buffer::UniformBuffer;
use super::commands::{ActiveRenderPass, CommandPool, CommandRecorder};
use super::context::{VulkanContext, VulkanError};
use super::descriptor_set::{build_descriptors, PbrDescriptors};
use super::framebuffer::{DepthBuffer, Framebuffer};
use super::mesh::SceneMeshes;
use super::render_pass::RenderPass;
use super::shader::{build_pipeline, GraphicsPipeline};
use super::swapchain::Swapchain;
use super::sync::FrameSync;
use super::vertex_layout::VertexLayout;
use super::window::Window;
use crate::core::config::DemoConfig;
use crate::render::{
    CameraFrameUniforms, DrawRecorder, GraphicsContext, LightParams, ObjectKind, RenderError, RenderResult, ShaderStage,
};

const CLEAR_COLOR: [f32; 4] = [0.025, 0.025, 0.025, 1.0];

/// Forward PBR renderer over one window
///
/// Fields drop top to bottom; the context goes last.
pub struct VulkanPbrRenderer {
    sync: FrameSync,
    command_buffers: Vec<vk::CommandBuffer>,
    command_pool: CommandPool,
    meshes: SceneMeshes,
    pipeline: GraphicsPipeline,
    descriptors: PbrDescriptors,
    light_buffer: UniformBuffer<LightParams>,
    camera_buffer: UniformBuffer<CameraFrameUniforms>,
    framebuffers: Vec<Framebuffer>,
    depth_buffer: DepthBuffer,
    render_pass: RenderPass,
    swapchain: Swapchain,
    context: VulkanContext,
}

impl VulkanPbrRenderer {
    /// Create every device object and load the object meshes
    ///
    /// Fails if shaders or models are missing; nothing is recorded yet.
    pub fn new(window: &mut Window, config: &DemoConfig) -> RenderResult<Self> {
        let renderer_config = &config.renderer;
        renderer_config.shaders.check_files()?;

        let context = VulkanContext::new(
            window,
            &renderer_config.application_name,
            renderer_config.validation_enabled(),
        )?;
        let device = context.raw_device().clone();

        let (width, height) = window.framebuffer_size();
        let swapchain = Swapchain::new(&context, vk::Extent2D { width, height }, None)?;

        let depth_format = context.physical_device.find_depth_format(context.instance())?;
        let render_pass = RenderPass::new_forward_pass(device.clone(), swapchain.format().format, depth_format)?;
        let depth_buffer = DepthBuffer::new(device.clone(), &context.physical_device, depth_format, swapchain.extent())?;
        let framebuffers = Framebuffer::for_swapchain(
            &device,
            render_pass.handle(),
            swapchain.image_views(),
            depth_buffer.image_view(),
            swapchain.extent(),
        )?;

        let camera_buffer = UniformBuffer::<CameraFrameUniforms>::new(device.clone(), &context.physical_device)?;
        let light_buffer = UniformBuffer::<LightParams>::new(device.clone(), &context.physical_device)?;
        let descriptors = build_descriptors(
            &device,
            (camera_buffer.handle(), camera_buffer.size()),
            (light_buffer.handle(), light_buffer.size()),
        )?;

        let pipeline = build_pipeline(
            &device,
            render_pass.handle(),
            &renderer_config.shaders,
            &VertexLayout::position_normal(),
            descriptors.layout.handle(),
        )?;

        let meshes = SceneMeshes::load(&device, &context.physical_device, &config.assets)?;

        let command_pool = CommandPool::new(device.clone(), context.graphics_queue_family())?;
        let command_buffers = command_pool.allocate_command_buffers(swapchain.image_count() as u32)?;
        let sync = FrameSync::new(&device)?;

        log::info!(
            "Vulkan PBR renderer ready ({}x{}, {} swapchain images)",
            swapchain.extent().width,
            swapchain.extent().height,
            swapchain.image_count()
        );

        Ok(Self {
            sync,
            command_buffers,
            command_pool,
            meshes,
            pipeline,
            descriptors,
            light_buffer,
            camera_buffer,
            framebuffers,
            depth_buffer,
            render_pass,
            swapchain,
            context,
        })
    }

    fn device(&self) -> &Device {
        self.context.raw_device()
    }

    /// Current swapchain extent
    pub fn extent(&self) -> (u32, u32) {
        let extent = self.swapchain.extent();
        (extent.width, extent.height)
    }

    /// Read back the camera record as the GPU will see it
    pub fn camera_uniforms(&self) -> RenderResult<CameraFrameUniforms> {
        self.camera_buffer.read()
    }

    /// Read back the light record as the GPU will see it
    pub fn light_params(&self) -> RenderResult<LightParams> {
        self.light_buffer.read()
    }

    /// Block until all submitted work has finished
    pub fn wait_idle(&self) -> RenderResult<()> {
        Ok(self.context.wait_idle()?)
    }
}

impl GraphicsContext for VulkanPbrRenderer {
    fn upload_camera(&mut self, uniforms: &CameraFrameUniforms) -> RenderResult<()> {
        self.camera_buffer.write(uniforms)
    }

    fn upload_lights(&mut self, lights: &LightParams) -> RenderResult<()> {
        self.light_buffer.write(lights)
    }

    fn record_commands(&mut self, record: &dyn Fn(&mut dyn DrawRecorder)) -> RenderResult<()> {
        // Buffers may still be executing
        self.context.wait_idle()?;

        let extent = self.swapchain.extent();
        let render_area = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        };
        let viewport = vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        };
        let clear_values = [
            vk::ClearValue {
                color: vk::ClearColorValue { float32: CLEAR_COLOR },
            },
            vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue { depth: 1.0, stencil: 0 },
            },
        ];

        for (&command_buffer, framebuffer) in self.command_buffers.iter().zip(&self.framebuffers) {
            let mut recorder = CommandRecorder::new(command_buffer, self.device().clone());
            recorder.begin()?;
            {
                let mut pass =
                    recorder.begin_render_pass(self.render_pass.handle(), framebuffer.handle(), render_area, &clear_values)?;
                pass.set_viewport(viewport);
                pass.set_scissor(render_area);

                let mut draw = VulkanDrawRecorder {
                    pass: &mut pass,
                    pipeline: &self.pipeline,
                    descriptor_set: self.descriptors.set,
                    meshes: &self.meshes,
                };
                record(&mut draw);
            }
            recorder.end()?;
        }

        log::debug!("Recorded {} command buffers", self.command_buffers.len());
        Ok(())
    }

    fn acquire_frame(&mut self) -> RenderResult<u32> {
        let acquired = unsafe {
            self.swapchain.loader().acquire_next_image(
                self.swapchain.handle(),
                u64::MAX,
                self.sync.image_available.handle(),
                vk::Fence::null(),
            )
        };

        match acquired {
            Ok((image_index, suboptimal)) => {
                if suboptimal {
                    log::trace!("Acquired suboptimal swapchain image {image_index}");
                }
                Ok(image_index)
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Err(RenderError::SwapchainOutOfDate),
            Err(e) => Err(VulkanError::Api(e).into()),
        }
    }

    fn submit_frame(&mut self, image_index: u32) -> RenderResult<()> {
        let command_buffer = *self
            .command_buffers
            .get(image_index as usize)
            .ok_or(RenderError::IndexOutOfRange {
                kind: "swapchain image",
                index: image_index as usize,
                len: self.command_buffers.len(),
            })?;

        let wait_semaphores = [self.sync.image_available.handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [command_buffer];
        let signal_semaphores = [self.sync.render_finished.handle()];
        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.device().queue_submit(
                self.context.graphics_queue(),
                &[submit_info.build()],
                self.sync.in_flight.handle(),
            )
        }
        .map_err(VulkanError::Api)?;
        Ok(())
    }

    fn present_frame(&mut self, image_index: u32) -> RenderResult<()> {
        let wait_semaphores = [self.sync.render_finished.handle()];
        let swapchains = [self.swapchain.handle()];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::builder()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let presented = unsafe {
            self.swapchain
                .loader()
                .queue_present(self.context.present_queue(), &present_info)
        };

        // The submission completes whether or not presentation succeeded
        self.sync.in_flight.wait(u64::MAX)?;
        self.sync.in_flight.reset()?;

        match presented {
            Ok(false) => Ok(()),
            Ok(true) | Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Err(RenderError::SwapchainOutOfDate),
            Err(e) => Err(VulkanError::Api(e).into()),
        }
    }

    fn resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
        log::info!("Rebuilding swapchain for {width}x{height}");
        self.context.wait_idle()?;

        let swapchain = Swapchain::new(&self.context, vk::Extent2D { width, height }, Some(&self.swapchain))?;
        if swapchain.format().format != self.swapchain.format().format {
            return Err(VulkanError::InvalidOperation {
                reason: format!(
                    "Surface format changed from {:?} to {:?}",
                    self.swapchain.format().format,
                    swapchain.format().format
                ),
            }
            .into());
        }

        // Framebuffers reference the old views and depth image
        self.framebuffers.clear();
        self.swapchain = swapchain;

        let device = self.device().clone();
        self.depth_buffer = DepthBuffer::new(
            device.clone(),
            &self.context.physical_device,
            self.depth_buffer.format(),
            self.swapchain.extent(),
        )?;
        self.framebuffers = Framebuffer::for_swapchain(
            &device,
            self.render_pass.handle(),
            self.swapchain.image_views(),
            self.depth_buffer.image_view(),
            self.swapchain.extent(),
        )?;

        if self.command_buffers.len() != self.swapchain.image_count() {
            self.command_pool.free_command_buffers(&self.command_buffers);
            self.command_buffers = self
                .command_pool
                .allocate_command_buffers(self.swapchain.image_count() as u32)?;
        }
        Ok(())
    }
}

impl Drop for VulkanPbrRenderer {
    fn drop(&mut self) {
        let _ = self.context.wait_idle();
        log::debug!("Vulkan PBR renderer destroyed");
    }
}

/// [`DrawRecorder`] writing into an active render pass
struct VulkanDrawRecorder<'p, 'a> {
    pass: &'p mut ActiveRenderPass<'a>,
    pipeline: &'p GraphicsPipeline,
    descriptor_set: vk::DescriptorSet,
    meshes: &'p SceneMeshes,
}

impl DrawRecorder for VulkanDrawRecorder<'_, '_> {
    fn bind_pipeline(&mut self) {
        self.pass.bind_graphics_pipeline(self.pipeline.handle());
    }

    fn bind_descriptor_set(&mut self) {
        self.pass
            .bind_descriptor_sets(self.pipeline.layout(), &[self.descriptor_set]);
    }

    fn push_constants(&mut self, stage: ShaderStage, offset: u32, bytes: &[u8]) {
        let stage_flags = match stage {
            ShaderStage::Vertex => vk::ShaderStageFlags::VERTEX,
            ShaderStage::Fragment => vk::ShaderStageFlags::FRAGMENT,
        };
        self.pass
            .push_constants(self.pipeline.layout(), stage_flags, offset, bytes);
    }

    fn draw_object(&mut self, object: ObjectKind) {
        let Some(mesh) = self.meshes.get(object) else {
            log::warn!("No mesh loaded for {object}");
            return;
        };
        self.pass.bind_vertex_buffers(0, &[mesh.vertex_buffer()], &[0]);
        self.pass.bind_index_buffer(mesh.index_buffer(), 0, vk::IndexType::UINT32);
        self.pass.draw_indexed(mesh.index_count(), 1, 0);
    }
}
