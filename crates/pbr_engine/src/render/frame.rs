//! # Frame Lifecycle
//!
//! Per-frame uniform updates and draw submission, written against the
//! [`GraphicsContext`] trait so the sequencing can be driven by Vulkan or by a
//! recording test double.
//!
//! ## States
//!
//! ```text
//! Uninitialized --prepare--> Prepared --render_frame--> Recording --> Submitted --> Prepared
//! ```
//!
//! Command buffers are recorded once up front and only re-recorded when the
//! selection or the swapchain changes. Every frame re-uploads the camera
//! record and, unless paused, the animated lights.

use super::camera::Camera;
use super::error::{RenderError, RenderResult};
use super::material::{Material, MaterialCatalog};
use super::scene::{grid_positions, ObjectKind};
use super::uniforms::{
    update_camera_uniforms, update_lights, CameraFrameUniforms, LightParams, FRAGMENT_PUSH_OFFSET,
    VERTEX_PUSH_OFFSET,
};
use crate::foundation::time::FrameTimer;

/// Pipeline stage a push-constant range belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    /// Vertex stage
    Vertex,
    /// Fragment stage
    Fragment,
}

/// Sink for the draw commands of one command buffer
pub trait DrawRecorder {
    /// Bind the single graphics pipeline
    fn bind_pipeline(&mut self);

    /// Bind the descriptor set holding camera and light uniforms
    fn bind_descriptor_set(&mut self);

    /// Write `bytes` into the push-constant range of `stage` at `offset`
    fn push_constants(&mut self, stage: ShaderStage, offset: u32, bytes: &[u8]);

    /// Draw every index of the given object's mesh
    fn draw_object(&mut self, object: ObjectKind);
}

/// Graphics capabilities the render loop needs from its host
pub trait GraphicsContext {
    /// Write the camera record into the mapped camera buffer
    fn upload_camera(&mut self, uniforms: &CameraFrameUniforms) -> RenderResult<()>;

    /// Write the light record into the mapped light buffer
    fn upload_lights(&mut self, lights: &LightParams) -> RenderResult<()>;

    /// Re-record every per-image command buffer by invoking `record` on each
    fn record_commands(&mut self, record: &dyn Fn(&mut dyn DrawRecorder)) -> RenderResult<()>;

    /// Acquire the next swapchain image
    ///
    /// Fails with [`RenderError::SwapchainOutOfDate`] when the surface changed.
    fn acquire_frame(&mut self) -> RenderResult<u32>;

    /// Submit the pre-recorded command buffer of `image_index`
    fn submit_frame(&mut self, image_index: u32) -> RenderResult<()>;

    /// Present `image_index` and wait for its work to finish
    fn present_frame(&mut self, image_index: u32) -> RenderResult<()>;

    /// Rebuild size-dependent resources
    fn resize(&mut self, width: u32, height: u32) -> RenderResult<()>;
}

/// Read-only harness state handed to the render loop each frame
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    /// Active camera
    pub camera: &'a Camera,
    /// Animation timer in [0, 1)
    pub timer: f32,
    /// Whether light animation is paused
    pub paused: bool,
}

impl<'a> FrameContext<'a> {
    /// Snapshot the camera and timer
    pub fn new(camera: &'a Camera, timer: &FrameTimer) -> Self {
        Self {
            camera,
            timer: timer.timer(),
            paused: timer.is_paused(),
        }
    }

    /// Build a context from explicit timer values
    pub fn at(camera: &'a Camera, timer: f32, paused: bool) -> Self {
        Self { camera, timer, paused }
    }
}

/// Where the render loop is in its frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// Nothing uploaded or recorded yet
    Uninitialized,
    /// Ready to render a frame
    Prepared,
    /// Uniforms are being written
    Recording,
    /// The frame has been handed to the GPU
    Submitted,
}

/// Record the full instance grid into `recorder`
///
/// Pipeline and descriptor set are bound once; each of the 49 draws pushes its
/// grid position to the vertex range and the material to the fragment range.
pub fn record_scene(recorder: &mut dyn DrawRecorder, material: &Material, object: ObjectKind) {
    let block = material.push_block();

    recorder.bind_pipeline();
    recorder.bind_descriptor_set();

    for position in grid_positions() {
        let position = [position.x, position.y, position.z];
        recorder.push_constants(ShaderStage::Vertex, VERTEX_PUSH_OFFSET, bytemuck::bytes_of(&position));
        recorder.push_constants(ShaderStage::Fragment, FRAGMENT_PUSH_OFFSET, bytemuck::bytes_of(&block));
        recorder.draw_object(object);
    }
}

/// Drives a [`GraphicsContext`] through the frame lifecycle
pub struct RenderLoop<G: GraphicsContext> {
    context: G,
    materials: MaterialCatalog,
    material_index: usize,
    object_index: usize,
    state: FrameState,
}

impl<G: GraphicsContext> RenderLoop<G> {
    /// Wrap a context, starting with the first material and object
    pub fn new(context: G, materials: MaterialCatalog) -> Self {
        Self {
            context,
            materials,
            material_index: 0,
            object_index: 0,
            state: FrameState::Uninitialized,
        }
    }

    /// Upload initial uniforms and record command buffers
    pub fn prepare(&mut self, frame: &FrameContext<'_>) -> RenderResult<()> {
        if self.state != FrameState::Uninitialized {
            return Err(RenderError::InvalidState(format!(
                "prepare called in state {:?}",
                self.state
            )));
        }

        self.upload_camera(frame)?;
        self.context.upload_lights(&update_lights(frame.timer, frame.paused))?;
        self.record()?;

        self.state = FrameState::Prepared;
        log::info!(
            "Render loop prepared: material '{}', object '{}'",
            self.current_material().name,
            self.current_object()
        );
        Ok(())
    }

    /// Update uniforms, then submit and present one frame
    ///
    /// Does nothing until [`prepare`](Self::prepare) succeeded. An out-of-date
    /// swapchain leaves the loop prepared so the caller can resize and retry.
    pub fn render_frame(&mut self, frame: &FrameContext<'_>) -> RenderResult<()> {
        if self.state != FrameState::Prepared {
            return Ok(());
        }

        match self.run_frame(frame) {
            Ok(()) => {
                self.state = FrameState::Prepared;
                Ok(())
            }
            Err(RenderError::SwapchainOutOfDate) => {
                log::debug!("Swapchain out of date during {:?}", self.state);
                self.state = FrameState::Prepared;
                Err(RenderError::SwapchainOutOfDate)
            }
            Err(e) => Err(e),
        }
    }

    fn run_frame(&mut self, frame: &FrameContext<'_>) -> RenderResult<()> {
        self.state = FrameState::Recording;
        self.upload_camera(frame)?;
        if !frame.paused {
            self.context.upload_lights(&update_lights(frame.timer, false))?;
        }

        let image_index = self.context.acquire_frame()?;
        self.context.submit_frame(image_index)?;
        self.state = FrameState::Submitted;
        self.context.present_frame(image_index)?;

        log::trace!("Presented swapchain image {image_index}");
        Ok(())
    }

    /// Switch material and re-record
    pub fn select_material(&mut self, index: usize) -> RenderResult<()> {
        if index >= self.materials.len() {
            return Err(RenderError::IndexOutOfRange {
                kind: "material",
                index,
                len: self.materials.len(),
            });
        }

        self.material_index = index;
        log::info!("Material: {}", self.current_material().name);
        if self.state == FrameState::Prepared {
            self.record()?;
        }
        Ok(())
    }

    /// Switch object, refresh the model transform and re-record
    pub fn select_object(&mut self, index: usize, frame: &FrameContext<'_>) -> RenderResult<()> {
        if index >= ObjectKind::ALL.len() {
            return Err(RenderError::IndexOutOfRange {
                kind: "object",
                index,
                len: ObjectKind::ALL.len(),
            });
        }

        self.object_index = index;
        log::info!("Object: {}", self.current_object());
        if self.state == FrameState::Prepared {
            self.upload_camera(frame)?;
            self.record()?;
        }
        Ok(())
    }

    /// React to the pause flag changing
    ///
    /// Entering pause uploads the base light configuration once; frames
    /// rendered while paused leave the light buffer alone.
    pub fn set_paused(&mut self, paused: bool, frame: &FrameContext<'_>) -> RenderResult<()> {
        log::info!("Light animation {}", if paused { "paused" } else { "resumed" });
        if paused && self.state == FrameState::Prepared {
            self.context.upload_lights(&update_lights(frame.timer, true))?;
        }
        Ok(())
    }

    /// Rebuild for a new framebuffer size
    ///
    /// A zero-sized framebuffer (minimised window) is ignored.
    pub fn resize(&mut self, width: u32, height: u32, frame: &FrameContext<'_>) -> RenderResult<()> {
        if width == 0 || height == 0 {
            log::debug!("Ignoring resize to {width}x{height}");
            return Ok(());
        }

        self.context.resize(width, height)?;
        if self.state == FrameState::Prepared {
            self.upload_camera(frame)?;
            self.record()?;
        }
        Ok(())
    }

    fn upload_camera(&mut self, frame: &FrameContext<'_>) -> RenderResult<()> {
        let uniforms = update_camera_uniforms(frame.camera, self.object_index);
        self.context.upload_camera(&uniforms)
    }

    fn record(&mut self) -> RenderResult<()> {
        let material = self.materials.get(self.material_index).ok_or(RenderError::IndexOutOfRange {
            kind: "material",
            index: self.material_index,
            len: self.materials.len(),
        })?;
        let object = self.current_object();

        self.context
            .record_commands(&|recorder: &mut dyn DrawRecorder| record_scene(recorder, material, object))
    }

    /// Current lifecycle state
    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Index of the active material
    pub fn material_index(&self) -> usize {
        self.material_index
    }

    /// Index of the active object
    pub fn object_index(&self) -> usize {
        self.object_index
    }

    /// The material catalog
    pub fn materials(&self) -> &MaterialCatalog {
        &self.materials
    }

    /// The active material
    pub fn current_material(&self) -> &Material {
        // material_index is only ever set after a range check
        &self.materials.as_slice()[self.material_index]
    }

    /// The active object
    pub fn current_object(&self) -> ObjectKind {
        ObjectKind::ALL[self.object_index]
    }

    /// The wrapped graphics context
    pub fn context(&self) -> &G {
        &self.context
    }

    /// Mutable access to the wrapped graphics context
    pub fn context_mut(&mut self) -> &mut G {
        &mut self.context
    }

    /// Unwrap the graphics context
    pub fn into_context(self) -> G {
        self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::render::scene::grid_position;
    use crate::render::uniforms::base_lights;
    use approx::assert_relative_eq;

    #[derive(Debug, Clone, PartialEq)]
    enum Command {
        BindPipeline,
        BindDescriptorSet,
        Push { stage: ShaderStage, offset: u32, bytes: Vec<u8> },
        Draw(ObjectKind),
    }

    #[derive(Default)]
    struct CommandList(Vec<Command>);

    impl DrawRecorder for CommandList {
        fn bind_pipeline(&mut self) {
            self.0.push(Command::BindPipeline);
        }

        fn bind_descriptor_set(&mut self) {
            self.0.push(Command::BindDescriptorSet);
        }

        fn push_constants(&mut self, stage: ShaderStage, offset: u32, bytes: &[u8]) {
            self.0.push(Command::Push { stage, offset, bytes: bytes.to_vec() });
        }

        fn draw_object(&mut self, object: ObjectKind) {
            self.0.push(Command::Draw(object));
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Camera(CameraFrameUniforms),
        Lights(LightParams),
        Record(Vec<Command>),
        Acquire(u32),
        Submit(u32),
        Present(u32),
        Resize(u32, u32),
    }

    #[derive(Default)]
    struct MockContext {
        events: Vec<Event>,
        next_image: u32,
        out_of_date_once: bool,
    }

    impl MockContext {
        fn take_events(&mut self) -> Vec<Event> {
            std::mem::take(&mut self.events)
        }
    }

    impl GraphicsContext for MockContext {
        fn upload_camera(&mut self, uniforms: &CameraFrameUniforms) -> RenderResult<()> {
            self.events.push(Event::Camera(*uniforms));
            Ok(())
        }

        fn upload_lights(&mut self, lights: &LightParams) -> RenderResult<()> {
            self.events.push(Event::Lights(*lights));
            Ok(())
        }

        fn record_commands(&mut self, record: &dyn Fn(&mut dyn DrawRecorder)) -> RenderResult<()> {
            let mut commands = CommandList::default();
            record(&mut commands);
            self.events.push(Event::Record(commands.0));
            Ok(())
        }

        fn acquire_frame(&mut self) -> RenderResult<u32> {
            if std::mem::take(&mut self.out_of_date_once) {
                return Err(RenderError::SwapchainOutOfDate);
            }
            let image = self.next_image;
            self.next_image = (self.next_image + 1) % 3;
            self.events.push(Event::Acquire(image));
            Ok(image)
        }

        fn submit_frame(&mut self, image_index: u32) -> RenderResult<()> {
            self.events.push(Event::Submit(image_index));
            Ok(())
        }

        fn present_frame(&mut self, image_index: u32) -> RenderResult<()> {
            self.events.push(Event::Present(image_index));
            Ok(())
        }

        fn resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
            self.events.push(Event::Resize(width, height));
            Ok(())
        }
    }

    fn camera() -> Camera {
        Camera::new(Vec3::new(10.0, 13.0, 1.8), Vec3::new(-62.5, 90.0, 0.0), 60.0, 1.5, 0.1, 256.0)
    }

    fn prepared_loop(camera: &Camera) -> RenderLoop<MockContext> {
        let mut render_loop = RenderLoop::new(MockContext::default(), MaterialCatalog::presets());
        render_loop.prepare(&FrameContext::at(camera, 0.0, false)).unwrap();
        render_loop.context_mut().take_events();
        render_loop
    }

    fn recorded(events: &[Event]) -> Vec<&Vec<Command>> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::Record(commands) => Some(commands),
                _ => None,
            })
            .collect()
    }

    fn fragment_pushes(commands: &[Command]) -> Vec<&[u8]> {
        commands
            .iter()
            .filter_map(|c| match c {
                Command::Push { stage: ShaderStage::Fragment, offset, bytes } => {
                    assert_eq!(*offset, 12);
                    Some(bytes.as_slice())
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_record_scene_structure() {
        let gold = MaterialCatalog::presets().get(0).cloned().unwrap();
        let mut commands = CommandList::default();
        record_scene(&mut commands, &gold, ObjectKind::Venus);
        let commands = commands.0;

        assert_eq!(commands[0], Command::BindPipeline);
        assert_eq!(commands[1], Command::BindDescriptorSet);
        assert_eq!(commands.iter().filter(|c| **c == Command::BindPipeline).count(), 1);
        assert_eq!(commands.iter().filter(|c| **c == Command::BindDescriptorSet).count(), 1);
        assert_eq!(commands.len(), 2 + 49 * 3);

        let draws: Vec<_> = commands.iter().filter(|c| matches!(c, Command::Draw(_))).collect();
        assert_eq!(draws.len(), 49);
        assert!(draws.iter().all(|c| **c == Command::Draw(ObjectKind::Venus)));

        let gold_bytes = bytemuck::bytes_of(&gold.push_block()).to_vec();
        let pushes = fragment_pushes(&commands);
        assert_eq!(pushes.len(), 49);
        assert!(pushes.iter().all(|bytes| *bytes == gold_bytes.as_slice()));
    }

    #[test]
    fn test_record_scene_positions() {
        let mut commands = CommandList::default();
        record_scene(&mut commands, &Material::new("Test", [0.2; 3], 0.5, 0.5), ObjectKind::Sphere);

        let positions: Vec<[f32; 3]> = commands
            .0
            .iter()
            .filter_map(|c| match c {
                Command::Push { stage: ShaderStage::Vertex, offset: 0, bytes } => {
                    Some(bytemuck::pod_read_unaligned(bytes))
                }
                _ => None,
            })
            .collect();

        assert_eq!(positions.len(), 49);
        assert_eq!(positions[0], [-8.75, 0.0, -8.75]);
        let cell = grid_position(3, 3);
        assert_eq!(positions[3 * 7 + 3], [cell.x, cell.y, cell.z]);
        assert_eq!(positions[48], [6.25, 0.0, 6.25]);
    }

    #[test]
    fn test_prepare_uploads_and_records() {
        let camera = camera();
        let mut render_loop = RenderLoop::new(MockContext::default(), MaterialCatalog::presets());
        assert_eq!(render_loop.state(), FrameState::Uninitialized);

        render_loop.prepare(&FrameContext::at(&camera, 0.0, false)).unwrap();
        let events = render_loop.context_mut().take_events();

        assert_eq!(render_loop.state(), FrameState::Prepared);
        assert!(matches!(events[0], Event::Camera(_)));
        assert_eq!(events[1], Event::Lights(update_lights(0.0, false)));
        assert_eq!(recorded(&events).len(), 1);

        let again = render_loop.prepare(&FrameContext::at(&camera, 0.0, false));
        assert!(matches!(again, Err(RenderError::InvalidState(_))));
    }

    #[test]
    fn test_render_before_prepare_is_noop() {
        let camera = camera();
        let mut render_loop = RenderLoop::new(MockContext::default(), MaterialCatalog::presets());

        render_loop.render_frame(&FrameContext::at(&camera, 0.3, false)).unwrap();

        assert!(render_loop.context().events.is_empty());
        assert_eq!(render_loop.state(), FrameState::Uninitialized);
    }

    #[test]
    fn test_frame_sequence() {
        let camera = camera();
        let mut render_loop = prepared_loop(&camera);

        render_loop.render_frame(&FrameContext::at(&camera, 0.25, false)).unwrap();
        let events = render_loop.context_mut().take_events();

        assert_eq!(
            events,
            vec![
                Event::Camera(update_camera_uniforms(&camera, 0)),
                Event::Lights(update_lights(0.25, false)),
                Event::Acquire(0),
                Event::Submit(0),
                Event::Present(0),
            ]
        );
        assert_eq!(render_loop.state(), FrameState::Prepared);
    }

    #[test]
    fn test_paused_frame_skips_light_upload() {
        let camera = camera();
        let mut render_loop = prepared_loop(&camera);

        render_loop.render_frame(&FrameContext::at(&camera, 0.6, true)).unwrap();
        let events = render_loop.context_mut().take_events();

        assert!(events.iter().all(|e| !matches!(e, Event::Lights(_))));
        assert!(matches!(events[0], Event::Camera(_)));
        assert_eq!(events.len(), 4);
    }

    #[test]
    fn test_entering_pause_uploads_base_lights() {
        let camera = camera();
        let mut render_loop = prepared_loop(&camera);

        render_loop.set_paused(true, &FrameContext::at(&camera, 0.42, true)).unwrap();
        assert_eq!(render_loop.context_mut().take_events(), vec![Event::Lights(base_lights())]);

        render_loop.set_paused(false, &FrameContext::at(&camera, 0.42, false)).unwrap();
        assert!(render_loop.context().events.is_empty());
    }

    #[test]
    fn test_select_material_rerecords_without_upload() {
        let camera = camera();
        let mut render_loop = prepared_loop(&camera);

        render_loop.select_material(2).unwrap();
        let events = render_loop.context_mut().take_events();

        assert_eq!(events.len(), 1);
        let chromium = MaterialCatalog::presets().get(2).cloned().unwrap();
        let expected = bytemuck::bytes_of(&chromium.push_block()).to_vec();
        let pushes = fragment_pushes(recorded(&events)[0]);
        assert_eq!(pushes.len(), 49);
        assert!(pushes.iter().all(|bytes| *bytes == expected.as_slice()));
    }

    #[test]
    fn test_selection_out_of_range() {
        let camera = camera();
        let mut render_loop = prepared_loop(&camera);
        let frame = FrameContext::at(&camera, 0.0, false);

        let result = render_loop.select_material(12);
        assert!(matches!(result, Err(RenderError::IndexOutOfRange { kind: "material", index: 12, len: 12 })));
        assert!(render_loop.select_object(6, &frame).is_err());

        assert_eq!(render_loop.material_index(), 0);
        assert_eq!(render_loop.object_index(), 0);
        assert!(render_loop.context().events.is_empty());
    }

    #[test]
    fn test_select_object_uploads_camera_then_records() {
        let camera = camera();
        let mut render_loop = prepared_loop(&camera);

        render_loop.select_object(1, &FrameContext::at(&camera, 0.0, false)).unwrap();
        let events = render_loop.context_mut().take_events();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0], Event::Camera(update_camera_uniforms(&camera, 1)));
        let commands = recorded(&events)[0];
        assert!(commands.contains(&Command::Draw(ObjectKind::Teapot)));
        assert!(!commands.contains(&Command::Draw(ObjectKind::Sphere)));
    }

    #[test]
    fn test_selection_before_prepare_is_deferred() {
        let camera = camera();
        let mut render_loop = RenderLoop::new(MockContext::default(), MaterialCatalog::presets());

        render_loop.select_material(4).unwrap();
        render_loop.select_object(2, &FrameContext::at(&camera, 0.0, false)).unwrap();
        assert!(render_loop.context().events.is_empty());

        render_loop.prepare(&FrameContext::at(&camera, 0.0, false)).unwrap();
        let events = render_loop.context_mut().take_events();
        assert_eq!(events[0], Event::Camera(update_camera_uniforms(&camera, 2)));
        assert!(recorded(&events)[0].contains(&Command::Draw(ObjectKind::Torusknot)));
        assert_eq!(render_loop.current_material().name, "Titanium");
    }

    #[test]
    fn test_out_of_date_swapchain_is_recoverable() {
        let camera = camera();
        let mut render_loop = prepared_loop(&camera);
        render_loop.context_mut().out_of_date_once = true;
        let frame = FrameContext::at(&camera, 0.1, false);

        let result = render_loop.render_frame(&frame);
        assert!(matches!(result, Err(RenderError::SwapchainOutOfDate)));
        assert_eq!(render_loop.state(), FrameState::Prepared);
        render_loop.context_mut().take_events();

        render_loop.resize(800, 600, &frame).unwrap();
        let events = render_loop.context_mut().take_events();
        assert_eq!(events[0], Event::Resize(800, 600));
        assert!(matches!(events[1], Event::Camera(_)));
        assert_eq!(recorded(&events).len(), 1);

        render_loop.render_frame(&frame).unwrap();
        assert!(render_loop.context().events.contains(&Event::Present(0)));
    }

    #[test]
    fn test_zero_size_resize_is_ignored() {
        let camera = camera();
        let mut render_loop = prepared_loop(&camera);

        render_loop.resize(0, 600, &FrameContext::at(&camera, 0.0, false)).unwrap();
        assert!(render_loop.context().events.is_empty());
    }

    #[test]
    fn test_gold_sphere_scenario() {
        let camera = camera();
        let mut render_loop = RenderLoop::new(MockContext::default(), MaterialCatalog::presets());
        render_loop.prepare(&FrameContext::at(&camera, 0.0, false)).unwrap();
        render_loop.context_mut().take_events();

        render_loop.render_frame(&FrameContext::at(&camera, 0.0, false)).unwrap();
        let events = render_loop.context_mut().take_events();

        let Event::Camera(uniforms) = &events[0] else {
            panic!("expected camera upload first, got {:?}", events[0]);
        };
        assert_eq!(uniforms.cam_pos, [-10.0, -13.0, -1.8]);
        let rotated = crate::foundation::math::Mat4::from(uniforms.model)
            * crate::foundation::math::Vec4::new(1.0, 0.0, 0.0, 0.0);
        assert_relative_eq!(rotated.z, 1.0, epsilon = 1e-6);

        let Event::Lights(lights) = &events[1] else {
            panic!("expected light upload second, got {:?}", events[1]);
        };
        // At t = 0 the orbit sits at angle zero
        assert_relative_eq!(lights.lights[0].position[0], 0.0, epsilon = 1e-6);
        assert_relative_eq!(lights.lights[0].position[2], 5.0, epsilon = 1e-6);
        assert_eq!(lights.lights[2], base_lights().lights[2]);

        assert_eq!(render_loop.current_material().name, "Gold");
        assert_eq!(render_loop.current_object(), ObjectKind::Sphere);
    }
}
