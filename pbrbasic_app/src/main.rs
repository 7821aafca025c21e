//! Physical based shading basics
//!
//! Renders a 7x7 grid of one object in one metal, lit by four animated
//! lights. Keyboard controls:
//!
//! - `M` / `N`: next / previous material
//! - `O` / `I`: next / previous object
//! - `P`: pause or resume the light animation
//! - `W` `A` `S` `D`: move, right mouse drag: look around
//! - `Esc`: quit
//!
//! The first command-line argument names a `.toml` or `.ron` configuration
//! file; without one `pbrbasic.toml` in the working directory is used if it
//! exists.

use glfw::{Action, Key, MouseButton, WindowEvent};
use pbr_engine::config::{Config, ConfigError};
use pbr_engine::foundation::logging;
use pbr_engine::prelude::*;
use pbr_engine::render::RenderError;
use pbr_engine::backend::vulkan::WindowError;
use thiserror::Error;

const DEFAULT_CONFIG_PATH: &str = "pbrbasic.toml";

/// Fatal application errors
#[derive(Error, Debug)]
enum AppError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("window: {0}")]
    Window(#[from] WindowError),

    #[error("renderer: {0}")]
    Render(#[from] RenderError),
}

#[derive(Debug, Default)]
struct MouseState {
    looking: bool,
    last_position: Option<(f64, f64)>,
}

struct PbrBasicApp {
    render_loop: RenderLoop<VulkanPbrRenderer>,
    camera: Camera,
    timer: FrameTimer,
    mouse: MouseState,
    resize_pending: bool,
    // Dropped after the renderer, which holds its surface
    window: Window,
}

impl PbrBasicApp {
    fn new(config: &DemoConfig) -> Result<Self, AppError> {
        let renderer_config = &config.renderer;
        let mut window = Window::new(
            &renderer_config.application_name,
            renderer_config.window_width,
            renderer_config.window_height,
        )?;

        let renderer = VulkanPbrRenderer::new(&mut window, config)?;
        let camera = Camera::from_config(&config.camera, window.aspect_ratio());
        let mut timer = FrameTimer::new(config.scene.timer_speed);
        timer.set_paused(config.scene.paused);

        let mut render_loop = RenderLoop::new(renderer, MaterialCatalog::from_config(&config.scene));
        let frame = FrameContext::new(&camera, &timer);
        render_loop.select_material(config.scene.material_index)?;
        render_loop.select_object(config.scene.object_index, &frame)?;
        render_loop.prepare(&frame)?;

        Ok(Self {
            render_loop,
            camera,
            timer,
            mouse: MouseState::default(),
            resize_pending: false,
            window,
        })
    }

    fn run(&mut self) -> Result<(), AppError> {
        log::info!("Entering render loop");

        while !self.window.should_close() {
            self.window.poll_events();
            for event in self.window.flush_events() {
                self.handle_event(event)?;
            }

            if self.resize_pending {
                self.rebuild()?;
            }
            if self.resize_pending {
                // Minimised: sleep until the window system has news
                self.window.wait_events();
                continue;
            }

            let delta = self.timer.tick();
            self.camera.update(delta);

            let frame = FrameContext::new(&self.camera, &self.timer);
            match self.render_loop.render_frame(&frame) {
                Ok(()) => {}
                Err(RenderError::SwapchainOutOfDate) => self.resize_pending = true,
                Err(e) => return Err(e.into()),
            }
        }

        self.render_loop.context().wait_idle()?;
        log::info!("Window closed");
        Ok(())
    }

    /// Rebuild size-dependent state; leaves the resize pending while minimised
    fn rebuild(&mut self) -> Result<(), AppError> {
        let (width, height) = self.window.framebuffer_size();
        if width == 0 || height == 0 {
            return Ok(());
        }

        self.camera.update_aspect_ratio(width as f32 / height as f32);
        let frame = FrameContext::new(&self.camera, &self.timer);
        self.render_loop.resize(width, height, &frame)?;
        self.resize_pending = false;
        Ok(())
    }

    fn handle_event(&mut self, event: WindowEvent) -> Result<(), AppError> {
        match event {
            WindowEvent::Key(Key::Escape, _, Action::Press, _) | WindowEvent::Close => {
                self.window.set_should_close(true);
            }
            WindowEvent::Key(key, _, action, _) => self.handle_key(key, action)?,
            WindowEvent::FramebufferSize(..) => self.resize_pending = true,
            WindowEvent::MouseButton(MouseButton::Button2, action, _) => {
                self.mouse.looking = action != Action::Release;
            }
            WindowEvent::CursorPos(x, y) => {
                if let (true, Some((last_x, last_y))) = (self.mouse.looking, self.mouse.last_position) {
                    self.camera.rotate_by_mouse((x - last_x) as f32, (y - last_y) as f32);
                }
                self.mouse.last_position = Some((x, y));
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_key(&mut self, key: Key, action: Action) -> Result<(), AppError> {
        let held = action != Action::Release;
        match key {
            Key::W => self.camera.keys.up = held,
            Key::S => self.camera.keys.down = held,
            Key::A => self.camera.keys.left = held,
            Key::D => self.camera.keys.right = held,
            _ if action != Action::Press => {}
            Key::M => self.step_material(1)?,
            Key::N => self.step_material(-1)?,
            Key::O => self.step_object(1)?,
            Key::I => self.step_object(-1)?,
            Key::P => {
                let paused = self.timer.toggle_pause();
                let frame = FrameContext::new(&self.camera, &self.timer);
                self.render_loop.set_paused(paused, &frame)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn step_material(&mut self, step: isize) -> Result<(), AppError> {
        let index = wrap_index(self.render_loop.material_index(), step, self.render_loop.materials().len());
        self.render_loop.select_material(index)?;
        Ok(())
    }

    fn step_object(&mut self, step: isize) -> Result<(), AppError> {
        let index = wrap_index(self.render_loop.object_index(), step, ObjectKind::ALL.len());
        let frame = FrameContext::new(&self.camera, &self.timer);
        self.render_loop.select_object(index, &frame)?;
        Ok(())
    }
}

fn wrap_index(current: usize, step: isize, len: usize) -> usize {
    (current as isize + step).rem_euclid(len as isize) as usize
}

fn load_config() -> Result<DemoConfig, ConfigError> {
    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = DemoConfig::load_or_default(&path)?;
    config.validate()?;
    Ok(config)
}

fn main() -> Result<(), AppError> {
    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            logging::init();
            log::error!("Failed to load configuration: {e}");
            return Err(e.into());
        }
    };
    logging::init_with_level(&config.engine.log_level);
    log::info!("Starting {}", config.renderer.application_name);

    let result = PbrBasicApp::new(&config).and_then(|mut app| app.run());
    if let Err(e) = &result {
        log::error!("Fatal error: {e}");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_index() {
        assert_eq!(wrap_index(0, 1, 12), 1);
        assert_eq!(wrap_index(11, 1, 12), 0);
        assert_eq!(wrap_index(0, -1, 12), 11);
        assert_eq!(wrap_index(3, -1, 6), 2);
    }
}
