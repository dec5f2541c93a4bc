//! Windowed host: winit event loop, glutin GL context, Skia GPU surface.
//!
//! One redraw is requested per presented frame, so the animation runs at the
//! display refresh rate with swaps synced to vblank.

use std::{ffi::CString, num::NonZeroU32, time::Instant};

use glutin::{
    config::{ConfigTemplateBuilder, GlConfig},
    context::{ContextApi, ContextAttributesBuilder, NotCurrentGlContext, PossiblyCurrentContext},
    display::{GetGlDisplay, GlDisplay},
    prelude::GlSurface,
    surface::{Surface as GlutinSurface, SurfaceAttributesBuilder, SwapInterval, WindowSurface},
};
use glutin_winit::DisplayBuilder;
use raw_window_handle::HasWindowHandle;
use skia_safe::gpu::gl::FramebufferInfo;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalPosition, LogicalSize, PhysicalSize},
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowAttributes},
};

use crate::config::{AppConfig, WindowConfig};
use crate::error::{GridError, Result};
use crate::input::InputEvent;
use crate::renderer::Renderer;
use crate::scene::Scene;
use crate::ticker::Ticker;

struct Env {
    gl_surface: GlutinSurface<WindowSurface>,
    gl_context: PossiblyCurrentContext,
    window: Window,
}

struct App {
    // Field order is drop order: the Skia context must go before the window.
    renderer: Option<Renderer>,
    env: Option<Env>,
    scene: Scene,
    ticker: Option<Ticker>,
    window_config: WindowConfig,
    started: Instant,
    scale_factor: f64,
}

fn logical_size(physical: PhysicalSize<u32>, scale_factor: f64) -> (u32, u32) {
    let logical: LogicalSize<f64> = physical.to_logical(scale_factor);
    (logical.width.round() as u32, logical.height.round() as u32)
}

/// Reshape to send when the logical extent differs from the scene's.
///
/// A scale factor change can keep the physical size while the logical one
/// moves, so the comparison is done in logical pixels.
fn reshape_for(
    physical: PhysicalSize<u32>,
    scale_factor: f64,
    current: (f32, f32),
) -> Option<InputEvent> {
    let (width, height) = logical_size(physical, scale_factor);
    ((width as f32, height as f32) != current)
        .then_some(InputEvent::ViewportReshape { width, height })
}

impl App {

    fn push_input(&mut self, event: InputEvent) {
        self.scene.handle_input(&event, self.started.elapsed());
    }

    fn mount(&mut self, event_loop: &ActiveEventLoop) {
        match create_env_renderer(event_loop, &self.window_config) {
            Ok((env, mut renderer)) => {
                let size = env.window.inner_size();
                self.scale_factor = env.window.scale_factor();
                renderer.set_ticker(self.ticker.clone());
                let (width, height) = logical_size(size, self.scale_factor);
                self.scene.resize(width as f32, height as f32);
                tracing::info!(
                    width,
                    height,
                    scale_factor = self.scale_factor,
                    "grid mounted"
                );
                env.window.request_redraw();
                self.env = Some(env);
                self.renderer = Some(renderer);
            }
            Err(err) => {
                tracing::warn!(error = %err, "drawing surface unavailable, grid not started");
                event_loop.exit();
            }
        }
    }

    fn unmount(&mut self) {
        if self.env.is_some() {
            tracing::info!(frames = self.scene.frames(), "grid unmounted");
        }
        self.renderer = None;
        self.env = None;
    }

    fn handle_resize(&mut self, physical_size: PhysicalSize<u32>) {
        let (w, h): (u32, u32) = physical_size.into();
        if let Some(reshape) = reshape_for(physical_size, self.scale_factor, self.scene.size()) {
            self.push_input(reshape);
        }

        if let (Some(env), Some(renderer)) = (self.env.as_mut(), self.renderer.as_mut()) {
            env.gl_surface
                .resize(&env.gl_context, non_zero(w), non_zero(h));
            if let Err(err) = renderer.resize((w.max(1), h.max(1))) {
                tracing::warn!(error = %err, "could not recreate surface after resize");
            }
            env.window.request_redraw();
        }
    }

    fn redraw(&mut self) {
        let frame = self.scene.tick(self.started.elapsed());
        if let (Some(env), Some(renderer)) = (self.env.as_mut(), self.renderer.as_mut()) {
            renderer.set_scale_factor(self.scale_factor as f32);
            renderer.draw(&frame);
            if let Err(err) = env.gl_surface.swap_buffers(&env.gl_context) {
                tracing::warn!(error = %err, "swap_buffers failed");
            }
            env.window.request_redraw();
        }
    }
}

fn non_zero(value: u32) -> NonZeroU32 {
    NonZeroU32::new(value).unwrap_or(NonZeroU32::MIN)
}

fn create_env_renderer(
    event_loop: &ActiveEventLoop,
    config: &WindowConfig,
) -> Result<(Env, Renderer)> {
    let window_attributes = WindowAttributes::default()
        .with_title(config.window_title.clone())
        .with_resizable(config.window_resizeable)
        .with_inner_size(LogicalSize::new(config.width.max(1), config.height.max(1)));

    let template = ConfigTemplateBuilder::new()
        .with_alpha_size(8)
        .with_transparency(true);

    let display_builder = DisplayBuilder::new().with_window_attributes(Some(window_attributes));
    let (window, gl_config) = display_builder
        .build(event_loop, template, |configs| {
            // Skia prefers the config with the fewest samples.
            configs
                .reduce(|accum, cfg| {
                    if cfg.num_samples() < accum.num_samples() {
                        cfg
                    } else {
                        accum
                    }
                })
                .expect("glutin offers at least one config")
        })
        .map_err(|err| GridError::Window(format!("failed to build display: {err}")))?;

    let window = window.ok_or_else(|| GridError::Window("could not create window".to_string()))?;
    let window_handle = window
        .window_handle()
        .map_err(|err| GridError::Window(format!("failed to get window handle: {err}")))?;
    let raw_window_handle = window_handle.as_raw();

    let context_attributes = ContextAttributesBuilder::new().build(Some(raw_window_handle));
    let fallback_context_attributes = ContextAttributesBuilder::new()
        .with_context_api(ContextApi::Gles(None))
        .build(Some(raw_window_handle));

    let display = gl_config.display();
    let not_current_gl_context = unsafe {
        match display.create_context(&gl_config, &context_attributes) {
            Ok(context) => context,
            Err(_) => display
                .create_context(&gl_config, &fallback_context_attributes)
                .map_err(|err| {
                    GridError::GlContext(format!("failed to create GL/GLES context: {err}"))
                })?,
        }
    };

    let (width, height): (u32, u32) = window.inner_size().into();
    let attrs = SurfaceAttributesBuilder::<WindowSurface>::new().build(
        raw_window_handle,
        non_zero(width),
        non_zero(height),
    );

    let gl_surface = unsafe {
        display
            .create_window_surface(&gl_config, &attrs)
            .map_err(|err| GridError::GlContext(format!("could not create GL window surface: {err}")))?
    };

    let gl_context = not_current_gl_context
        .make_current(&gl_surface)
        .map_err(|err| GridError::GlContext(format!("could not make GL context current: {err}")))?;

    if let Err(err) = gl_surface.set_swap_interval(&gl_context, SwapInterval::Wait(NonZeroU32::MIN))
    {
        tracing::warn!(error = %err, "vsync unavailable, frames will not be display-synced");
    }

    gl::load_with(|s| {
        CString::new(s)
            .map(|name| display.get_proc_address(name.as_c_str()))
            .unwrap_or(std::ptr::null())
    });

    let interface = skia_safe::gpu::gl::Interface::new_load_with(|name| {
        if name == "eglGetCurrentDisplay" {
            return std::ptr::null();
        }
        CString::new(name)
            .map(|name| display.get_proc_address(name.as_c_str()))
            .unwrap_or(std::ptr::null())
    })
    .ok_or_else(|| GridError::GlContext("could not create Skia GL interface".to_string()))?;

    let gr_context = skia_safe::gpu::direct_contexts::make_gl(interface, None).ok_or_else(|| {
        GridError::GlContext("make_gl failed: could not create Skia direct context".to_string())
    })?;

    let fb_info = {
        let mut fboid: i32 = 0;
        unsafe { gl::GetIntegerv(gl::FRAMEBUFFER_BINDING, &mut fboid) };

        FramebufferInfo {
            fboid: fboid as u32,
            format: skia_safe::gpu::gl::Format::RGBA8.into(),
            ..Default::default()
        }
    };

    let num_samples = gl_config.num_samples() as usize;
    let stencil_size = gl_config.stencil_size() as usize;

    let renderer = Renderer::new(
        (width.max(1), height.max(1)),
        fb_info,
        gr_context,
        num_samples,
        stencil_size,
    )?;

    let env = Env {
        gl_surface,
        gl_context,
        window,
    };

    Ok((env, renderer))
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.env.is_none() {
            self.mount(event_loop);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                let logical: LogicalPosition<f64> = position.to_logical(self.scale_factor);
                self.push_input(InputEvent::CursorPos {
                    x: logical.x as f32,
                    y: logical.y as f32,
                });
            }

            WindowEvent::MouseInput { state, .. } => {
                self.push_input(InputEvent::CursorButton {
                    pressed: matches!(state, ElementState::Pressed),
                });
            }

            WindowEvent::MouseWheel { .. } => self.push_input(InputEvent::CursorScroll),

            WindowEvent::CloseRequested => {
                self.unmount();
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                self.handle_resize(physical_size);
            }

            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.scale_factor = scale_factor;
                if let Some(env) = self.env.as_ref() {
                    let size = env.window.inner_size();
                    self.handle_resize(size);
                }
            }

            WindowEvent::RedrawRequested => self.redraw(),

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.unmount();
    }
}

/// Opens a window and animates the grid until it is closed.
///
/// A missing GL or Skia context is not an error: it is logged and the
/// function returns without drawing.
pub fn run(config: &AppConfig) -> Result<()> {
    let el = EventLoop::new()
        .map_err(|err| GridError::Window(format!("failed to create event loop: {err}")))?;

    let grid = config.grid.to_grid_config();
    let window_config = config.window.clone();
    let scene = Scene::new(
        grid,
        (window_config.width as f32, window_config.height as f32),
    )
    .with_ticker(config.ticker.enabled);
    let ticker = config
        .ticker
        .enabled
        .then(|| Ticker::new(config.ticker.items.clone(), config.ticker.speed_secs));

    let mut app = App {
        renderer: None,
        env: None,
        scene,
        ticker,
        window_config,
        started: Instant::now(),
        scale_factor: 1.0,
    };
    el.run_app(&mut app)
        .map_err(|err| GridError::Window(format!("event loop failed: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::config::GridConfig;

    #[test]
    fn scale_change_with_same_physical_size_reshapes_scene() {
        let physical = PhysicalSize::new(1280, 800);
        let mut scene = Scene::new(GridConfig::default(), (1280.0, 800.0));

        assert_eq!(reshape_for(physical, 1.0, scene.size()), None);

        let reshape = reshape_for(physical, 2.0, scene.size()).expect("logical size moved");
        assert_eq!(
            reshape,
            InputEvent::ViewportReshape {
                width: 640,
                height: 400
            }
        );
        scene.handle_input(&reshape, Duration::ZERO);

        let frame = scene.tick(Duration::ZERO);
        assert_eq!(frame.plan.size, (640.0, 400.0));
        let base = frame.plan.base.expect("base grid");
        assert!(base.lines.iter().all(|s| s.to.0 <= 640.0 && s.to.1 <= 400.0));
        assert_eq!(reshape_for(physical, 2.0, scene.size()), None);
    }

    #[test]
    fn fractional_scale_rounds_logical_size() {
        assert_eq!(logical_size(PhysicalSize::new(1920, 1080), 1.5), (1280, 720));
        assert_eq!(logical_size(PhysicalSize::new(1001, 1), 2.0), (501, 1));
    }
}
