use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use phys2d_render::device::{Gpu, RenderTarget, SurfaceErrorAction, WgpuDevice};
use phys2d_render::input::platform::winit::translate_window_event;
use phys2d_render::scene::{RenderMask, WorldRenderer};
use phys2d_render::view::Viewport;
use phys2d_render::world::SandboxWorld;

use crate::SandboxConfig;
use crate::clock::{FixedStep, FrameClock};

/// Entry point for the sandbox window.
pub struct Runtime;

impl Runtime {
    /// Runs the event loop until the window closes, then releases the
    /// renderer against `world`.
    pub fn run(config: SandboxConfig, world: SandboxWorld) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, world);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        state.shutdown();
        Ok(())
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

/// Per-window scene state; owns no borrow of the window.
struct Scene {
    renderer: WorldRenderer<WgpuDevice>,
    viewport: Viewport,
    clock: FrameClock,
    stepper: FixedStep,
}

struct AppState {
    config: SandboxConfig,
    world: SandboxWorld,
    mask: RenderMask,

    // Scene before window: the renderer's buffers go before the surface.
    scene: Option<Scene>,
    window: Option<WindowEntry>,
    exit_requested: bool,
}

impl AppState {
    fn new(config: SandboxConfig, world: SandboxWorld) -> Self {
        let mask = config.mask;
        Self {
            config,
            world,
            mask,
            scene: None,
            window: None,
            exit_requested: false,
        }
    }

    fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.config.gpu.clone();
        let entry = WindowEntryTryBuilder {
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .context("GPU initialization failed for window")?;

        let (device, surface) = entry.with(|fields| {
            let scale = fields.window.scale_factor();
            (fields.gpu.create_draw_device(), fields.gpu.logical_size(scale))
        });

        let renderer = WorldRenderer::new(device, &mut self.world)
            .context("failed to build the debug programs")?;

        let mut viewport = Viewport::new(surface);
        viewport.add_camera_control(self.config.camera.clone());
        viewport.add_picking_control(self.config.picking.clone());

        log::info!(
            "sandbox window ready ({}x{} logical)",
            surface.width,
            surface.height
        );

        self.scene = Some(Scene {
            renderer,
            viewport,
            clock: FrameClock::new(),
            stepper: FixedStep::new(self.config.time_step, self.config.max_steps),
        });
        self.window = Some(entry);
        Ok(())
    }

    /// Releases the pointer grasp and every renderer resource. Idempotent.
    fn shutdown(&mut self) {
        if let Some(mut scene) = self.scene.take() {
            scene.viewport.destroy(&mut self.world);
            scene.renderer.destroy(&mut self.world);
        }
        self.window = None;
    }

    fn toggle(&mut self, layer: RenderMask, name: &str) {
        self.mask.toggle(layer);
        log::info!(
            "{name} {}",
            if self.mask.contains(layer) { "shown" } else { "hidden" }
        );
    }

    fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Escape => self.request_exit(),
            KeyCode::Digit1 => self.toggle(RenderMask::AXES, "axes"),
            KeyCode::Digit2 => self.toggle(RenderMask::BODY, "bodies"),
            KeyCode::Digit3 => self.toggle(RenderMask::JOINT, "joints"),
            KeyCode::Digit4 => self.toggle(RenderMask::CONTACT, "contacts"),
            KeyCode::Digit0 => {
                self.mask = self.config.mask;
                log::info!("layers restored");
            }
            _ => {}
        }
    }

    fn redraw(&mut self) {
        let (Some(entry), Some(scene)) = (self.window.as_mut(), self.scene.as_mut()) else {
            return;
        };

        let time = scene.clock.tick();
        for _ in 0..scene.stepper.advance(time.dt) {
            self.world.step(scene.stepper.step());
        }

        scene.renderer.clear();
        scene.renderer.render(&self.world, &scene.viewport, self.mask);

        let failure = entry.with_gpu_mut(|gpu| match gpu.acquire_frame() {
            Ok(mut frame) => {
                scene
                    .renderer
                    .device_mut()
                    .encode(&mut RenderTarget::new(&mut frame.encoder, &frame.view));
                gpu.present(frame);
                None
            }
            Err(err) => {
                scene.renderer.device_mut().discard();
                log::debug!("frame {} skipped: {err}", time.frame_index);
                Some(gpu.recover(err))
            }
        });

        if failure == Some(SurfaceErrorAction::Fatal) {
            log::error!("surface is out of memory; closing");
            self.request_exit();
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(e) = self.create_window(event_loop) {
            log::error!("failed to create sandbox window: {e:#}");
            self.request_exit();
            event_loop.exit();
            return;
        }

        if let Some(entry) = self.window.as_ref() {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // The simulation runs continuously.
        if let Some(entry) = self.window.as_ref() {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        let Some(entry) = self.window.as_mut() else { return };
        if entry.with_window(|w| w.id()) != window_id {
            return;
        }

        if let Some(scene) = self.scene.as_mut() {
            let scale = entry.with_window(|w| w.scale_factor());
            if let Some(ev) = translate_window_event(scale, scene.viewport.input(), &event) {
                scene.viewport.handle_input(&ev, &mut self.world);
            }
        }

        match &event {
            WindowEvent::CloseRequested => {
                self.shutdown();
                self.request_exit();
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => self.handle_key(*code),

            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                let (Some(entry), Some(scene)) = (self.window.as_mut(), self.scene.as_mut())
                else {
                    return;
                };

                let new_size = entry.with_window(|w| w.inner_size());
                let scale = entry.with_window(|w| w.scale_factor());
                entry.with_gpu_mut(|gpu| gpu.resize(new_size));

                // Minimized: keep the last usable projection.
                if new_size.width > 0 && new_size.height > 0 {
                    let logical = entry.with_gpu(|gpu| gpu.logical_size(scale));
                    scene.viewport.resize(logical);
                }
                entry.with_window(|w| w.request_redraw());
            }

            WindowEvent::Focused(true) => {
                if let Some(scene) = self.scene.as_mut() {
                    scene.clock.reset();
                }
            }

            WindowEvent::RedrawRequested => self.redraw(),

            _ => {}
        }

        if self.exit_requested {
            event_loop.exit();
        }
    }
}
