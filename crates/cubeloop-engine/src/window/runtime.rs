use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::coords::Viewport;
use crate::core::{App, FrameCtx, WindowCtx};
use crate::device::{Gpu, GpuInit};
use crate::render_loop::{Capability, FrameOutcome, RenderLoop, Unavailable};
use crate::time::FrameClock;

use super::RedrawScheduler;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "cubeloop".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
        }
    }
}

/// Runtime context passed to the application.
///
/// Commands are buffered and applied after the current frame returns.
#[derive(Default)]
pub struct RuntimeCtx {
    commands: Vec<Command>,
}

impl RuntimeCtx {
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.commands.push(Command::SetTitle(title.into()));
    }

    pub fn exit(&mut self) {
        self.commands.push(Command::Exit);
    }
}

enum Command {
    SetTitle(String),
    Exit,
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens one window and runs `app` as its render loop.
    ///
    /// `probe` is consulted once, after the window exists and before any GPU
    /// device is created. If it reports the backend unavailable, the window
    /// is closed without drawing, `on_unavailable` receives the diagnostic
    /// and `run` returns the [`Unavailable`] error. A frame fault leaves the
    /// window open on its last image; it is returned once the window closes.
    ///
    /// Both can be told apart from setup failures with `anyhow::Error::is`.
    pub fn run<A, P, U>(
        config: RuntimeConfig,
        gpu_init: GpuInit,
        probe: P,
        on_unavailable: U,
        app: A,
    ) -> Result<()>
    where
        A: App + 'static,
        P: FnOnce(&Window, &GpuInit) -> Capability,
        U: FnOnce(&Unavailable),
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState {
            config,
            gpu_init,
            startup: Some(Startup {
                probe,
                on_unavailable,
                app,
            }),
            render_loop: RenderLoop::new(RedrawScheduler::new()),
            window: None,
            failure: None,
        };

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    clock: FrameClock,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

/// Inputs consumed by the first `resumed`.
struct Startup<A, P, U> {
    probe: P,
    on_unavailable: U,
    app: A,
}

struct AppState<A, P, U>
where
    A: App + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    startup: Option<Startup<A, P, U>>,

    render_loop: RenderLoop<A, RedrawScheduler>,
    window: Option<WindowEntry>,

    /// First error to report from `Runtime::run`.
    failure: Option<anyhow::Error>,
}

impl<A, P, U> AppState<A, P, U>
where
    A: App + 'static,
    P: FnOnce(&Window, &GpuInit) -> Capability,
    U: FnOnce(&Unavailable),
{
    fn record_failure(&mut self, err: anyhow::Error) {
        if self.failure.is_none() {
            self.failure = Some(err);
        }
    }

    fn cancel_loop(&mut self) {
        if let Some(handle) = self.render_loop.active_handle() {
            self.render_loop.cancel(handle);
        }
    }

    fn launch(&mut self, event_loop: &ActiveEventLoop, startup: Startup<A, P, U>) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let Startup {
            probe,
            on_unavailable,
            app,
        } = startup;

        // On `Unavailable` the window is dropped here, before anything was drawn.
        let gpu_init = &self.gpu_init;
        self.render_loop
            .start(|| probe(&window, gpu_init), on_unavailable, app)?;

        let gpu_init = self.gpu_init.clone();
        let entry = WindowEntryTryBuilder {
            clock: FrameClock::new(),
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build();

        match entry {
            Ok(entry) => {
                self.window = Some(entry);
                Ok(())
            }
            Err(err) => {
                self.cancel_loop();
                Err(err.context("GPU initialization failed"))
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId) {
        // Redraws the OS asks for on its own carry no frame.
        let Some(handle) = self.render_loop.scheduler_mut().take() else {
            return;
        };

        // Split borrows to avoid `self` capture inside `ouroboros` closures.
        let (render_loop, window) = (&mut self.render_loop, &mut self.window);
        let Some(entry) = window.as_mut() else {
            return;
        };

        let mut runtime_ctx = RuntimeCtx::default();

        let result = entry.with_mut(|fields| {
            render_loop.dispatch_with(handle, |app, next| {
                let mut ctx = FrameCtx {
                    window: WindowCtx {
                        id: window_id,
                        window: fields.window,
                    },
                    gpu: fields.gpu,
                    time: fields.clock.tick(),
                    runtime: &mut runtime_ctx,
                };
                app.on_frame(&mut ctx, next)
            })
        });

        match result {
            Ok(FrameOutcome::Finished) => log::info!("no further frames requested; window stays open"),
            Ok(FrameOutcome::Rescheduled | FrameOutcome::Stale) => {}
            Err(fault) => self.record_failure(fault.into()),
        }

        self.apply_commands(event_loop, runtime_ctx);
    }

    fn apply_commands(&mut self, event_loop: &ActiveEventLoop, mut ctx: RuntimeCtx) {
        for cmd in ctx.commands.drain(..) {
            match cmd {
                Command::SetTitle(title) => {
                    if let Some(entry) = &self.window {
                        entry.with_window(|w| w.set_title(&title));
                    }
                }
                Command::Exit => {
                    self.cancel_loop();
                    event_loop.exit();
                }
            }
        }
    }
}

impl<A, P, U> ApplicationHandler for AppState<A, P, U>
where
    A: App + 'static,
    P: FnOnce(&Window, &GpuInit) -> Capability,
    U: FnOnce(&Unavailable),
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let Some(startup) = self.startup.take() else {
            return;
        };

        if let Err(err) = self.launch(event_loop, startup) {
            if !err.is::<Unavailable>() {
                log::error!("failed to start: {err:#}");
            }
            self.record_failure(err);
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);

        // The render loop asked for a frame; turn it into a redraw unless
        // the window is minimized, which would only spin on skipped frames.
        let Some(entry) = &self.window else {
            return;
        };
        let viewport = Viewport::from(entry.borrow_gpu().size());
        if self.render_loop.scheduler().wants_redraw(viewport) {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(entry) = self.window.as_mut() else {
            return;
        };
        if entry.with_window(|w| w.id()) != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                self.cancel_loop();
                self.window = None;
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => resize_entry(entry, new_size),

            WindowEvent::ScaleFactorChanged { .. } => {
                let new_size = entry.with_window(|w| w.inner_size());
                resize_entry(entry, new_size);
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop, window_id),

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.cancel_loop();
        self.window = None;
    }
}

/// Applies a new window size; restarts frame timing when the window comes back
/// from being minimized so the first frame after does not see the whole pause.
fn resize_entry(entry: &mut WindowEntry, new_size: PhysicalSize<u32>) {
    entry.with_mut(|fields| {
        let was_hidden = !Viewport::from(fields.gpu.size()).is_drawable();
        fields.gpu.resize(new_size);
        if was_hidden && Viewport::from(new_size).is_drawable() {
            log::debug!("window restored at {}x{}", new_size.width, new_size.height);
            fields.clock.reset();
        }
    });
}
