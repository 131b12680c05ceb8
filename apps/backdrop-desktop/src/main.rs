mod host;
mod pacer;

use anyhow::Result;
use backdrop_common::SurfaceSize;
use backdrop_render::{BackdropConfig, Host, SceneRenderer};
use backdrop_render_wgpu::WgpuSurface;
use clap::Parser;
use host::WinitHost;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "backdrop-desktop", about = "Rotating computer backdrop in a window")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Do not offer the window as a mount point; render offscreen
    #[arg(long)]
    detached: bool,

    /// Initial window width in pixels
    #[arg(long, default_value = "1280")]
    width: u32,

    /// Initial window height in pixels
    #[arg(long, default_value = "720")]
    height: u32,
}

struct BackdropApp {
    config: BackdropConfig,
    detached: bool,
    initial_size: PhysicalSize<u32>,
    host: Option<WinitHost>,
    renderer: Option<SceneRenderer<WgpuSurface>>,
    error: Option<anyhow::Error>,
}

impl BackdropApp {
    fn new(config: BackdropConfig, detached: bool, initial_size: PhysicalSize<u32>) -> Self {
        Self {
            config,
            detached,
            initial_size,
            host: None,
            renderer: None,
            error: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("Backdrop")
            .with_inner_size(self.initial_size)
            .with_transparent(self.config.surface.transparent);
        let window = Arc::new(event_loop.create_window(attrs)?);

        let mount_id = (!self.detached).then_some(self.config.mount_id.as_str());
        let mut host = WinitHost::new(window, mount_id)?;
        let renderer = SceneRenderer::initialize(&mut host, &self.config)?;

        self.host = Some(host);
        self.renderer = Some(renderer);
        Ok(())
    }

    fn shutdown(&mut self) {
        if let (Some(host), Some(renderer)) = (&mut self.host, &mut self.renderer) {
            renderer.destroy(host);
        }
    }
}

impl ApplicationHandler for BackdropApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.host.is_some() {
            return;
        }
        if let Err(e) = self.start(event_loop) {
            tracing::error!("failed to start backdrop: {e:#}");
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let (Some(host), Some(renderer)) = (&mut self.host, &mut self.renderer) else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                renderer.destroy(host);
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                host.set_viewport(SurfaceSize::new(new_size.width, new_size.height));
                if host.take_viewport_change() {
                    renderer.on_viewport_resize(host);
                }
            }
            WindowEvent::RedrawRequested => {
                if host.take_due_frame().is_none() {
                    return;
                }
                if let Err(e) = renderer.render_frame(host) {
                    tracing::error!("frame {} failed: {e}", renderer.frame_count());
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(host) = &mut self.host else {
            return;
        };
        match host.pump_frames(Instant::now()) {
            Some(due) => event_loop.set_control_flow(ControlFlow::WaitUntil(due)),
            None => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = match &cli.config {
        Some(path) => BackdropConfig::load(path)?,
        None => BackdropConfig::default(),
    };

    tracing::info!("backdrop-desktop starting (mount={})", config.mount_id);

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = BackdropApp::new(
        config,
        cli.detached,
        PhysicalSize::new(cli.width, cli.height),
    );
    event_loop.run_app(&mut app)?;

    match app.error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
