use backdrop_common::SurfaceSize;
use backdrop_render::{FrameHandle, Host, RenderError, SurfaceOptions};
use backdrop_render_wgpu::{
    GpuContext, GpuError, WgpuSurface, pick_alpha_mode, pick_surface_format,
};
use crate::pacer::{FramePacer, Pace};
use std::sync::Arc;
use std::time::Instant;
use winit::window::Window;

/// The window's presentable surface, offered under a mount identifier.
struct MountPoint {
    id: String,
    surface: wgpu::Surface<'static>,
    alpha_modes: Vec<wgpu::CompositeAlphaMode>,
}

/// Host backed by a winit window. Redraw requests are the frame primitive.
/// Once the window surface is mounted the vsync present mode paces them to the
/// display; until then a [`FramePacer`] holds them to the monitor refresh rate.
pub struct WinitHost {
    window: Arc<Window>,
    gpu: GpuContext,
    format: wgpu::TextureFormat,
    mount: Option<MountPoint>,
    transparent: bool,
    presenting: bool,
    pacer: FramePacer,
    started: Instant,
    next_frame: u64,
    requested: Option<FrameHandle>,
    viewport: SurfaceSize,
    watching: bool,
    viewport_changed: bool,
}

impl WinitHost {
    /// Acquire the GPU for `window`. With a `mount_id` the window surface is
    /// offered as a mount point; without one, surfaces stay offscreen.
    pub fn new(window: Arc<Window>, mount_id: Option<&str>) -> Result<Self, GpuError> {
        let instance = GpuContext::instance();
        let surface = instance.create_surface(window.clone())?;
        let gpu = GpuContext::request(instance, Some(&surface))?;

        let caps = surface.get_capabilities(&gpu.adapter);
        let format = pick_surface_format(&caps.formats);
        let mount = mount_id.map(|id| MountPoint {
            id: id.to_string(),
            surface,
            alpha_modes: caps.alpha_modes,
        });

        let refresh = window
            .current_monitor()
            .and_then(|monitor| monitor.refresh_rate_millihertz());
        let pacer = FramePacer::from_refresh_rate(refresh);
        tracing::debug!("unmounted frame interval {:?}", pacer.interval());

        let size = window.inner_size();
        Ok(Self {
            window,
            gpu,
            format,
            mount,
            transparent: false,
            presenting: false,
            pacer,
            started: Instant::now(),
            next_frame: 0,
            requested: None,
            viewport: SurfaceSize::new(size.width, size.height),
            watching: false,
            viewport_changed: false,
        })
    }

    /// Record a new window size.
    pub fn set_viewport(&mut self, size: SurfaceSize) {
        if size == self.viewport {
            return;
        }
        self.viewport = size;
        if self.watching {
            self.viewport_changed = true;
        }
    }

    /// Release a paced frame whose time has come. Returns the instant the
    /// event loop should wake for the next one, if any is pending.
    pub fn pump_frames(&mut self, now: Instant) -> Option<Instant> {
        match self.pacer.poll(now) {
            Pace::Idle => None,
            Pace::Due => {
                self.window.request_redraw();
                None
            }
            Pace::WaitUntil(due) => Some(due),
        }
    }

    /// Claim the outstanding frame request when the window asks to redraw.
    pub fn take_due_frame(&mut self) -> Option<FrameHandle> {
        self.requested.take()
    }
}

impl Host for WinitHost {
    type Surface = WgpuSurface;

    fn viewport(&self) -> SurfaceSize {
        self.viewport
    }

    fn create_surface(&mut self, options: &SurfaceOptions) -> Result<WgpuSurface, RenderError> {
        self.transparent = options.transparent;
        Ok(WgpuSurface::new(
            self.gpu.device.clone(),
            self.gpu.queue.clone(),
            self.format,
            options,
        ))
    }

    fn mount(&mut self, mount_id: &str, surface: &mut WgpuSurface) -> bool {
        match self.mount.take() {
            Some(mount) if mount.id == mount_id => {
                let alpha_mode = pick_alpha_mode(&mount.alpha_modes, self.transparent);
                tracing::debug!("mounting surface on '{mount_id}' with {alpha_mode:?}");
                surface.attach(mount.surface, alpha_mode);
                self.presenting = true;
                true
            }
            other => {
                self.mount = other;
                false
            }
        }
    }

    fn watch_viewport(&mut self) {
        self.watching = true;
    }

    fn take_viewport_change(&mut self) -> bool {
        std::mem::take(&mut self.viewport_changed)
    }

    fn request_frame(&mut self) -> FrameHandle {
        self.next_frame += 1;
        let handle = FrameHandle(self.next_frame);
        self.requested = Some(handle);
        if self.presenting {
            self.window.request_redraw();
        } else {
            self.pacer.schedule(Instant::now());
        }
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.requested == Some(handle) {
            self.requested = None;
            self.pacer.cancel();
        }
    }

    fn elapsed_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }
}
