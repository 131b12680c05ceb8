//! GPU-free host and surface.
//!
//! The debug text surface produces a human-readable dump of each frame,
//! which the CLI prints and the tests inspect.

use crate::camera::PerspectiveCamera;
use crate::error::RenderError;
use crate::frame::FrameHandle;
use crate::host::{Host, OutputSurface, SurfaceOptions};
use crate::renderer::SceneRenderer;
use backdrop_common::SurfaceSize;
use backdrop_scene::Scene;

/// Surface that renders the scene as text.
#[derive(Debug)]
pub struct DebugTextSurface {
    options: SurfaceOptions,
    attached_to: Option<String>,
    frames_rendered: u64,
    last_frame: String,
    disposed: bool,
}

impl DebugTextSurface {
    pub fn new(options: SurfaceOptions) -> Self {
        Self {
            options,
            attached_to: None,
            frames_rendered: 0,
            last_frame: String::new(),
            disposed: false,
        }
    }

    pub fn options(&self) -> &SurfaceOptions {
        &self.options
    }

    pub fn attached_to(&self) -> Option<&str> {
        self.attached_to.as_deref()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Text of the most recent frame, empty before the first one.
    pub fn last_frame(&self) -> &str {
        &self.last_frame
    }

    fn describe(&self, scene: &Scene, camera: &PerspectiveCamera) -> String {
        let mut out = String::new();
        let size = self.options.size;
        out.push_str(&format!(
            "=== Frame {} ({}x{}, mount={}) ===\n",
            self.frames_rendered,
            size.width,
            size.height,
            self.attached_to.as_deref().unwrap_or("none")
        ));
        let p = camera.position;
        out.push_str(&format!(
            "Camera: pos=({:.1}, {:.1}, {:.1}) fov={:.0} aspect={:.3}\n",
            p.x, p.y, p.z, camera.fov_degrees, camera.aspect
        ));
        out.push_str(&format!("Lights: {}\n", scene.lights().len()));
        for mesh in scene.meshes() {
            let r = mesh.rotation();
            out.push_str(&format!(
                "Mesh '{}': rot=({:.4}, {:.4}, {:.4})\n",
                mesh.name(),
                r.x,
                r.y,
                r.z
            ));
            for item in mesh.draw_items() {
                let o = item.world.transform_point3(glam::Vec3::ZERO);
                out.push_str(&format!(
                    "  [{}] pos=({:.2}, {:.2}, {:.2}) opacity={:.2}\n",
                    item.name,
                    o.x,
                    o.y,
                    o.z,
                    item.material.effective_opacity()
                ));
            }
        }
        out
    }
}

impl OutputSurface for DebugTextSurface {
    fn size(&self) -> SurfaceSize {
        self.options.size
    }

    fn set_size(&mut self, size: SurfaceSize) {
        self.options.size = size;
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<(), RenderError> {
        if self.disposed {
            return Err(RenderError::Disposed);
        }
        self.frames_rendered += 1;
        self.last_frame = self.describe(scene, camera);
        Ok(())
    }

    fn dispose(&mut self) {
        self.disposed = true;
        self.last_frame.clear();
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}

/// Simulated environment with a manual clock ticking at 60 Hz.
#[derive(Debug)]
pub struct HeadlessHost {
    viewport: SurfaceSize,
    mounts: Vec<String>,
    clock_ms: f64,
    frame_interval_ms: f64,
    next_frame: u64,
    requested: Option<FrameHandle>,
    cancelled: Vec<FrameHandle>,
    watching: bool,
    viewport_changed: bool,
}

impl HeadlessHost {
    pub fn new(viewport: SurfaceSize) -> Self {
        Self {
            viewport,
            mounts: Vec::new(),
            clock_ms: 0.0,
            frame_interval_ms: 1000.0 / 60.0,
            next_frame: 0,
            requested: None,
            cancelled: Vec::new(),
            watching: false,
            viewport_changed: false,
        }
    }

    /// Offer a mount point with the given identifier.
    pub fn with_mount(mut self, mount_id: impl Into<String>) -> Self {
        self.mounts.push(mount_id.into());
        self
    }

    pub fn set_viewport(&mut self, size: SurfaceSize) {
        self.viewport = size;
        if self.watching {
            self.viewport_changed = true;
        }
    }

    /// Move the clock forward without delivering a frame.
    pub fn advance(&mut self, ms: f64) {
        self.clock_ms += ms;
    }

    /// The frame request waiting to be delivered.
    pub fn requested(&self) -> Option<FrameHandle> {
        self.requested
    }

    pub fn cancelled(&self) -> &[FrameHandle] {
        &self.cancelled
    }

    /// Deliver up to `frames` frames, applying viewport changes first.
    /// Stops early when no frame is requested. Returns the number delivered.
    pub fn run(
        &mut self,
        renderer: &mut SceneRenderer<DebugTextSurface>,
        frames: u64,
    ) -> Result<u64, RenderError> {
        let mut delivered = 0;
        for _ in 0..frames {
            if self.take_viewport_change() {
                renderer.on_viewport_resize(&*self);
            }
            if self.requested.take().is_none() {
                break;
            }
            self.clock_ms += self.frame_interval_ms;
            renderer.render_frame(self)?;
            delivered += 1;
        }
        Ok(delivered)
    }
}

impl Host for HeadlessHost {
    type Surface = DebugTextSurface;

    fn viewport(&self) -> SurfaceSize {
        self.viewport
    }

    fn create_surface(&mut self, options: &SurfaceOptions) -> Result<DebugTextSurface, RenderError> {
        Ok(DebugTextSurface::new(*options))
    }

    fn mount(&mut self, mount_id: &str, surface: &mut DebugTextSurface) -> bool {
        if self.mounts.iter().any(|m| m == mount_id) {
            surface.attached_to = Some(mount_id.to_string());
            true
        } else {
            false
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
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.requested == Some(handle) {
            self.requested = None;
            self.cancelled.push(handle);
        }
    }

    fn elapsed_ms(&self) -> f64 {
        self.clock_ms
    }
}
