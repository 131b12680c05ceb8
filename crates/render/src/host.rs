use crate::camera::PerspectiveCamera;
use crate::config::SurfaceConfig;
use crate::error::RenderError;
use crate::frame::FrameHandle;
use backdrop_common::{Color, SurfaceSize};
use backdrop_scene::Scene;

/// Creation parameters for an [`OutputSurface`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceOptions {
    pub size: SurfaceSize,
    pub transparent: bool,
    pub antialias: bool,
    pub clear_color: Color,
    pub clear_alpha: f32,
}

impl SurfaceOptions {
    pub fn from_config(size: SurfaceSize, config: &SurfaceConfig) -> Self {
        Self {
            size,
            transparent: config.transparent,
            antialias: config.antialias,
            clear_color: config.clear_color,
            clear_alpha: config.clear_alpha,
        }
    }
}

/// A drawable target that receives one scene image per frame.
pub trait OutputSurface {
    fn size(&self) -> SurfaceSize;

    /// Resize the drawable. Setting the current size again is a no-op.
    fn set_size(&mut self, size: SurfaceSize);

    /// Draw `scene` as seen by `camera`.
    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<(), RenderError>;

    /// Release graphics resources. Calling again is a no-op.
    fn dispose(&mut self);

    fn is_disposed(&self) -> bool;
}

/// Everything the renderer needs from its environment.
///
/// A host supplies the rendering backend (through `create_surface`), the
/// viewport, the mount points, a clock and the per-frame scheduling
/// primitive. Acquiring the backend itself is the host's job; the renderer
/// only ever sees a ready host.
pub trait Host {
    type Surface: OutputSurface;

    /// Current viewport dimensions.
    fn viewport(&self) -> SurfaceSize;

    fn create_surface(&mut self, options: &SurfaceOptions) -> Result<Self::Surface, RenderError>;

    /// Attach `surface` to the mount point named `mount_id`.
    /// Returns `false`, leaving the surface detached, when no such mount exists.
    fn mount(&mut self, mount_id: &str, surface: &mut Self::Surface) -> bool;

    /// Start reporting viewport changes through [`Host::take_viewport_change`].
    fn watch_viewport(&mut self);

    /// Whether the viewport changed since the last call. Always `false`
    /// before [`Host::watch_viewport`].
    fn take_viewport_change(&mut self) -> bool;

    /// Ask for one callback before the next display refresh.
    fn request_frame(&mut self) -> FrameHandle;

    /// Withdraw a request. Unknown or already delivered handles are ignored.
    fn cancel_frame(&mut self, handle: FrameHandle);

    /// Milliseconds on the host clock.
    fn elapsed_ms(&self) -> f64;
}
