//! Renderer-agnostic scene renderer.
//!
//! # Invariants
//! - The renderer owns its scene, camera and surface; the host only supplies
//!   the backend, the viewport, mount points, a clock and frame callbacks.
//! - Yaw advances one fixed step per delivered frame; pitch is a pure
//!   function of the host clock.
//! - Disposal is terminal.
//!
//! The [`headless`] host and debug text surface let consumers run the
//! renderer without a GPU. Backends implement [`Host`] and [`OutputSurface`]
//! without changing this crate.

mod animation;
mod camera;
mod config;
mod error;
mod frame;
pub mod headless;
mod host;
mod renderer;

pub use animation::Spin;
pub use camera::PerspectiveCamera;
pub use config::{
    AnimationConfig, BackdropConfig, CameraConfig, DEFAULT_MOUNT_ID, SurfaceConfig,
};
pub use error::{ConfigError, RenderError};
pub use frame::{FrameHandle, FrameLoop};
pub use headless::{DebugTextSurface, HeadlessHost};
pub use host::{Host, OutputSurface, SurfaceOptions};
pub use renderer::{Phase, SceneRenderer};

pub fn crate_info() -> &'static str {
    "backdrop-render v0.1.0"
}
