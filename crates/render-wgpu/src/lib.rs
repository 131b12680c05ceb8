//! wgpu render backend for the backdrop.
//!
//! Draws each part of the scene with a Blinn-Phong shader lit by the scene's
//! ambient, directional and point lights. Transparent parts are drawn after
//! opaque ones with blending and without depth writes.
//!
//! # Invariants
//! - The surface never mutates the scene.
//! - Part geometry is tessellated and uploaded once, on the first frame.

mod context;
mod gpu;
mod shaders;
mod uniforms;

pub use context::{GpuContext, GpuError};
pub use gpu::{WgpuSurface, clear_color, pick_alpha_mode, pick_surface_format};
pub use uniforms::MAX_LIGHTS;
