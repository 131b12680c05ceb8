//! Shared value types used across the backdrop crates.

mod types;

pub use types::{Color, Euler, SurfaceSize, Transform};
