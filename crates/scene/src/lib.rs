//! Scene graph for the backdrop: composite meshes, lights and primitive tessellation.
//!
//! # Invariants
//! - The scene exclusively owns its meshes and lights.
//! - Part offsets inside a composite mesh never change after construction.

pub mod computer;
pub mod geometry;
pub mod light;
pub mod material;
pub mod scene;

pub use computer::{COMPUTER_POSITION, computer_model, lighting_rig};
pub use geometry::{Geometry, MAX_SEGMENTS, MeshData, Vertex};
pub use light::Light;
pub use material::PhongMaterial;
pub use scene::{CompositeMesh, DrawItem, MeshId, Part, Scene};
