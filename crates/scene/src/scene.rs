use crate::geometry::Geometry;
use crate::light::Light;
use crate::material::PhongMaterial;
use backdrop_common::{Euler, Transform};
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Index of a composite mesh inside its [`Scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MeshId(pub usize);

/// A rigid sub-mesh with a fixed offset from its parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    name: String,
    geometry: Geometry,
    material: PhongMaterial,
    offset: Transform,
    children: Vec<Part>,
}

impl Part {
    pub fn new(name: impl Into<String>, geometry: Geometry, material: PhongMaterial) -> Self {
        Self {
            name: name.into(),
            geometry,
            material,
            offset: Transform::default(),
            children: Vec::new(),
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.offset.position = position;
        self
    }

    pub fn scaled(mut self, scale: Vec3) -> Self {
        self.offset.scale = scale;
        self
    }

    /// Attach a child whose offset is relative to this part.
    pub fn with_child(mut self, child: Part) -> Self {
        self.children.push(child);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn material(&self) -> &PhongMaterial {
        &self.material
    }

    pub fn offset(&self) -> &Transform {
        &self.offset
    }

    pub fn children(&self) -> &[Part] {
        &self.children
    }

    fn collect<'a>(&'a self, parent: Mat4, out: &mut Vec<DrawItem<'a>>) {
        let world = parent * self.offset.matrix();
        out.push(DrawItem {
            name: &self.name,
            geometry: &self.geometry,
            material: &self.material,
            world,
        });
        for child in &self.children {
            child.collect(world, out);
        }
    }
}

/// A rigid aggregate of parts rendered and transformed as one unit.
///
/// # Invariants
/// - Parts and their offsets are fixed once the mesh is built; only the
///   aggregate's own rotation is exposed mutably.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeMesh {
    name: String,
    position: Vec3,
    rotation: Euler,
    parts: Vec<Part>,
}

impl CompositeMesh {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: Vec3::ZERO,
            rotation: Euler::default(),
            parts: Vec::new(),
        }
    }

    pub fn with_part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    pub fn placed_at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Euler {
        self.rotation
    }

    pub fn rotation_mut(&mut self) -> &mut Euler {
        &mut self.rotation
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Number of parts, children included.
    pub fn part_count(&self) -> usize {
        fn count(parts: &[Part]) -> usize {
            parts.iter().map(|p| 1 + count(&p.children)).sum()
        }
        count(&self.parts)
    }

    /// Aggregate transform: rotation about the mesh origin, then translation.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation.to_quat(), self.position)
    }

    /// Parts flattened depth-first with their world matrices.
    pub fn draw_items(&self) -> Vec<DrawItem<'_>> {
        let root = self.matrix();
        let mut out = Vec::with_capacity(self.part_count());
        for part in &self.parts {
            part.collect(root, &mut out);
        }
        out
    }
}

/// One part ready to draw.
#[derive(Debug, Clone, Copy)]
pub struct DrawItem<'a> {
    pub name: &'a str,
    pub geometry: &'a Geometry,
    pub material: &'a PhongMaterial,
    pub world: Mat4,
}

/// The set of renderable meshes and lights for one frame of output.
///
/// The scene exclusively owns everything it contains.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    meshes: Vec<CompositeMesh>,
    lights: Vec<Light>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mesh(&mut self, mesh: CompositeMesh) -> MeshId {
        let id = MeshId(self.meshes.len());
        tracing::debug!(
            "added mesh '{}' with {} parts",
            mesh.name(),
            mesh.part_count()
        );
        self.meshes.push(mesh);
        id
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub fn mesh(&self, id: MeshId) -> Option<&CompositeMesh> {
        self.meshes.get(id.0)
    }

    pub fn mesh_mut(&mut self, id: MeshId) -> Option<&mut CompositeMesh> {
        self.meshes.get_mut(id.0)
    }

    pub fn meshes(&self) -> &[CompositeMesh] {
        &self.meshes
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Every part of every mesh, in insertion order.
    pub fn draw_list(&self) -> Vec<DrawItem<'_>> {
        self.meshes.iter().flat_map(|m| m.draw_items()).collect()
    }
}
