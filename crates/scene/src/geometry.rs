use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

/// Upper bound on radial and sphere segment counts. A 255 x 255 sphere has
/// exactly 65,536 vertices, the most `u16` indices can address.
pub const MAX_SEGMENTS: u16 = 255;

/// A single tessellated vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Indexed triangle list with counter-clockwise front faces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Fixed-shape primitive, centred on its local origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Box {
        width: f32,
        height: f32,
        depth: f32,
    },
    /// Rectangle in the XY plane facing +Z.
    Plane { width: f32, height: f32 },
    /// Capped cylinder along Y.
    Cylinder {
        radius_top: f32,
        radius_bottom: f32,
        height: f32,
        radial_segments: u16,
    },
    Sphere {
        radius: f32,
        width_segments: u16,
        height_segments: u16,
    },
}

impl Geometry {
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        Self::Box {
            width,
            height,
            depth,
        }
    }

    pub fn plane(width: f32, height: f32) -> Self {
        Self::Plane { width, height }
    }

    /// Cylinder with 8 radial segments. A zero height yields a flat disc.
    pub fn cylinder(radius_top: f32, radius_bottom: f32, height: f32) -> Self {
        Self::Cylinder {
            radius_top,
            radius_bottom,
            height,
            radial_segments: 8,
        }
    }

    /// Segment counts are clamped to `3..=MAX_SEGMENTS` and `2..=MAX_SEGMENTS`
    /// when tessellated.
    pub fn sphere(radius: f32, width_segments: u16, height_segments: u16) -> Self {
        Self::Sphere {
            radius,
            width_segments,
            height_segments,
        }
    }

    pub fn tessellate(&self) -> MeshData {
        match *self {
            Self::Box {
                width,
                height,
                depth,
            } => box_mesh(width * 0.5, height * 0.5, depth * 0.5),
            Self::Plane { width, height } => plane_mesh(width * 0.5, height * 0.5),
            Self::Cylinder {
                radius_top,
                radius_bottom,
                height,
                radial_segments,
            } => cylinder_mesh(
                radius_top,
                radius_bottom,
                height,
                radial_segments.clamp(3, MAX_SEGMENTS),
            ),
            Self::Sphere {
                radius,
                width_segments,
                height_segments,
            } => sphere_mesh(
                radius,
                width_segments.clamp(3, MAX_SEGMENTS),
                height_segments.clamp(2, MAX_SEGMENTS),
            ),
        }
    }
}

fn vertex(position: [f32; 3], normal: [f32; 3]) -> Vertex {
    Vertex { position, normal }
}

fn box_mesh(x: f32, y: f32, z: f32) -> MeshData {
    #[rustfmt::skip]
    let vertices = vec![
        // +Z face
        vertex([-x, -y,  z], [0.0, 0.0, 1.0]),
        vertex([ x, -y,  z], [0.0, 0.0, 1.0]),
        vertex([ x,  y,  z], [0.0, 0.0, 1.0]),
        vertex([-x,  y,  z], [0.0, 0.0, 1.0]),
        // -Z face
        vertex([ x, -y, -z], [0.0, 0.0, -1.0]),
        vertex([-x, -y, -z], [0.0, 0.0, -1.0]),
        vertex([-x,  y, -z], [0.0, 0.0, -1.0]),
        vertex([ x,  y, -z], [0.0, 0.0, -1.0]),
        // +X face
        vertex([ x, -y,  z], [1.0, 0.0, 0.0]),
        vertex([ x, -y, -z], [1.0, 0.0, 0.0]),
        vertex([ x,  y, -z], [1.0, 0.0, 0.0]),
        vertex([ x,  y,  z], [1.0, 0.0, 0.0]),
        // -X face
        vertex([-x, -y, -z], [-1.0, 0.0, 0.0]),
        vertex([-x, -y,  z], [-1.0, 0.0, 0.0]),
        vertex([-x,  y,  z], [-1.0, 0.0, 0.0]),
        vertex([-x,  y, -z], [-1.0, 0.0, 0.0]),
        // +Y face
        vertex([-x,  y,  z], [0.0, 1.0, 0.0]),
        vertex([ x,  y,  z], [0.0, 1.0, 0.0]),
        vertex([ x,  y, -z], [0.0, 1.0, 0.0]),
        vertex([-x,  y, -z], [0.0, 1.0, 0.0]),
        // -Y face
        vertex([-x, -y, -z], [0.0, -1.0, 0.0]),
        vertex([ x, -y, -z], [0.0, -1.0, 0.0]),
        vertex([ x, -y,  z], [0.0, -1.0, 0.0]),
        vertex([-x, -y,  z], [0.0, -1.0, 0.0]),
    ];
    let indices = (0..6u16)
        .flat_map(|face| {
            let b = face * 4;
            [b, b + 1, b + 2, b + 2, b + 3, b]
        })
        .collect();
    MeshData { vertices, indices }
}

fn plane_mesh(x: f32, y: f32) -> MeshData {
    let n = [0.0, 0.0, 1.0];
    MeshData {
        vertices: vec![
            vertex([-x, -y, 0.0], n),
            vertex([x, -y, 0.0], n),
            vertex([x, y, 0.0], n),
            vertex([-x, y, 0.0], n),
        ],
        indices: vec![0, 1, 2, 2, 3, 0],
    }
}

fn cylinder_mesh(radius_top: f32, radius_bottom: f32, height: f32, segments: u16) -> MeshData {
    let half = height * 0.5;
    let slope = if height.abs() > f32::EPSILON {
        (radius_bottom - radius_top) / height
    } else {
        0.0
    };
    let mut mesh = MeshData::default();

    // Side: ring 0 at the top, ring 1 at the bottom.
    for (y, radius) in [(half, radius_top), (-half, radius_bottom)] {
        for i in 0..=segments {
            let theta = i as f32 / segments as f32 * TAU;
            let (sin, cos) = theta.sin_cos();
            let normal = glam::Vec3::new(sin, slope, cos).normalize();
            mesh.vertices
                .push(vertex([radius * sin, y, radius * cos], normal.to_array()));
        }
    }
    let row = segments + 1;
    for i in 0..segments {
        let a = i;
        let b = row + i;
        let c = row + i + 1;
        let d = i + 1;
        mesh.indices.extend_from_slice(&[a, b, d, b, c, d]);
    }

    for top in [true, false] {
        let (y, radius, ny) = if top {
            (half, radius_top, 1.0)
        } else {
            (-half, radius_bottom, -1.0)
        };
        if radius <= 0.0 {
            continue;
        }
        let center = mesh.vertices.len() as u16;
        mesh.vertices.push(vertex([0.0, y, 0.0], [0.0, ny, 0.0]));
        for i in 0..=segments {
            let theta = i as f32 / segments as f32 * TAU;
            let (sin, cos) = theta.sin_cos();
            mesh.vertices
                .push(vertex([radius * sin, y, radius * cos], [0.0, ny, 0.0]));
        }
        for i in 0..segments {
            let p0 = center + 1 + i;
            let p1 = p0 + 1;
            if top {
                mesh.indices.extend_from_slice(&[center, p0, p1]);
            } else {
                mesh.indices.extend_from_slice(&[center, p1, p0]);
            }
        }
    }
    mesh
}

fn sphere_mesh(radius: f32, width_segments: u16, height_segments: u16) -> MeshData {
    let mut mesh = MeshData::default();
    let row = width_segments + 1;

    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let dir = glam::Vec3::new(
                -(u * TAU).cos() * (v * PI).sin(),
                (v * PI).cos(),
                (u * TAU).sin() * (v * PI).sin(),
            );
            mesh.vertices
                .push(vertex((dir * radius).to_array(), dir.to_array()));
        }
    }

    for iy in 0..height_segments {
        for ix in 0..width_segments {
            let a = iy * row + ix + 1;
            let b = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;
            if iy != 0 {
                mesh.indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments - 1 {
                mesh.indices.extend_from_slice(&[b, c, d]);
            }
        }
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    /// Every triangle's winding normal must point away from the origin.
    fn assert_outward(mesh: &MeshData) {
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]]
                .map(|i| Vec3::from_array(mesh.vertices[i as usize].position));
            let face = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(face.dot(centroid) > 0.0, "inward triangle {tri:?}");
        }
    }

    #[test]
    fn box_counts_and_extent() {
        let mesh = Geometry::cuboid(2.0, 1.2, 0.1).tessellate();
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.triangle_count(), 12);
        let max_y = mesh
            .vertices
            .iter()
            .map(|v| v.position[1])
            .fold(f32::MIN, f32::max);
        assert!((max_y - 0.6).abs() < 1e-6);
        assert_outward(&mesh);
    }

    #[test]
    fn plane_faces_positive_z() {
        let mesh = Geometry::plane(1.8, 1.0).tessellate();
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]]
                .map(|i| Vec3::from_array(mesh.vertices[i as usize].position));
            assert!((b - a).cross(c - a).z > 0.0);
        }
    }

    #[test]
    fn cylinder_counts_and_winding() {
        let mesh = Geometry::cylinder(0.05, 0.05, 0.8).tessellate();
        // two side rings of 9, two caps of 1 + 9
        assert_eq!(mesh.vertices.len(), 18 + 20);
        // 16 side triangles and 8 per cap
        assert_eq!(mesh.triangle_count(), 32);
        assert_outward(&mesh);
    }

    #[test]
    fn cone_skips_degenerate_cap() {
        let mesh = Geometry::cylinder(0.0, 1.0, 2.0).tessellate();
        assert_eq!(mesh.vertices.len(), 18 + 10);
        assert_eq!(mesh.triangle_count(), 24);
    }

    #[test]
    fn sphere_counts_and_winding() {
        let mesh = Geometry::sphere(0.15, 16, 16).tessellate();
        assert_eq!(mesh.vertices.len(), 17 * 17);
        // pole rows contribute one triangle per segment
        assert_eq!(mesh.triangle_count(), 16 * 16 * 2 - 2 * 16);
        assert_outward(&mesh);
        for v in &mesh.vertices {
            let len = Vec3::from_array(v.position).length();
            assert!((len - 0.15).abs() < 1e-5);
        }
    }

    #[test]
    fn indices_stay_in_bounds() {
        for g in [
            Geometry::cuboid(1.0, 1.0, 1.0),
            Geometry::plane(1.0, 1.0),
            Geometry::cylinder(1.0, 1.0, 1.0),
            Geometry::sphere(1.0, 3, 2),
            Geometry::sphere(1.0, 300, 300),
            Geometry::sphere(1.0, u16::MAX, u16::MAX),
            Geometry::Cylinder {
                radius_top: 1.0,
                radius_bottom: 1.0,
                height: 1.0,
                radial_segments: u16::MAX,
            },
        ] {
            let mesh = g.tessellate();
            assert!(mesh
                .indices
                .iter()
                .all(|&i| (i as usize) < mesh.vertices.len()));
        }
    }

    #[test]
    fn oversized_segments_are_clamped() {
        let mesh = Geometry::sphere(1.0, 300, 300).tessellate();
        let side = MAX_SEGMENTS as usize + 1;
        assert_eq!(mesh.vertices.len(), side * side);
        assert!(mesh.vertices.len() <= u16::MAX as usize + 1);
    }

    #[test]
    fn flat_cylinder_has_finite_normals() {
        let mesh = Geometry::cylinder(1.0, 1.0, 0.0).tessellate();
        assert!(!mesh.vertices.is_empty());
        for v in &mesh.vertices {
            assert!(v.normal.iter().all(|n| n.is_finite()), "bad normal {:?}", v.normal);
            assert!((Vec3::from_array(v.normal).length() - 1.0).abs() < 1e-5);
        }
    }
}
