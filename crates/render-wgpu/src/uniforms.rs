use backdrop_render::PerspectiveCamera;
use backdrop_scene::{DrawItem, Light, Scene};
use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Vec3};

/// Per-kind light limit; must match `MAX_LIGHTS` in the shader.
pub const MAX_LIGHTS: usize = 4;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct Globals {
    pub view_proj: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    /// Summed ambient contribution in rgb.
    pub ambient: [f32; 4],
    /// x: directional count, y: point count.
    pub light_counts: [u32; 4],
    /// Unit vectors towards each light.
    pub directional_dir: [[f32; 4]; MAX_LIGHTS],
    pub directional_color: [[f32; 4]; MAX_LIGHTS],
    /// w holds the cutoff distance, zero for none.
    pub point_position: [[f32; 4]; MAX_LIGHTS],
    pub point_color: [[f32; 4]; MAX_LIGHTS],
}

impl Globals {
    pub fn pack(scene: &Scene, camera: &PerspectiveCamera) -> Self {
        let mut globals = Self::zeroed();
        globals.view_proj = camera.view_projection().to_cols_array_2d();
        globals.camera_position = camera.position.extend(1.0).to_array();

        let mut ambient = Vec3::ZERO;
        let mut directional = 0;
        let mut point = 0;
        for light in scene.lights() {
            match *light {
                Light::Ambient { color, intensity } => ambient += color.scaled(intensity),
                Light::Directional {
                    color, intensity, ..
                } if directional < MAX_LIGHTS => {
                    let dir = light.direction_to_light().unwrap_or(Vec3::Y);
                    globals.directional_dir[directional] = dir.extend(0.0).to_array();
                    globals.directional_color[directional] =
                        color.scaled(intensity).extend(1.0).to_array();
                    directional += 1;
                }
                Light::Point {
                    color,
                    intensity,
                    position,
                    distance,
                } if point < MAX_LIGHTS => {
                    globals.point_position[point] = position.extend(distance).to_array();
                    globals.point_color[point] = color.scaled(intensity).extend(1.0).to_array();
                    point += 1;
                }
                _ => tracing::debug!("light limit reached, skipping {light:?}"),
            }
        }
        globals.ambient = ambient.extend(1.0).to_array();
        globals.light_counts = [directional as u32, point as u32, 0, 0];
        globals
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct InstanceData {
    pub model: [[f32; 4]; 4],
    /// Inverse-transpose of the model's upper 3x3, padded to vec4 columns.
    pub normal: [[f32; 4]; 3],
    /// Linear diffuse color, alpha is opacity.
    pub color: [f32; 4],
    pub emissive: [f32; 4],
    /// Linear specular color, alpha is shininess.
    pub specular: [f32; 4],
}

impl InstanceData {
    pub fn from_item(item: &DrawItem<'_>) -> Self {
        let m = item.material;
        let normal = Mat3::from_mat4(item.world).inverse().transpose();
        Self {
            model: item.world.to_cols_array_2d(),
            normal: [
                normal.x_axis.extend(0.0).to_array(),
                normal.y_axis.extend(0.0).to_array(),
                normal.z_axis.extend(0.0).to_array(),
            ],
            color: Vec3::from_array(m.color.linear())
                .extend(m.effective_opacity())
                .to_array(),
            emissive: m.emissive.scaled(m.emissive_intensity).extend(0.0).to_array(),
            specular: Vec3::from_array(m.specular.linear())
                .extend(m.shininess)
                .to_array(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backdrop_common::Color;
    use backdrop_scene::{computer_model, lighting_rig};

    fn lit_scene() -> Scene {
        let mut scene = Scene::new();
        scene.add_mesh(computer_model());
        for light in lighting_rig() {
            scene.add_light(light);
        }
        scene
    }

    #[test]
    fn globals_layout_is_uniform_friendly() {
        assert_eq!(std::mem::size_of::<Globals>() % 16, 0);
        assert_eq!(std::mem::size_of::<Globals>(), 64 + 16 * 3 + 64 * 4);
        assert_eq!(std::mem::size_of::<InstanceData>(), 16 * 10);
    }

    #[test]
    fn packs_the_lighting_rig() {
        let globals = Globals::pack(&lit_scene(), &PerspectiveCamera::default());
        assert_eq!(globals.light_counts, [1, 1, 0, 0]);

        let ambient = Color::from_hex(0x404040).scaled(0.6);
        assert!((Vec3::from_slice(&globals.ambient[..3]) - ambient).length() < 1e-6);

        let dir = Vec3::from_slice(&globals.directional_dir[0][..3]);
        assert!((dir.length() - 1.0).abs() < 1e-5);
        assert!(dir.x > 0.0 && dir.y > 0.0 && dir.z > 0.0);

        assert_eq!(globals.point_position[0], [0.0, 0.0, 2.0, 10.0]);
    }

    #[test]
    fn extra_lights_are_dropped() {
        let mut scene = Scene::new();
        for i in 0..6 {
            scene.add_light(Light::point(Color::WHITE, 1.0, Vec3::splat(i as f32), 0.0));
        }
        let globals = Globals::pack(&scene, &PerspectiveCamera::default());
        assert_eq!(globals.light_counts[1], MAX_LIGHTS as u32);
    }

    #[test]
    fn instance_carries_material() {
        let scene = lit_scene();
        let items = scene.draw_list();
        let monitor = InstanceData::from_item(&items[0]);
        assert!((monitor.color[3] - 0.9).abs() < 1e-6);
        assert_eq!(monitor.specular[3], 30.0);

        let screen = items.iter().find(|i| i.name == "screen").unwrap();
        let screen = InstanceData::from_item(screen);
        let glow = Color::from_hex(0x2980b9).scaled(0.3);
        assert!((Vec3::from_slice(&screen.emissive[..3]) - glow).length() < 1e-6);
        assert_eq!(screen.color[3], 1.0);
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let scene = lit_scene();
        let items = scene.draw_list();
        let mouse = items.iter().find(|i| i.name == "mouse").unwrap();
        let data = InstanceData::from_item(mouse);
        // mouse is scaled (1, 0.5, 1.5), so normals stretch by the reciprocal
        assert!((data.normal[1][1] - 2.0).abs() < 1e-5);
        assert!((data.normal[2][2] - 1.0 / 1.5).abs() < 1e-5);
    }
}
