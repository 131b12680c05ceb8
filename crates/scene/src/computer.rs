//! The decorative desktop computer and the lights that show it off.

use crate::geometry::Geometry;
use crate::light::Light;
use crate::material::PhongMaterial;
use crate::scene::{CompositeMesh, Part};
use backdrop_common::Color;
use glam::Vec3;

/// Where the computer sits, slightly into the view.
pub const COMPUTER_POSITION: Vec3 = Vec3::new(0.0, 0.0, -2.0);

const BODY: Color = Color::from_hex(0x2c3e50);
const TRIM: Color = Color::from_hex(0x34495e);
const SCREEN: Color = Color::from_hex(0x3498db);
const SCREEN_GLOW: Color = Color::from_hex(0x2980b9);

/// Monitor (with screen), stand, base, keyboard and mouse.
pub fn computer_model() -> CompositeMesh {
    let screen = Part::new(
        "screen",
        Geometry::plane(1.8, 1.0),
        PhongMaterial::new(SCREEN).with_emissive(SCREEN_GLOW, 0.3),
    )
    .at(Vec3::new(0.0, 0.0, 0.06));

    let monitor = Part::new(
        "monitor",
        Geometry::cuboid(2.0, 1.2, 0.1),
        PhongMaterial::new(BODY).with_opacity(0.9),
    )
    .at(Vec3::new(0.0, 0.5, 0.0))
    .with_child(screen);

    let stand = Part::new(
        "stand",
        Geometry::cylinder(0.05, 0.05, 0.8),
        PhongMaterial::new(TRIM),
    )
    .at(Vec3::new(0.0, -0.9, 0.0));

    let base = Part::new(
        "base",
        Geometry::cuboid(0.8, 0.1, 0.6),
        PhongMaterial::new(TRIM),
    )
    .at(Vec3::new(0.0, -1.3, 0.0));

    let keyboard = Part::new(
        "keyboard",
        Geometry::cuboid(1.8, 0.05, 0.6),
        PhongMaterial::new(BODY),
    )
    .at(Vec3::new(0.0, -1.8, 0.5));

    let mouse = Part::new(
        "mouse",
        Geometry::sphere(0.15, 16, 16),
        PhongMaterial::new(TRIM),
    )
    .at(Vec3::new(1.2, -1.8, 0.5))
    .scaled(Vec3::new(1.0, 0.5, 1.5));

    CompositeMesh::new("computer")
        .with_part(monitor)
        .with_part(stand)
        .with_part(base)
        .with_part(keyboard)
        .with_part(mouse)
        .placed_at(COMPUTER_POSITION)
}

/// Dim ambient fill, an off-axis key light and a blue glow in front of the screen.
pub fn lighting_rig() -> [Light; 3] {
    [
        Light::ambient(Color::from_hex(0x404040), 0.6),
        Light::directional(Color::WHITE, 0.8, Vec3::new(5.0, 5.0, 5.0)),
        Light::point(SCREEN, 0.5, Vec3::new(0.0, 0.0, 2.0), 10.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computer_has_five_top_level_parts() {
        let computer = computer_model();
        let names: Vec<&str> = computer.parts().iter().map(|p| p.name()).collect();
        assert_eq!(names, ["monitor", "stand", "base", "keyboard", "mouse"]);
        assert_eq!(computer.part_count(), 6);
        assert_eq!(computer.position(), COMPUTER_POSITION);
    }

    #[test]
    fn screen_is_attached_to_monitor() {
        let computer = computer_model();
        let monitor = &computer.parts()[0];
        assert_eq!(monitor.children().len(), 1);
        assert_eq!(monitor.children()[0].name(), "screen");
        assert!(monitor.material().transparent);

        let items = computer.draw_items();
        let screen = items.iter().find(|i| i.name == "screen").unwrap();
        let origin = screen.world.transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(0.0, 0.5, -1.94)).length() < 1e-5);
    }

    #[test]
    fn mouse_is_squashed() {
        let computer = computer_model();
        let mouse = computer.parts().iter().find(|p| p.name() == "mouse").unwrap();
        assert_eq!(mouse.offset().scale, Vec3::new(1.0, 0.5, 1.5));
    }

    #[test]
    fn rig_has_one_of_each_light() {
        let rig = lighting_rig();
        assert!(matches!(rig[0], Light::Ambient { .. }));
        assert!(matches!(rig[1], Light::Directional { .. }));
        assert!(matches!(rig[2], Light::Point { distance, .. } if distance == 10.0));
    }
}
