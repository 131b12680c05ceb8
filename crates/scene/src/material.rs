use backdrop_common::Color;
use serde::{Deserialize, Serialize};

/// Blinn-Phong surface parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhongMaterial {
    pub color: Color,
    pub emissive: Color,
    pub emissive_intensity: f32,
    pub specular: Color,
    pub shininess: f32,
    /// Only honoured when `transparent` is set.
    pub opacity: f32,
    pub transparent: bool,
}

impl Default for PhongMaterial {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            emissive: Color::BLACK,
            emissive_intensity: 1.0,
            specular: Color::from_hex(0x111111),
            shininess: 30.0,
            opacity: 1.0,
            transparent: false,
        }
    }
}

impl PhongMaterial {
    pub fn new(color: Color) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }

    pub fn with_opacity(self, opacity: f32) -> Self {
        Self {
            opacity: opacity.clamp(0.0, 1.0),
            transparent: true,
            ..self
        }
    }

    pub fn with_emissive(self, emissive: Color, intensity: f32) -> Self {
        Self {
            emissive,
            emissive_intensity: intensity,
            ..self
        }
    }

    /// Alpha written by the fragment stage.
    pub fn effective_opacity(&self) -> f32 {
        if self.transparent { self.opacity } else { 1.0 }
    }
}
