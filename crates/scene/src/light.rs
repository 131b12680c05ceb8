use backdrop_common::Color;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A light owned by a [`crate::Scene`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Light {
    /// Uniform fill applied to every surface.
    Ambient { color: Color, intensity: f32 },
    /// Parallel rays travelling from `position` towards `target`.
    Directional {
        color: Color,
        intensity: f32,
        position: Vec3,
        target: Vec3,
    },
    /// Omnidirectional light with linear falloff to zero at `distance`.
    /// A `distance` of zero means no cutoff.
    Point {
        color: Color,
        intensity: f32,
        position: Vec3,
        distance: f32,
    },
}

impl Light {
    pub fn ambient(color: Color, intensity: f32) -> Self {
        Self::Ambient { color, intensity }
    }

    /// Directional light aimed at the origin.
    pub fn directional(color: Color, intensity: f32, position: Vec3) -> Self {
        Self::Directional {
            color,
            intensity,
            position,
            target: Vec3::ZERO,
        }
    }

    pub fn point(color: Color, intensity: f32, position: Vec3, distance: f32) -> Self {
        Self::Point {
            color,
            intensity,
            position,
            distance,
        }
    }

    pub fn intensity(&self) -> f32 {
        match *self {
            Self::Ambient { intensity, .. }
            | Self::Directional { intensity, .. }
            | Self::Point { intensity, .. } => intensity,
        }
    }

    /// Unit vector pointing from a lit surface towards a directional light.
    pub fn direction_to_light(&self) -> Option<Vec3> {
        match *self {
            Self::Directional {
                position, target, ..
            } => Some((position - target).normalize_or_zero()),
            _ => None,
        }
    }

    /// Attenuation of a point light at `d` world units, in `[0, 1]`.
    pub fn falloff(&self, d: f32) -> f32 {
        match *self {
            Self::Point { distance, .. } if distance > 0.0 => (1.0 - d / distance).clamp(0.0, 1.0),
            Self::Point { .. } => 1.0,
            _ => 0.0,
        }
    }
}
