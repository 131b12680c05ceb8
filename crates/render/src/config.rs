use crate::animation::Spin;
use crate::error::ConfigError;
use backdrop_common::Color;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Mount point the output surface attaches to by default.
pub const DEFAULT_MOUNT_ID: &str = "3d-background";

/// Top-level renderer configuration. Every field has a default, so an empty
/// YAML document is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackdropConfig {
    pub mount_id: String,
    pub camera: CameraConfig,
    pub animation: AnimationConfig,
    pub surface: SurfaceConfig,
}

impl Default for BackdropConfig {
    fn default() -> Self {
        Self {
            mount_id: DEFAULT_MOUNT_ID.into(),
            camera: CameraConfig::default(),
            animation: AnimationConfig::default(),
            surface: SurfaceConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Standoff along +Z from the origin.
    pub distance: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            distance: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub yaw_step: f32,
    pub pitch_amplitude: f32,
    pub pitch_rate: f64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        let spin = Spin::default();
        Self {
            yaw_step: spin.yaw_step,
            pitch_amplitude: spin.pitch_amplitude,
            pitch_rate: spin.pitch_rate,
        }
    }
}

impl AnimationConfig {
    pub fn spin(&self) -> Spin {
        Spin {
            yaw_step: self.yaw_step,
            pitch_amplitude: self.pitch_amplitude,
            pitch_rate: self.pitch_rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Let the host show through uncovered pixels.
    pub transparent: bool,
    /// Multisample the output.
    pub antialias: bool,
    pub clear_color: Color,
    pub clear_alpha: f32,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            transparent: true,
            antialias: true,
            clear_color: Color::BLACK,
            clear_alpha: 0.1,
        }
    }
}

impl BackdropConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_yaml_str(&text)?;
        tracing::debug!("loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let cam = &self.camera;
        if !(cam.fov_degrees > 0.0 && cam.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "camera.fov_degrees must be in (0, 180), got {}",
                cam.fov_degrees
            )));
        }
        if !(cam.near > 0.0 && cam.far > cam.near) {
            return Err(ConfigError::Invalid(format!(
                "camera planes must satisfy 0 < near < far, got near={} far={}",
                cam.near, cam.far
            )));
        }
        if !(0.0..=1.0).contains(&self.surface.clear_alpha) {
            return Err(ConfigError::Invalid(format!(
                "surface.clear_alpha must be in [0, 1], got {}",
                self.surface.clear_alpha
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_backdrop() {
        let config = BackdropConfig::default();
        assert_eq!(config.mount_id, "3d-background");
        assert_eq!(config.camera.fov_degrees, 75.0);
        assert_eq!(config.camera.distance, 5.0);
        assert_eq!(config.animation.yaw_step, 0.01);
        assert_eq!(config.surface.clear_alpha, 0.1);
        assert!(config.surface.transparent);
    }

    #[test]
    fn empty_yaml_yields_defaults() {
        let config = BackdropConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, BackdropConfig::default());
    }

    #[test]
    fn partial_yaml_overrides_fields() {
        let yaml = "mount_id: hero\ncamera:\n  fov_degrees: 60\nsurface:\n  clear_color: 16777215\n  antialias: false\n";
        let config = BackdropConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.mount_id, "hero");
        assert_eq!(config.camera.fov_degrees, 60.0);
        assert_eq!(config.camera.near, 0.1);
        assert_eq!(config.surface.clear_color, Color::WHITE);
        assert!(!config.surface.antialias);
    }

    #[test]
    fn rejects_inverted_planes() {
        let err = BackdropConfig::from_yaml_str("camera:\n  near: 10\n  far: 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_malformed_yaml() {
        let err = BackdropConfig::from_yaml_str("camera: [").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn spin_follows_animation_config() {
        let anim = AnimationConfig {
            yaw_step: 0.02,
            ..AnimationConfig::default()
        };
        assert_eq!(anim.spin().yaw_step, 0.02);
        assert_eq!(anim.spin().pitch_rate, 0.001);
    }
}
