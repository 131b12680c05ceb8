/// Errors from creating or drawing into an output surface.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to create output surface: {0}")]
    SurfaceCreation(String),
    #[error("render backend error: {0}")]
    Backend(String),
    #[error("output surface has been disposed")]
    Disposed,
}

/// Errors from loading a [`crate::BackdropConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
