use thiserror::Error;

/// Top-level error type for PhySprite.
#[derive(Debug, Error)]
pub enum PhySpriteError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Binding error: {0}")]
    Binding(#[from] BindingError),
}

/// Configuration errors. Raised while building a physics world.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid pixels_per_meter: {0} (must be finite and > 0)")]
    InvalidScale(f32),

    #[error("Invalid iterations: {0} (must be >= 1)")]
    InvalidIterations(usize),

    #[error("Invalid timestep: {0} (must be finite and > 0)")]
    InvalidTimestep(f32),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

/// Errors creating bodies and joints.
///
/// Copy + static messages; nothing is left half-built when one is returned.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum BindingError {
    #[error("Polygon needs at least 3 non-degenerate vertices, got {count}")]
    InvalidPolygon { count: usize },

    #[error("Invalid node size {width}x{height} (must be finite and > 0)")]
    InvalidSize { width: f32, height: f32 },

    #[error("Invalid pulley ratio: {0} (must be finite and > 0)")]
    InvalidRatio(f32),

    #[error("Joint axis must be non-zero")]
    InvalidAxis,

    #[error("Body is not registered with this world")]
    UnknownBody,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn physprite_error_from_config_error() {
        let err = ConfigError::InvalidScale(-1.0);
        let top: PhySpriteError = err.into();
        assert!(matches!(top, PhySpriteError::Config(_)));
        assert!(top.to_string().contains("-1"));
    }

    #[test]
    fn physprite_error_from_binding_error() {
        let err = BindingError::UnknownBody;
        let top: PhySpriteError = err.into();
        assert!(matches!(top, PhySpriteError::Binding(_)));
        assert!(top.to_string().contains("not registered"));
    }

    #[test]
    fn config_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let config_err: ConfigError = io_err.into();
        assert!(matches!(config_err, ConfigError::Io(_)));
    }

    #[test]
    fn binding_error_is_copy() {
        let err = BindingError::InvalidRatio(0.0);
        let err2 = err;
        assert_eq!(err, err2);
    }

    #[test]
    fn config_error_display_messages() {
        assert_eq!(
            ConfigError::InvalidScale(0.0).to_string(),
            "Invalid pixels_per_meter: 0 (must be finite and > 0)"
        );
        assert_eq!(
            ConfigError::InvalidIterations(0).to_string(),
            "Invalid iterations: 0 (must be >= 1)"
        );
        assert_eq!(
            ConfigError::InvalidTimestep(-0.5).to_string(),
            "Invalid timestep: -0.5 (must be finite and > 0)"
        );
        assert_eq!(
            ConfigError::InvalidValue {
                field: "gravity".into(),
                message: "must be finite".into()
            }
            .to_string(),
            "Invalid value for gravity: must be finite"
        );
    }

    #[test]
    fn binding_error_display_messages() {
        assert_eq!(
            BindingError::InvalidPolygon { count: 2 }.to_string(),
            "Polygon needs at least 3 non-degenerate vertices, got 2"
        );
        assert_eq!(
            BindingError::InvalidSize {
                width: 0.0,
                height: 4.0
            }
            .to_string(),
            "Invalid node size 0x4 (must be finite and > 0)"
        );
        assert_eq!(
            BindingError::InvalidRatio(-2.0).to_string(),
            "Invalid pulley ratio: -2 (must be finite and > 0)"
        );
        assert_eq!(
            BindingError::InvalidAxis.to_string(),
            "Joint axis must be non-zero"
        );
    }
}
