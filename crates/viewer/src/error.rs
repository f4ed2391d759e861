use foundation::color::ColorParseError;
use layers::{LoadError, RampError, ScaleError};
use streaming::cache::CacheError;
use thiserror::Error;

/// Rejected configuration. Raised before any viewer state exists.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("viewport must have positive size, got {width}x{height}")]
    InvalidDimensions { width: f64, height: f64 },
    #[error("resolution must be positive, got {0}")]
    InvalidResolution(f64),
    #[error("field of view must lie in (0, 180) degrees, got {0}")]
    InvalidFov(f64),
    #[error("a color field is required")]
    MissingColorField,
    #[error("threshold colors given without thresholds")]
    ColorsWithoutThresholds,
    #[error("invalid {option} url: {source}")]
    InvalidUrl {
        option: &'static str,
        source: url::ParseError,
    },
    #[error("invalid options json: {0}")]
    Json(String),
    #[error(transparent)]
    Color(#[from] ColorParseError),
    #[error(transparent)]
    Ramp(#[from] RampError),
    #[error(transparent)]
    Scale(#[from] ScaleError),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Json(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Scale(#[from] ScaleError),
}
