//! Errors surfaced by a generation run.

use serbridge_core::{RegistrationError, ResolveError, SerbridgeError};
use thiserror::Error;

/// Failure to load a [`GeneratorConfig`](crate::GeneratorConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Toml(err.message().to_string())
    }
}

/// Any error a generation run can raise.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to read class descriptors: {0}")]
    Descriptors(#[from] serde_json::Error),

    #[error(transparent)]
    Model(#[from] SerbridgeError),
}

impl From<ResolveError> for GeneratorError {
    fn from(err: ResolveError) -> Self {
        GeneratorError::Model(match err {
            ResolveError::Registration(inner) => inner.into(),
            ResolveError::Selector(inner) => inner.into(),
            other => other.into(),
        })
    }
}

impl From<RegistrationError> for GeneratorError {
    fn from(err: RegistrationError) -> Self {
        GeneratorError::Model(err.into())
    }
}

impl GeneratorError {
    /// The model error behind this failure, if any.
    pub fn model_error(&self) -> Option<&SerbridgeError> {
        match self {
            GeneratorError::Model(err) => Some(err),
            _ => None,
        }
    }
}
