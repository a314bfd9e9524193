// ABOUTME: Application-wide error types for railyard.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

use crate::deploy::DeployError;
use crate::readiness::ReadinessError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("missing required environment variable: {0}")]
    MissingCredential(&'static str),

    #[error("unknown service: {0}")]
    UnknownService(String),

    #[error("deployment of {service} failed: {detail}")]
    DeploymentFailed { service: String, detail: String },

    #[error("rollout halted: a critical-tier service failed")]
    RolloutHalted,

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error(transparent)]
    Readiness(#[from] ReadinessError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
