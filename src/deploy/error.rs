// ABOUTME: Error types for deployment operations.
// ABOUTME: Covers lookup failures, rejected commands, upstream and store errors.

use thiserror::Error;

use crate::executor::ValidationError;
use crate::platform::UpstreamError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("service not found: {0}")]
    ServiceNotFound(String),

    #[error("deployment not found: {0}")]
    DeploymentNotFound(String),

    #[error("project has no services: {0}")]
    NoServices(String),

    #[error("service {0} already has a deployment in progress")]
    AlreadyInProgress(String),

    /// The sandbox refused the command before spawning anything.
    #[error("command rejected: {0}")]
    Rejected(#[from] ValidationError),

    /// A CLI invocation that must succeed for the operation to proceed
    /// failed; detail is the sanitized stderr or a timeout message.
    #[error("{operation} failed for {service}: {detail}")]
    CommandFailed {
        operation: &'static str,
        service: String,
        detail: String,
    },

    #[error("upstream platform error: {0}")]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
