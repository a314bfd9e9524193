// ABOUTME: Core domain types shared across the crate.
// ABOUTME: Typed ids, validated names, and the service/deployment entities.

mod deployment;
mod id;
mod service;
mod service_name;

pub use deployment::{
    DeployTrigger, DeploymentRecord, DeploymentStatus, ROLLBACK_SOURCE_KEY,
};
pub use id::{DeploymentId, Id, ProjectId, ServiceId};
pub use service::{Service, ServiceKind, ServiceStatus};
pub use service_name::{ServiceName, ServiceNameError};
