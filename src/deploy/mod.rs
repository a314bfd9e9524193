// ABOUTME: Deployment operations built on the command sandbox.
// ABOUTME: Single-service attempts, variable management, and bulk orchestration.

mod error;
mod orchestrator;
mod single;
mod variables;

pub use error::DeployError;
pub use orchestrator::{
    BulkDeployResult, BulkStatus, DeploymentOrchestrator, HaltPolicy, ServiceOutcome,
};
pub use single::{DeployOptions, HealthStatus, SingleServiceDeployer};
pub use variables::VariableSummary;
