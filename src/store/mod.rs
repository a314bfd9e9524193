// ABOUTME: Persistence contracts for service and deployment records.
// ABOUTME: Ships an in-memory store and a JSON state-file store.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{DeploymentId, DeploymentRecord, ProjectId, Service, ServiceId};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("service not found: {0}")]
    ServiceNotFound(String),

    #[error("deployment not found: {0}")]
    DeploymentNotFound(String),

    #[error("state file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("state serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Registry of services, scoped by project.
#[async_trait]
pub trait ServiceRegistry: Send + Sync {
    async fn create_service(&self, service: Service) -> Result<Service, StoreError>;

    /// Persist an updated service. Errors if the service was never created.
    async fn save_service(&self, service: &Service) -> Result<(), StoreError>;

    async fn find_service(&self, id: &ServiceId) -> Result<Option<Service>, StoreError>;

    async fn find_service_by_name(
        &self,
        project: &ProjectId,
        name: &str,
    ) -> Result<Option<Service>, StoreError>;

    /// All services of a project, in deploy order (ascending, stable by name).
    async fn list_services(&self, project: &ProjectId) -> Result<Vec<Service>, StoreError>;
}

/// Ledger of deployment attempts.
#[async_trait]
pub trait DeploymentLedger: Send + Sync {
    async fn create_record(&self, record: DeploymentRecord)
    -> Result<DeploymentRecord, StoreError>;

    /// Persist the single terminal update of an open record.
    async fn save_record(&self, record: &DeploymentRecord) -> Result<(), StoreError>;

    async fn find_record(&self, id: &DeploymentId) -> Result<Option<DeploymentRecord>, StoreError>;

    /// All records for a service, oldest first.
    async fn list_records(&self, service: &ServiceId) -> Result<Vec<DeploymentRecord>, StoreError>;
}

pub(crate) fn sort_services(services: &mut [Service]) {
    services.sort_by(|a, b| {
        a.deploy_order
            .cmp(&b.deploy_order)
            .then_with(|| a.name.as_str().cmp(b.name.as_str()))
    });
}
