// ABOUTME: In-memory store for tests and embedded use.
// ABOUTME: Mutex-guarded vectors; fine at the scale of one project's services.

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{DeploymentLedger, ServiceRegistry, StoreError, sort_services};
use crate::types::{DeploymentId, DeploymentRecord, ProjectId, Service, ServiceId};

#[derive(Default)]
pub struct MemoryStore {
    services: Mutex<Vec<Service>>,
    records: Mutex<Vec<DeploymentRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ServiceRegistry for MemoryStore {
    async fn create_service(&self, service: Service) -> Result<Service, StoreError> {
        self.services.lock().push(service.clone());
        Ok(service)
    }

    async fn save_service(&self, service: &Service) -> Result<(), StoreError> {
        let mut services = self.services.lock();
        match services.iter_mut().find(|s| s.id == service.id) {
            Some(existing) => {
                *existing = service.clone();
                Ok(())
            }
            None => Err(StoreError::ServiceNotFound(service.id.to_string())),
        }
    }

    async fn find_service(&self, id: &ServiceId) -> Result<Option<Service>, StoreError> {
        Ok(self.services.lock().iter().find(|s| s.id == *id).cloned())
    }

    async fn find_service_by_name(
        &self,
        project: &ProjectId,
        name: &str,
    ) -> Result<Option<Service>, StoreError> {
        Ok(self
            .services
            .lock()
            .iter()
            .find(|s| s.project_id == *project && s.name.as_str() == name)
            .cloned())
    }

    async fn list_services(&self, project: &ProjectId) -> Result<Vec<Service>, StoreError> {
        let mut services: Vec<Service> = self
            .services
            .lock()
            .iter()
            .filter(|s| s.project_id == *project)
            .cloned()
            .collect();
        sort_services(&mut services);
        Ok(services)
    }
}

#[async_trait]
impl DeploymentLedger for MemoryStore {
    async fn create_record(
        &self,
        record: DeploymentRecord,
    ) -> Result<DeploymentRecord, StoreError> {
        self.records.lock().push(record.clone());
        Ok(record)
    }

    async fn save_record(&self, record: &DeploymentRecord) -> Result<(), StoreError> {
        let mut records = self.records.lock();
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(StoreError::DeploymentNotFound(record.id.to_string())),
        }
    }

    async fn find_record(
        &self,
        id: &DeploymentId,
    ) -> Result<Option<DeploymentRecord>, StoreError> {
        Ok(self.records.lock().iter().find(|r| r.id == *id).cloned())
    }

    async fn list_records(
        &self,
        service: &ServiceId,
    ) -> Result<Vec<DeploymentRecord>, StoreError> {
        Ok(self
            .records
            .lock()
            .iter()
            .filter(|r| r.service_id == *service)
            .cloned()
            .collect())
    }
}
