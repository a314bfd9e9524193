// ABOUTME: JSON state-file store so deployment history survives CLI invocations.
// ABOUTME: Whole-file load on open, whole-file rewrite on every mutation.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{DeploymentLedger, ServiceRegistry, StoreError, sort_services};
use crate::types::{DeploymentId, DeploymentRecord, ProjectId, Service, ServiceId};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(default)]
    services: Vec<Service>,
    #[serde(default)]
    deployments: Vec<DeploymentRecord>,
}

/// File-backed store keeping one project's state under `.railyard/`.
pub struct FileStore {
    path: PathBuf,
    state: Mutex<StateFile>,
}

impl FileStore {
    /// Open (or create) the state file at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let state = if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            serde_json::from_str(&raw)?
        } else {
            StateFile::default()
        };
        Ok(Self {
            path: path.to_path_buf(),
            state: Mutex::new(state),
        })
    }

    fn persist(&self, state: &StateFile) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(state)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

#[async_trait]
impl ServiceRegistry for FileStore {
    async fn create_service(&self, service: Service) -> Result<Service, StoreError> {
        let mut state = self.state.lock();
        state.services.push(service.clone());
        self.persist(&state)?;
        Ok(service)
    }

    async fn save_service(&self, service: &Service) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        match state.services.iter_mut().find(|s| s.id == service.id) {
            Some(existing) => {
                *existing = service.clone();
            }
            None => return Err(StoreError::ServiceNotFound(service.id.to_string())),
        }
        self.persist(&state)
    }

    async fn find_service(&self, id: &ServiceId) -> Result<Option<Service>, StoreError> {
        Ok(self
            .state
            .lock()
            .services
            .iter()
            .find(|s| s.id == *id)
            .cloned())
    }

    async fn find_service_by_name(
        &self,
        project: &ProjectId,
        name: &str,
    ) -> Result<Option<Service>, StoreError> {
        Ok(self
            .state
            .lock()
            .services
            .iter()
            .find(|s| s.project_id == *project && s.name.as_str() == name)
            .cloned())
    }

    async fn list_services(&self, project: &ProjectId) -> Result<Vec<Service>, StoreError> {
        let mut services: Vec<Service> = self
            .state
            .lock()
            .services
            .iter()
            .filter(|s| s.project_id == *project)
            .cloned()
            .collect();
        sort_services(&mut services);
        Ok(services)
    }
}

#[async_trait]
impl DeploymentLedger for FileStore {
    async fn create_record(
        &self,
        record: DeploymentRecord,
    ) -> Result<DeploymentRecord, StoreError> {
        let mut state = self.state.lock();
        state.deployments.push(record.clone());
        self.persist(&state)?;
        Ok(record)
    }

    async fn save_record(&self, record: &DeploymentRecord) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        match state.deployments.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => {
                *existing = record.clone();
            }
            None => return Err(StoreError::DeploymentNotFound(record.id.to_string())),
        }
        self.persist(&state)
    }

    async fn find_record(
        &self,
        id: &DeploymentId,
    ) -> Result<Option<DeploymentRecord>, StoreError> {
        Ok(self
            .state
            .lock()
            .deployments
            .iter()
            .find(|r| r.id == *id)
            .cloned())
    }

    async fn list_records(
        &self,
        service: &ServiceId,
    ) -> Result<Vec<DeploymentRecord>, StoreError> {
        Ok(self
            .state
            .lock()
            .deployments
            .iter()
            .filter(|r| r.service_id == *service)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ServiceKind, ServiceName};

    fn service(name: &str) -> Service {
        Service::provisioning(
            ProjectId::new("proj"),
            "ws",
            ServiceName::new(name).unwrap(),
            ServiceKind::Web,
            0,
        )
    }

    #[tokio::test]
    async fn state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".railyard").join("state.json");

        let store = FileStore::open(&path).unwrap();
        let created = store.create_service(service("web")).await.unwrap();
        drop(store);

        let reopened = FileStore::open(&path).unwrap();
        let found = reopened.find_service(&created.id).await.unwrap();
        assert_eq!(found.map(|s| s.name.to_string()), Some("web".to_string()));
    }

    #[tokio::test]
    async fn missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(&dir.path().join("state.json")).unwrap();
        let listed = store.list_services(&ProjectId::new("proj")).await.unwrap();
        assert!(listed.is_empty());
    }
}
