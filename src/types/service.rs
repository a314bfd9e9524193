// ABOUTME: Service entity - a deployable unit within a project.
// ABOUTME: Carries platform identity, rollout ordering, and lifecycle status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::{ProjectId, ServiceId, ServiceName};

/// What a service is, roughly mapping to how the platform provisions it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Web,
    Api,
    Worker,
    Database,
    Cache,
    Cron,
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceKind::Web => "web",
            ServiceKind::Api => "api",
            ServiceKind::Worker => "worker",
            ServiceKind::Database => "database",
            ServiceKind::Cache => "cache",
            ServiceKind::Cron => "cron",
        };
        write!(f, "{s}")
    }
}

/// Lifecycle status of a service.
///
/// `Provisioning` until the first deploy attempt settles, `Deploying` while
/// any deploy/redeploy/rollback is in flight, then `Active` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Provisioning,
    Active,
    Deploying,
    Failed,
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceStatus::Provisioning => "provisioning",
            ServiceStatus::Active => "active",
            ServiceStatus::Deploying => "deploying",
            ServiceStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// A deployable unit within a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub project_id: ProjectId,
    pub workspace_id: String,
    /// Platform-assigned service id; empty until the platform provisions it.
    pub platform_id: Option<String>,
    pub name: ServiceName,
    pub kind: ServiceKind,
    pub status: ServiceStatus,
    /// Rollout position: lower orders deploy first, equal orders concurrently.
    pub deploy_order: u32,
    #[serde(default)]
    pub config: HashMap<String, String>,
    /// Platform-generated domain, discovered from deploy output.
    pub domain: Option<String>,
    pub custom_domain: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Service {
    /// Create a new service awaiting its first deploy.
    pub fn provisioning(
        project_id: ProjectId,
        workspace_id: impl Into<String>,
        name: ServiceName,
        kind: ServiceKind,
        deploy_order: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ServiceId::generate(),
            project_id,
            workspace_id: workspace_id.into(),
            platform_id: None,
            name,
            kind,
            status: ServiceStatus::Provisioning,
            deploy_order,
            config: HashMap::new(),
            domain: None,
            custom_domain: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The selector handed to the CLI's `-s` flag: the platform id when the
    /// service has been provisioned, otherwise its name.
    pub fn cli_selector(&self) -> String {
        self.platform_id
            .clone()
            .unwrap_or_else(|| self.name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Service {
        Service::provisioning(
            ProjectId::new("proj-1"),
            "ws-1",
            ServiceName::new("api").unwrap(),
            ServiceKind::Api,
            1,
        )
    }

    #[test]
    fn new_services_start_provisioning() {
        let svc = sample();
        assert_eq!(svc.status, ServiceStatus::Provisioning);
        assert!(svc.platform_id.is_none());
    }

    #[test]
    fn selector_prefers_platform_id() {
        let mut svc = sample();
        assert_eq!(svc.cli_selector(), "api");
        svc.platform_id = Some("srv-abc123".to_string());
        assert_eq!(svc.cli_selector(), "srv-abc123");
    }

    #[test]
    fn kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ServiceKind::Database).unwrap(),
            "\"database\""
        );
    }
}
