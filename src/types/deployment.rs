// ABOUTME: Deployment record - one attempt to put a service into a running state.
// ABOUTME: Records reach exactly one terminal status and are never mutated afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

use super::{DeploymentId, ServiceId};

/// Metadata key linking a rollback record to the deployment it restores.
pub const ROLLBACK_SOURCE_KEY: &str = "rolled_back_from";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    Building,
    Success,
    Failed,
    Cancelled,
}

impl DeploymentStatus {
    /// Terminal records are immutable; a rollback creates a new record instead.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DeploymentStatus::Building)
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeploymentStatus::Building => "building",
            DeploymentStatus::Success => "success",
            DeploymentStatus::Failed => "failed",
            DeploymentStatus::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployTrigger {
    Manual,
    Redeploy,
    Rollback,
}

impl fmt::Display for DeployTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeployTrigger::Manual => "manual",
            DeployTrigger::Redeploy => "redeploy",
            DeployTrigger::Rollback => "rollback",
        };
        write!(f, "{s}")
    }
}

/// One attempt to put a service into a running state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub id: DeploymentId,
    pub service_id: ServiceId,
    /// Platform-assigned deployment id. Synthesized locally when the CLI path
    /// does not report one.
    pub platform_deployment_id: String,
    pub status: DeploymentStatus,
    pub trigger: DeployTrigger,
    pub triggered_by: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub build_seconds: Option<f64>,
    pub url: Option<String>,
    pub error: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl DeploymentRecord {
    /// Open a new attempt in `building`.
    pub fn begin(service_id: ServiceId, trigger: DeployTrigger, actor: &str) -> Self {
        Self {
            id: DeploymentId::generate(),
            service_id,
            platform_deployment_id: Uuid::new_v4().to_string(),
            status: DeploymentStatus::Building,
            trigger,
            triggered_by: actor.to_string(),
            started_at: Utc::now(),
            completed_at: None,
            build_seconds: None,
            url: None,
            error: None,
            metadata: HashMap::new(),
        }
    }

    pub fn complete_success(&mut self, build_seconds: f64, url: Option<String>) {
        self.status = DeploymentStatus::Success;
        self.completed_at = Some(Utc::now());
        self.build_seconds = Some(build_seconds);
        self.url = url;
    }

    pub fn complete_failure(&mut self, error: impl Into<String>) {
        self.status = DeploymentStatus::Failed;
        self.completed_at = Some(Utc::now());
        self.error = Some(error.into());
    }

    /// Pre-emptive cancellation by the orchestrator for a never-attempted
    /// service in a halted rollout.
    pub fn cancel(&mut self, reason: impl Into<String>) {
        self.status = DeploymentStatus::Cancelled;
        self.completed_at = Some(Utc::now());
        self.error = Some(reason.into());
    }

    /// Mark this record as a rollback of `source`.
    pub fn link_rollback_source(&mut self, source: &DeploymentId) {
        self.metadata.insert(
            ROLLBACK_SOURCE_KEY.to_string(),
            serde_json::Value::String(source.as_str().to_string()),
        );
    }

    /// The id of the deployment this record rolled back to, if any.
    pub fn rollback_source(&self) -> Option<&str> {
        self.metadata.get(ROLLBACK_SOURCE_KEY).and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn begin() -> DeploymentRecord {
        DeploymentRecord::begin(ServiceId::new("svc-1"), DeployTrigger::Manual, "tester")
    }

    #[test]
    fn new_records_open_in_building() {
        let record = begin();
        assert_eq!(record.status, DeploymentStatus::Building);
        assert!(!record.status.is_terminal());
        assert!(record.completed_at.is_none());
        assert!(!record.platform_deployment_id.is_empty());
    }

    #[test]
    fn success_is_terminal_with_duration() {
        let mut record = begin();
        record.complete_success(12.5, Some("https://api.up.railway.app".into()));
        assert_eq!(record.status, DeploymentStatus::Success);
        assert!(record.status.is_terminal());
        assert_eq!(record.build_seconds, Some(12.5));
        assert!(record.completed_at.is_some());
    }

    #[test]
    fn failure_keeps_the_error() {
        let mut record = begin();
        record.complete_failure("build exploded");
        assert_eq!(record.status, DeploymentStatus::Failed);
        assert_eq!(record.error.as_deref(), Some("build exploded"));
    }

    #[test]
    fn rollback_lineage_round_trips() {
        let mut record = begin();
        let source = DeploymentId::new("dep-original");
        record.link_rollback_source(&source);
        assert_eq!(record.rollback_source(), Some("dep-original"));
    }
}
