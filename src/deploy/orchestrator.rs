// ABOUTME: Bulk, dependency-ordered rollout across a project's services.
// ABOUTME: Groups deploy sequentially, members fan out concurrently, critical failures halt.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use super::error::DeployError;
use super::single::{DeployOptions, SingleServiceDeployer};
use crate::audit::{AuditEvent, AuditSink};
use crate::store::{DeploymentLedger, ServiceRegistry};
use crate::types::{
    DeployTrigger, DeploymentId, DeploymentRecord, DeploymentStatus, ProjectId, Service,
    ServiceId,
};

/// When a bulk rollout halts.
///
/// Services at or below `critical_order_max` are the critical tier: a broken
/// data layer or API must never let a frontend deploy on top of it. Failures
/// above the tier degrade the rollout to partial instead of halting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HaltPolicy {
    pub critical_order_max: u32,
}

impl Default for HaltPolicy {
    fn default() -> Self {
        Self {
            critical_order_max: 1,
        }
    }
}

impl HaltPolicy {
    pub fn is_critical(&self, deploy_order: u32) -> bool {
        deploy_order <= self.critical_order_max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkStatus {
    Success,
    Failed,
    PartialFailure,
}

impl std::fmt::Display for BulkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BulkStatus::Success => "success",
            BulkStatus::Failed => "failed",
            BulkStatus::PartialFailure => "partial_failure",
        };
        write!(f, "{s}")
    }
}

/// Per-service outcome within a bulk rollout.
#[derive(Debug, Clone)]
pub struct ServiceOutcome {
    pub service_id: ServiceId,
    pub service_name: String,
    pub deploy_order: u32,
    pub status: DeploymentStatus,
    pub error: Option<String>,
    pub record_id: Option<DeploymentId>,
}

/// Result of one bulk rollout.
#[derive(Debug, Clone)]
pub struct BulkDeployResult {
    /// Rollout-level id, distinct from any single deployment record id.
    pub deployment_id: String,
    pub results: Vec<ServiceOutcome>,
    pub started_at: DateTime<Utc>,
    pub overall_status: BulkStatus,
}

impl BulkDeployResult {
    pub fn succeeded(&self) -> usize {
        self.count(DeploymentStatus::Success)
    }

    pub fn failed(&self) -> usize {
        self.count(DeploymentStatus::Failed)
    }

    pub fn cancelled(&self) -> usize {
        self.count(DeploymentStatus::Cancelled)
    }

    fn count(&self, status: DeploymentStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }
}

/// Sequences a dependency-ordered multi-service rollout.
pub struct DeploymentOrchestrator {
    deployer: Arc<SingleServiceDeployer>,
    registry: Arc<dyn ServiceRegistry>,
    ledger: Arc<dyn DeploymentLedger>,
    audit: Arc<dyn AuditSink>,
    policy: HaltPolicy,
}

impl DeploymentOrchestrator {
    pub fn new(
        deployer: Arc<SingleServiceDeployer>,
        registry: Arc<dyn ServiceRegistry>,
        ledger: Arc<dyn DeploymentLedger>,
        audit: Arc<dyn AuditSink>,
        policy: HaltPolicy,
    ) -> Self {
        Self {
            deployer,
            registry,
            ledger,
            audit,
            policy,
        }
    }

    /// Deploy every service of the project in dependency order.
    ///
    /// Groups sharing a deploy order fan out concurrently and always settle
    /// together: a failing member never cancels its in-flight siblings. A
    /// failure inside the critical tier halts the rollout and pre-emptively
    /// cancels everything not yet attempted. Partial failure is reported in
    /// the result, never raised.
    pub async fn deploy_all(
        &self,
        project_id: &ProjectId,
        options: &DeployOptions,
    ) -> Result<BulkDeployResult, DeployError> {
        let services = self.registry.list_services(project_id).await?;
        if services.is_empty() {
            return Err(DeployError::NoServices(project_id.to_string()));
        }

        let started_at = Utc::now();
        let rollout_id = Uuid::new_v4().to_string();
        let workspace_id = services
            .first()
            .map(|s| s.workspace_id.clone())
            .unwrap_or_default();

        let mut groups: BTreeMap<u32, Vec<Service>> = BTreeMap::new();
        for service in services {
            groups.entry(service.deploy_order).or_default().push(service);
        }

        self.emit_audit(
            AuditEvent::new(
                workspace_id.clone(),
                options.actor.clone(),
                "bulk_deploy.started",
                "project",
                project_id.as_str(),
            )
            .with_meta("rollout_id", rollout_id.clone())
            .with_meta(
                "service_count",
                groups.values().map(Vec::len).sum::<usize>(),
            ),
        )
        .await;

        let mut results: Vec<ServiceOutcome> = Vec::new();
        let mut halted_by: Option<String> = None;

        let mut remaining = groups.into_iter();
        for (order, members) in remaining.by_ref() {
            let settled = join_all(
                members
                    .iter()
                    .map(|service| self.deploy_member(service, options)),
            )
            .await;

            let mut group_failure: Option<String> = None;
            for outcome in settled {
                if outcome.status == DeploymentStatus::Failed {
                    group_failure = Some(outcome.service_name.clone());
                }
                results.push(outcome);
            }

            if let Some(failed_name) = group_failure
                && self.policy.is_critical(order)
            {
                halted_by = Some(failed_name);
                break;
            }
        }

        // Anything left in the iterator was never attempted; book a cancelled
        // record for each so the halt is visible in the ledger.
        if let Some(failed_name) = &halted_by {
            for (_, members) in remaining {
                for service in members {
                    let reason =
                        format!("cancelled: {failed_name} failed in an earlier deploy group");
                    let mut record = DeploymentRecord::begin(
                        service.id.clone(),
                        DeployTrigger::Manual,
                        &options.actor,
                    );
                    record.cancel(reason.clone());
                    let record = self.ledger.create_record(record).await?;
                    results.push(ServiceOutcome {
                        service_id: service.id.clone(),
                        service_name: service.name.to_string(),
                        deploy_order: service.deploy_order,
                        status: DeploymentStatus::Cancelled,
                        error: Some(reason),
                        record_id: Some(record.id),
                    });
                }
            }
        }

        let overall_status = if halted_by.is_some() {
            BulkStatus::Failed
        } else if results
            .iter()
            .any(|r| r.status == DeploymentStatus::Failed)
        {
            BulkStatus::PartialFailure
        } else {
            BulkStatus::Success
        };

        let result = BulkDeployResult {
            deployment_id: rollout_id.clone(),
            results,
            started_at,
            overall_status,
        };

        self.emit_audit(
            AuditEvent::new(
                workspace_id,
                options.actor.clone(),
                "bulk_deploy.completed",
                "project",
                project_id.as_str(),
            )
            .with_meta("rollout_id", rollout_id)
            .with_meta("status", overall_status.to_string())
            .with_meta("succeeded", result.succeeded())
            .with_meta("failed", result.failed())
            .with_meta("cancelled", result.cancelled()),
        )
        .await;

        Ok(result)
    }

    /// One member of a fan-out group. Always resolves to an outcome so
    /// `join_all` settles every sibling.
    async fn deploy_member(&self, service: &Service, options: &DeployOptions) -> ServiceOutcome {
        match self.deployer.deploy(&service.id, options).await {
            Ok(record) => ServiceOutcome {
                service_id: service.id.clone(),
                service_name: service.name.to_string(),
                deploy_order: service.deploy_order,
                status: record.status,
                error: record.error.clone(),
                record_id: Some(record.id),
            },
            Err(e) => ServiceOutcome {
                service_id: service.id.clone(),
                service_name: service.name.to_string(),
                deploy_order: service.deploy_order,
                status: DeploymentStatus::Failed,
                error: Some(e.to_string()),
                record_id: None,
            },
        }
    }

    async fn emit_audit(&self, event: AuditEvent) {
        if let Err(e) = self.audit.record(event).await {
            tracing::warn!("audit sink failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_halts_through_order_one() {
        let policy = HaltPolicy::default();
        assert!(policy.is_critical(0));
        assert!(policy.is_critical(1));
        assert!(!policy.is_critical(2));
    }

    #[test]
    fn policy_boundary_is_configurable() {
        let policy = HaltPolicy {
            critical_order_max: 0,
        };
        assert!(policy.is_critical(0));
        assert!(!policy.is_critical(1));
    }
}
