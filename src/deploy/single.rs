// ABOUTME: Deploys, redeploys, restarts, and rolls back one service.
// ABOUTME: Owns the ledger record for each attempt and the service status transitions.

use regex::Regex;
use secrecy::SecretString;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::LazyLock;
use std::time::Duration;

use chrono::Utc;

use super::error::DeployError;
use crate::audit::{AuditEvent, AuditSink, Notification, NotificationSink};
use crate::executor::{
    CommandExecutionResult, CommandExecutor, CommandRequest, OutputCallback,
};
use crate::platform::PlatformApiClient;
use crate::store::{DeploymentLedger, ServiceRegistry};
use crate::types::{
    DeployTrigger, DeploymentId, DeploymentRecord, Service, ServiceId, ServiceStatus,
};

static DEPLOY_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https://[A-Za-z0-9][A-Za-z0-9.-]*\.up\.railway\.app[^\s]*").expect("valid regex")
});

static WHOAMI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Logged in as\s+([^(\n]+)").expect("valid regex"));

/// Caller-supplied context for one deployment operation.
#[derive(Clone)]
pub struct DeployOptions {
    /// Decrypted platform credential; lives only in this struct and the
    /// spawned process's scoped environment.
    pub token: SecretString,
    pub environment: Option<String>,
    pub actor: String,
    pub working_dir: Option<PathBuf>,
    /// Overrides the executor's default budget for the operation's primary
    /// command when set.
    pub timeout: Option<Duration>,
    pub on_output: Option<OutputCallback>,
}

impl DeployOptions {
    pub fn new(token: SecretString, actor: impl Into<String>) -> Self {
        Self {
            token,
            environment: None,
            actor: actor.into(),
            working_dir: None,
            timeout: None,
            on_output: None,
        }
    }

    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn on_output(mut self, callback: OutputCallback) -> Self {
        self.on_output = Some(callback);
        self
    }
}

/// Result of a connectivity probe. Never an error.
#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub connected: bool,
    pub username: Option<String>,
    pub error: Option<String>,
}

/// Deploys a single service and owns its ledger record.
pub struct SingleServiceDeployer {
    executor: Arc<CommandExecutor>,
    platform: Arc<dyn PlatformApiClient>,
    registry: Arc<dyn ServiceRegistry>,
    ledger: Arc<dyn DeploymentLedger>,
    audit: Arc<dyn AuditSink>,
    notifier: Arc<dyn NotificationSink>,
}

impl SingleServiceDeployer {
    pub fn new(
        executor: Arc<CommandExecutor>,
        platform: Arc<dyn PlatformApiClient>,
        registry: Arc<dyn ServiceRegistry>,
        ledger: Arc<dyn DeploymentLedger>,
        audit: Arc<dyn AuditSink>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            executor,
            platform,
            registry,
            ledger,
            audit,
            notifier,
        }
    }

    pub(crate) fn executor(&self) -> &CommandExecutor {
        &self.executor
    }

    /// Deploy the service's current source with `up`.
    pub async fn deploy(
        &self,
        service_id: &ServiceId,
        options: &DeployOptions,
    ) -> Result<DeploymentRecord, DeployError> {
        self.run_attempt(service_id, "up", DeployTrigger::Manual, options)
            .await
    }

    /// Redeploy the service's latest build.
    pub async fn redeploy(
        &self,
        service_id: &ServiceId,
        options: &DeployOptions,
    ) -> Result<DeploymentRecord, DeployError> {
        self.run_attempt(service_id, "redeploy", DeployTrigger::Redeploy, options)
            .await
    }

    /// Restart the running service. An operational action, not a deployment:
    /// no ledger record is created and the service status is untouched.
    pub async fn restart(
        &self,
        service_id: &ServiceId,
        options: &DeployOptions,
    ) -> Result<(), DeployError> {
        let service = self.require_service(service_id).await?;
        let request = self.scoped_request("restart", &service, options);
        let result = self.executor.execute(&request).await?;
        if !result.success() {
            return Err(DeployError::CommandFailed {
                operation: "restart",
                service: service.name.to_string(),
                detail: failure_detail(&result),
            });
        }
        Ok(())
    }

    /// Roll the service back to an earlier deployment. The source record is
    /// never mutated; a new record carries the lineage in its metadata.
    pub async fn rollback(
        &self,
        service_id: &ServiceId,
        target: &DeploymentId,
        options: &DeployOptions,
    ) -> Result<DeploymentRecord, DeployError> {
        let mut service = self.require_service(service_id).await?;
        if service.status == ServiceStatus::Deploying {
            return Err(DeployError::AlreadyInProgress(service.name.to_string()));
        }

        let source = self
            .ledger
            .find_record(target)
            .await?
            .ok_or_else(|| DeployError::DeploymentNotFound(target.to_string()))?;

        let platform_deployment = self
            .platform
            .redeploy_deployment(&source.platform_deployment_id)
            .await?;

        let mut record =
            DeploymentRecord::begin(service.id.clone(), DeployTrigger::Rollback, &options.actor);
        record.platform_deployment_id = platform_deployment.id;
        record.link_rollback_source(&source.id);
        let record = self.ledger.create_record(record).await?;

        service.status = ServiceStatus::Deploying;
        service.updated_at = Utc::now();
        self.registry.save_service(&service).await?;

        self.emit_audit(
            AuditEvent::new(
                &service.workspace_id,
                &options.actor,
                "deployment.rolled_back",
                "deployment",
                record.id.as_str(),
            )
            .with_meta("service_name", service.name.to_string())
            .with_meta("rolled_back_from", source.id.as_str()),
        )
        .await;
        self.emit_notification(Notification {
            actor: options.actor.clone(),
            title: "Rollback started".to_string(),
            body: format!(
                "{} is rolling back to deployment {}",
                service.name, source.id
            ),
        })
        .await;

        Ok(record)
    }

    /// Probe CLI connectivity with `whoami`. Reports rather than fails.
    pub async fn check_health(&self, token: &SecretString) -> HealthStatus {
        let request = CommandRequest::new("whoami", token.clone());
        match self.executor.execute(&request).await {
            Ok(result) if result.success() => HealthStatus {
                connected: true,
                username: extract_username(&result.stdout),
                error: None,
            },
            Ok(result) => HealthStatus {
                connected: false,
                username: None,
                error: Some(failure_detail(&result)),
            },
            Err(e) => HealthStatus {
                connected: false,
                username: None,
                error: Some(e.to_string()),
            },
        }
    }

    async fn run_attempt(
        &self,
        service_id: &ServiceId,
        verb: &str,
        trigger: DeployTrigger,
        options: &DeployOptions,
    ) -> Result<DeploymentRecord, DeployError> {
        let mut service = self.require_service(service_id).await?;
        if service.status == ServiceStatus::Deploying {
            return Err(DeployError::AlreadyInProgress(service.name.to_string()));
        }

        let record = DeploymentRecord::begin(service.id.clone(), trigger, &options.actor);
        let mut record = self.ledger.create_record(record).await?;

        service.status = ServiceStatus::Deploying;
        service.updated_at = Utc::now();
        self.registry.save_service(&service).await?;

        let request = self.scoped_request(verb, &service, options);
        let result = self.executor.execute(&request).await?;
        let elapsed = result.duration.as_secs_f64();

        if result.success() {
            let url = extract_deployment_url(&result.stdout);
            record.complete_success(elapsed, url.clone());
            service.status = ServiceStatus::Active;
            if url.is_some() {
                service.domain = url;
            }
        } else {
            record.complete_failure(failure_detail(&result));
            service.status = ServiceStatus::Failed;
        }
        service.updated_at = Utc::now();

        self.ledger.save_record(&record).await?;
        self.registry.save_service(&service).await?;

        self.emit_audit(
            AuditEvent::new(
                &service.workspace_id,
                &options.actor,
                "service.deployed",
                "service",
                service.id.as_str(),
            )
            .with_meta("service_name", service.name.to_string())
            .with_meta("status", record.status.to_string())
            .with_meta("trigger", record.trigger.to_string())
            .with_meta("duration_seconds", elapsed),
        )
        .await;
        self.emit_notification(Notification {
            actor: options.actor.clone(),
            title: format!("Deployment {}", record.status),
            body: format!("{} finished with status {}", service.name, record.status),
        })
        .await;

        Ok(record)
    }

    pub(crate) fn scoped_request(
        &self,
        verb: &str,
        service: &Service,
        options: &DeployOptions,
    ) -> CommandRequest {
        let mut request =
            CommandRequest::new(verb, options.token.clone()).service(service.cli_selector());
        if let Some(environment) = &options.environment {
            request = request.environment(environment);
        }
        if let Some(dir) = &options.working_dir {
            request = request.working_dir(dir);
        }
        if let Some(timeout) = options.timeout {
            request = request.timeout(timeout);
        }
        if let Some(callback) = &options.on_output {
            request = request.on_output(callback.clone());
        }
        request
    }

    pub(crate) async fn require_service(
        &self,
        service_id: &ServiceId,
    ) -> Result<Service, DeployError> {
        self.registry
            .find_service(service_id)
            .await?
            .ok_or_else(|| DeployError::ServiceNotFound(service_id.to_string()))
    }

    /// Audit failures are logged and swallowed; they never fail the
    /// operation they describe.
    pub(crate) async fn emit_audit(&self, event: AuditEvent) {
        if let Err(e) = self.audit.record(event).await {
            tracing::warn!("audit sink failed: {}", e);
        }
    }

    pub(crate) async fn emit_notification(&self, notification: Notification) {
        if let Err(e) = self.notifier.notify(notification).await {
            tracing::warn!("notification sink failed: {}", e);
        }
    }
}

/// Sanitized stderr, a timeout message, or the bare exit code, in that order
/// of preference.
fn failure_detail(result: &CommandExecutionResult) -> String {
    if result.timed_out {
        format!(
            "command timed out after {} seconds",
            result.duration.as_secs()
        )
    } else if !result.stderr.trim().is_empty() {
        result.stderr.trim().to_string()
    } else {
        format!("command exited with code {}", result.exit_code)
    }
}

/// Best-effort extraction of the platform-generated deployment URL from the
/// CLI's human-readable output.
fn extract_deployment_url(stdout: &str) -> Option<String> {
    DEPLOY_URL_RE
        .find(stdout)
        .map(|m| m.as_str().trim_end_matches('/').to_string())
}

fn extract_username(stdout: &str) -> Option<String> {
    WHOAMI_RE
        .captures(stdout)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn extracts_deployment_url_from_noise() {
        let stdout = "Building...\nDeploy complete\nhttps://api-prod.up.railway.app\nDone";
        assert_eq!(
            extract_deployment_url(stdout).as_deref(),
            Some("https://api-prod.up.railway.app")
        );
    }

    #[test]
    fn no_url_yields_none() {
        assert_eq!(extract_deployment_url("Build logs only"), None);
    }

    #[test]
    fn extracts_username_from_whoami() {
        let stdout = "Logged in as Casey Jones (casey@example.com)\n";
        assert_eq!(extract_username(stdout).as_deref(), Some("Casey Jones"));
    }

    #[test]
    fn failure_detail_prefers_timeout_message() {
        let result = CommandExecutionResult {
            exit_code: 137,
            stdout: String::new(),
            stderr: "killed".to_string(),
            duration: Duration::from_secs(600),
            timed_out: true,
        };
        assert_eq!(failure_detail(&result), "command timed out after 600 seconds");
    }

    #[test]
    fn failure_detail_falls_back_to_exit_code() {
        let result = CommandExecutionResult {
            exit_code: 2,
            stdout: String::new(),
            stderr: "  ".to_string(),
            duration: Duration::from_secs(1),
            timed_out: false,
        };
        assert_eq!(failure_detail(&result), "command exited with code 2");
    }
}
