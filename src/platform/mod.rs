// ABOUTME: Remote platform API contract for operations the CLI cannot perform.
// ABOUTME: Unified upstream error with conflict vs gateway classification.

use async_trait::async_trait;
use snafu::Snafu;
use std::collections::HashMap;

/// Unified error for remote platform API failures.
#[derive(Debug, Clone, Snafu)]
#[snafu(visibility(pub))]
pub enum UpstreamError {
    #[snafu(display("{entity} '{name}' already exists"))]
    Conflict { entity: &'static str, name: String },

    #[snafu(display("platform gateway error: {message}"))]
    Gateway { message: String },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamErrorKind {
    /// Duplicate-name condition the platform reports on creation.
    Conflict,
    /// Everything else, including network failures.
    Gateway,
}

impl UpstreamError {
    pub fn kind(&self) -> UpstreamErrorKind {
        match self {
            UpstreamError::Conflict { .. } => UpstreamErrorKind::Conflict,
            UpstreamError::Gateway { .. } => UpstreamErrorKind::Gateway,
        }
    }

    /// Classify a raw platform failure message: a recognizable already-exists
    /// condition becomes a conflict, anything else a gateway error.
    pub fn classify(entity: &'static str, name: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        if message.to_lowercase().contains("already exists") {
            UpstreamError::Conflict {
                entity,
                name: name.to_string(),
            }
        } else {
            UpstreamError::Gateway { message }
        }
    }
}

/// A deployment as the remote API reports it.
#[derive(Debug, Clone)]
pub struct PlatformDeployment {
    pub id: String,
    pub status: String,
    pub url: Option<String>,
}

/// A domain as the remote API reports it.
#[derive(Debug, Clone)]
pub struct PlatformDomain {
    pub id: String,
    pub domain: String,
}

/// Operations against the platform's remote API. The CLI covers day-to-day
/// deploys; this covers what the CLI cannot do, like redeploying an arbitrary
/// historical deployment by id.
#[async_trait]
pub trait PlatformApiClient: Send + Sync {
    async fn create_project(
        &self,
        name: &str,
        workspace_id: &str,
    ) -> Result<String, UpstreamError>;

    async fn create_service(&self, project_id: &str, name: &str) -> Result<String, UpstreamError>;

    async fn trigger_deployment(
        &self,
        platform_service_id: &str,
    ) -> Result<PlatformDeployment, UpstreamError>;

    async fn get_deployment(
        &self,
        platform_deployment_id: &str,
    ) -> Result<PlatformDeployment, UpstreamError>;

    async fn list_deployments(
        &self,
        platform_service_id: &str,
        limit: usize,
    ) -> Result<Vec<PlatformDeployment>, UpstreamError>;

    /// Redeploy a historical deployment by its platform id. Rollback is built
    /// on this.
    async fn redeploy_deployment(
        &self,
        platform_deployment_id: &str,
    ) -> Result<PlatformDeployment, UpstreamError>;

    async fn upsert_variables(
        &self,
        platform_service_id: &str,
        variables: &HashMap<String, String>,
    ) -> Result<(), UpstreamError>;

    async fn create_domain(
        &self,
        platform_service_id: &str,
        domain: &str,
    ) -> Result<PlatformDomain, UpstreamError>;

    async fn list_domains(
        &self,
        platform_service_id: &str,
    ) -> Result<Vec<PlatformDomain>, UpstreamError>;

    async fn delete_domain(&self, domain_id: &str) -> Result<(), UpstreamError>;
}

/// Placeholder client for deployments that run purely through the CLI.
/// Every call reports a gateway error telling the operator to wire in a real
/// API client.
#[derive(Debug, Default)]
pub struct UnconfiguredPlatformClient;

impl UnconfiguredPlatformClient {
    fn unavailable<T>(&self, operation: &str) -> Result<T, UpstreamError> {
        Err(UpstreamError::Gateway {
            message: format!("remote platform API is not configured (needed for {operation})"),
        })
    }
}

#[async_trait]
impl PlatformApiClient for UnconfiguredPlatformClient {
    async fn create_project(&self, _: &str, _: &str) -> Result<String, UpstreamError> {
        self.unavailable("create_project")
    }

    async fn create_service(&self, _: &str, _: &str) -> Result<String, UpstreamError> {
        self.unavailable("create_service")
    }

    async fn trigger_deployment(&self, _: &str) -> Result<PlatformDeployment, UpstreamError> {
        self.unavailable("trigger_deployment")
    }

    async fn get_deployment(&self, _: &str) -> Result<PlatformDeployment, UpstreamError> {
        self.unavailable("get_deployment")
    }

    async fn list_deployments(
        &self,
        _: &str,
        _: usize,
    ) -> Result<Vec<PlatformDeployment>, UpstreamError> {
        self.unavailable("list_deployments")
    }

    async fn redeploy_deployment(&self, _: &str) -> Result<PlatformDeployment, UpstreamError> {
        self.unavailable("redeploy_deployment")
    }

    async fn upsert_variables(
        &self,
        _: &str,
        _: &HashMap<String, String>,
    ) -> Result<(), UpstreamError> {
        self.unavailable("upsert_variables")
    }

    async fn create_domain(&self, _: &str, _: &str) -> Result<PlatformDomain, UpstreamError> {
        self.unavailable("create_domain")
    }

    async fn list_domains(&self, _: &str) -> Result<Vec<PlatformDomain>, UpstreamError> {
        self.unavailable("list_domains")
    }

    async fn delete_domain(&self, _: &str) -> Result<(), UpstreamError> {
        self.unavailable("delete_domain")
    }
}
