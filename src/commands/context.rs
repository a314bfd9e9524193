// ABOUTME: Composition root wiring config, stores, executor, and deployers.
// ABOUTME: Reads the credential from the host environment exactly once.

use secrecy::SecretString;
use std::sync::Arc;

use railyard::audit::{AuditSink, LogAuditSink, LogNotificationSink, NotificationSink};
use railyard::config::Config;
use railyard::deploy::{DeployOptions, DeploymentOrchestrator, SingleServiceDeployer};
use railyard::error::{Error, Result};
use railyard::executor::{CommandExecutor, OutputStream};
use railyard::platform::{PlatformApiClient, UnconfiguredPlatformClient};
use railyard::store::{DeploymentLedger, FileStore, ServiceRegistry};
use railyard::types::{ProjectId, Service};

const CREDENTIAL_VAR: &str = "RAILWAY_TOKEN";

/// Everything a command handler needs, built once per invocation.
pub struct AppContext {
    pub config: Config,
    pub project_id: ProjectId,
    pub registry: Arc<dyn ServiceRegistry>,
    pub ledger: Arc<dyn DeploymentLedger>,
    pub executor: Arc<CommandExecutor>,
    pub deployer: Arc<SingleServiceDeployer>,
    pub orchestrator: DeploymentOrchestrator,
    pub token: SecretString,
    pub actor: String,
}

impl AppContext {
    pub async fn initialize(config: Config) -> Result<Self> {
        let token = std::env::var(CREDENTIAL_VAR)
            .ok()
            .filter(|t| !t.is_empty())
            .map(SecretString::from)
            .ok_or(Error::MissingCredential(CREDENTIAL_VAR))?;

        let store = Arc::new(FileStore::open(&config.state_file)?);
        let registry: Arc<dyn ServiceRegistry> = store.clone();
        let ledger: Arc<dyn DeploymentLedger> = store;

        let project_id = ProjectId::new(config.project.clone());
        sync_services(&config, &project_id, registry.as_ref()).await?;

        let executor = Arc::new(CommandExecutor::new(&config.cli_binary));
        let platform: Arc<dyn PlatformApiClient> = Arc::new(UnconfiguredPlatformClient);
        let audit: Arc<dyn AuditSink> = Arc::new(LogAuditSink);
        let notifier: Arc<dyn NotificationSink> = Arc::new(LogNotificationSink);

        let deployer = Arc::new(SingleServiceDeployer::new(
            executor.clone(),
            platform,
            registry.clone(),
            ledger.clone(),
            audit.clone(),
            notifier,
        ));
        let orchestrator = DeploymentOrchestrator::new(
            deployer.clone(),
            registry.clone(),
            ledger.clone(),
            audit,
            config.halt_policy(),
        );

        Ok(Self {
            project_id,
            registry,
            ledger,
            executor,
            deployer,
            orchestrator,
            token,
            actor: default_actor(),
            config,
        })
    }

    pub async fn resolve_service(&self, name: &str) -> Result<Service> {
        self.registry
            .find_service_by_name(&self.project_id, name)
            .await?
            .ok_or_else(|| Error::UnknownService(name.to_string()))
    }

    /// Options for a deploy-class operation; `stream_output` echoes CLI lines
    /// as they arrive.
    pub fn deploy_options(&self, stream_output: bool) -> DeployOptions {
        let mut options = DeployOptions::new(self.token.clone(), self.actor.clone())
            .environment(&self.config.environment);
        if let Some(timeout) = self.config.deploy_timeout {
            options = options.timeout(timeout);
        }
        if stream_output {
            options = options.on_output(Arc::new(|stream: OutputStream, line: &str| {
                match stream {
                    OutputStream::Stdout => println!("  | {line}"),
                    OutputStream::Stderr => eprintln!("  ! {line}"),
                }
            }));
        }
        options
    }

    /// Options for standard (non-deploy) operations.
    pub fn op_options(&self) -> DeployOptions {
        DeployOptions::new(self.token.clone(), self.actor.clone())
            .environment(&self.config.environment)
    }
}

/// The config file is the source of truth for which services exist and in
/// what order they roll out; the registry catches up here.
async fn sync_services(
    config: &Config,
    project_id: &ProjectId,
    registry: &dyn ServiceRegistry,
) -> Result<()> {
    for entry in config.services.iter() {
        match registry
            .find_service_by_name(project_id, entry.name.as_str())
            .await?
        {
            Some(mut existing) => {
                existing.kind = entry.kind;
                existing.deploy_order = entry.deploy_order;
                if entry.platform_id.is_some() {
                    existing.platform_id = entry.platform_id.clone();
                }
                existing.config = entry.env.clone();
                existing.custom_domain = entry.custom_domain.clone();
                registry.save_service(&existing).await?;
            }
            None => {
                let mut service = Service::provisioning(
                    project_id.clone(),
                    config.workspace.clone(),
                    entry.name.clone(),
                    entry.kind,
                    entry.deploy_order,
                );
                service.platform_id = entry.platform_id.clone();
                service.config = entry.env.clone();
                service.custom_domain = entry.custom_domain.clone();
                registry.create_service(service).await?;
            }
        }
    }
    Ok(())
}

fn default_actor() -> String {
    let user = std::env::var("USER").unwrap_or_else(|_| "railyard".to_string());
    let host = gethostname::gethostname().to_string_lossy().into_owned();
    format!("{user}@{host}")
}
