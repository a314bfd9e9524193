// ABOUTME: Test support utilities.
// ABOUTME: Stub CLI scripts, fake collaborators, and component graph helpers.

use async_trait::async_trait;
use parking_lot::Mutex;
use secrecy::SecretString;
use std::collections::HashMap;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::{Arc, Once};
use tempfile::TempDir;

use railyard::audit::{AuditEvent, AuditSink, LogNotificationSink, SinkError};
use railyard::deploy::SingleServiceDeployer;
use railyard::executor::CommandExecutor;
use railyard::platform::{PlatformApiClient, PlatformDeployment, PlatformDomain, UpstreamError};
use railyard::store::{MemoryStore, ServiceRegistry};
use railyard::types::{ProjectId, Service, ServiceKind, ServiceName};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("railyard=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// An executable shell script standing in for the platform CLI.
pub struct StubCli {
    // Held so the script survives as long as the stub.
    _dir: TempDir,
    pub path: PathBuf,
}

/// Write an executable script that plays the platform CLI. The script body
/// sees the sandbox argv as `$1..` and writes to stdout/stderr as usual.
#[allow(dead_code)]
pub fn stub_cli(body: &str) -> StubCli {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("railway-stub");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write stub");
    let mut perms = fs::metadata(&path).expect("stub metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("chmod stub");
    StubCli { _dir: dir, path }
}

#[allow(dead_code)]
pub fn token() -> SecretString {
    SecretString::from("test-token-secret123".to_string())
}

/// Audit sink that records every event for assertions.
#[derive(Default)]
pub struct CapturingAuditSink {
    pub events: Mutex<Vec<AuditEvent>>,
}

#[async_trait]
impl AuditSink for CapturingAuditSink {
    async fn record(&self, event: AuditEvent) -> Result<(), SinkError> {
        self.events.lock().push(event);
        Ok(())
    }
}

impl CapturingAuditSink {
    #[allow(dead_code)]
    pub fn actions(&self) -> Vec<String> {
        self.events.lock().iter().map(|e| e.action.clone()).collect()
    }
}

/// Platform client whose redeploy-by-id succeeds and records its calls.
#[derive(Default)]
pub struct FakePlatformClient {
    pub redeployed: Mutex<Vec<String>>,
}

#[async_trait]
impl PlatformApiClient for FakePlatformClient {
    async fn create_project(&self, _: &str, _: &str) -> Result<String, UpstreamError> {
        Ok("plat-proj-1".to_string())
    }

    async fn create_service(&self, _: &str, name: &str) -> Result<String, UpstreamError> {
        Ok(format!("plat-svc-{name}"))
    }

    async fn trigger_deployment(&self, _: &str) -> Result<PlatformDeployment, UpstreamError> {
        Ok(PlatformDeployment {
            id: "plat-dep-new".to_string(),
            status: "building".to_string(),
            url: None,
        })
    }

    async fn get_deployment(&self, id: &str) -> Result<PlatformDeployment, UpstreamError> {
        Ok(PlatformDeployment {
            id: id.to_string(),
            status: "success".to_string(),
            url: None,
        })
    }

    async fn list_deployments(
        &self,
        _: &str,
        _: usize,
    ) -> Result<Vec<PlatformDeployment>, UpstreamError> {
        Ok(Vec::new())
    }

    async fn redeploy_deployment(&self, id: &str) -> Result<PlatformDeployment, UpstreamError> {
        self.redeployed.lock().push(id.to_string());
        Ok(PlatformDeployment {
            id: format!("plat-redeploy-of-{id}"),
            status: "building".to_string(),
            url: None,
        })
    }

    async fn upsert_variables(
        &self,
        _: &str,
        _: &HashMap<String, String>,
    ) -> Result<(), UpstreamError> {
        Ok(())
    }

    async fn create_domain(&self, _: &str, domain: &str) -> Result<PlatformDomain, UpstreamError> {
        Ok(PlatformDomain {
            id: "plat-dom-1".to_string(),
            domain: domain.to_string(),
        })
    }

    async fn list_domains(&self, _: &str) -> Result<Vec<PlatformDomain>, UpstreamError> {
        Ok(Vec::new())
    }

    async fn delete_domain(&self, _: &str) -> Result<(), UpstreamError> {
        Ok(())
    }
}

/// A deployer plus its collaborators, all inspectable from tests.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub deployer: Arc<SingleServiceDeployer>,
    pub audit: Arc<CapturingAuditSink>,
    pub platform: Arc<FakePlatformClient>,
    _stub: StubCli,
}

#[allow(dead_code)]
pub fn harness(stub: StubCli) -> Harness {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    let audit = Arc::new(CapturingAuditSink::default());
    let platform = Arc::new(FakePlatformClient::default());
    let executor = Arc::new(CommandExecutor::new(&stub.path));
    let deployer = Arc::new(SingleServiceDeployer::new(
        executor,
        platform.clone(),
        store.clone(),
        store.clone(),
        audit.clone(),
        Arc::new(LogNotificationSink),
    ));
    Harness {
        store,
        deployer,
        audit,
        platform,
        _stub: stub,
    }
}

#[allow(dead_code)]
pub const PROJECT: &str = "proj-test";

#[allow(dead_code)]
pub fn project_id() -> ProjectId {
    ProjectId::new(PROJECT)
}

/// Seed a provisioning-state service into the registry.
#[allow(dead_code)]
pub async fn seed_service(store: &MemoryStore, name: &str, order: u32) -> Service {
    let service = Service::provisioning(
        project_id(),
        "ws-test",
        ServiceName::new(name).expect("valid test service name"),
        ServiceKind::Api,
        order,
    );
    store
        .create_service(service)
        .await
        .expect("seed service")
}
