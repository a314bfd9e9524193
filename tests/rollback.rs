// ABOUTME: Integration tests for rollback lineage and restart semantics.
// ABOUTME: Rollback books a new linked record; restart never touches the ledger.

mod support;

use railyard::deploy::{DeployError, DeployOptions};
use railyard::store::{DeploymentLedger, ServiceRegistry};
use railyard::types::{
    DeployTrigger, DeploymentId, DeploymentRecord, DeploymentStatus, ServiceStatus,
};
use support::{harness, seed_service, stub_cli, token};

fn options() -> DeployOptions {
    DeployOptions::new(token(), "tester@host")
}

/// Seed a completed successful deployment the tests can roll back to.
async fn seed_success_record(
    h: &support::Harness,
    service_id: &railyard::types::ServiceId,
) -> DeploymentRecord {
    let mut record = DeploymentRecord::begin(service_id.clone(), DeployTrigger::Manual, "tester");
    record.platform_deployment_id = "plat-dep-original".to_string();
    record.complete_success(42.0, Some("https://api.up.railway.app".to_string()));
    h.store.create_record(record).await.unwrap()
}

#[tokio::test]
async fn rollback_creates_a_new_linked_record_and_spares_the_source() {
    let h = harness(stub_cli("exit 0"));
    let mut service = seed_service(&h.store, "api", 1).await;
    service.status = ServiceStatus::Active;
    h.store.save_service(&service).await.unwrap();
    let source = seed_success_record(&h, &service.id).await;

    let record = h
        .deployer
        .rollback(&service.id, &source.id, &options())
        .await
        .unwrap();

    // New record: rollback trigger, lineage metadata, fresh platform id.
    assert_ne!(record.id, source.id);
    assert_eq!(record.trigger, DeployTrigger::Rollback);
    assert_eq!(record.rollback_source(), Some(source.id.as_str()));
    assert_eq!(
        record.platform_deployment_id,
        "plat-redeploy-of-plat-dep-original"
    );

    // The platform client was asked to redeploy the source's platform id.
    assert_eq!(
        h.platform.redeployed.lock().clone(),
        vec!["plat-dep-original".to_string()]
    );

    // The source record is byte-for-byte untouched.
    let reread = h.store.find_record(&source.id).await.unwrap().unwrap();
    assert_eq!(reread.status, DeploymentStatus::Success);
    assert_eq!(reread.build_seconds, Some(42.0));
    assert_eq!(reread.url, source.url);
    assert_eq!(reread.completed_at, source.completed_at);
    assert!(reread.metadata.is_empty());

    // The service re-enters the deploying state.
    let current = h.store.find_service(&service.id).await.unwrap().unwrap();
    assert_eq!(current.status, ServiceStatus::Deploying);

    let actions = h.audit.actions();
    assert!(actions.contains(&"deployment.rolled_back".to_string()));
}

#[tokio::test]
async fn rollback_to_an_unknown_deployment_is_a_not_found_error() {
    let h = harness(stub_cli("exit 0"));
    let service = seed_service(&h.store, "api", 1).await;

    let missing = DeploymentId::new("dep-never-existed");
    let err = h
        .deployer
        .rollback(&service.id, &missing, &options())
        .await
        .unwrap_err();
    assert!(matches!(err, DeployError::DeploymentNotFound(_)));
    assert!(h.platform.redeployed.lock().is_empty());
}

#[tokio::test]
async fn rollback_is_refused_while_a_deployment_is_in_flight() {
    let h = harness(stub_cli("exit 0"));
    let mut service = seed_service(&h.store, "api", 1).await;
    service.status = ServiceStatus::Deploying;
    h.store.save_service(&service).await.unwrap();
    let source = seed_success_record(&h, &service.id).await;

    let err = h
        .deployer
        .rollback(&service.id, &source.id, &options())
        .await
        .unwrap_err();
    assert!(matches!(err, DeployError::AlreadyInProgress(_)));
}

#[tokio::test]
async fn restart_never_creates_a_deployment_record() {
    let h = harness(stub_cli("exit 0"));
    let mut service = seed_service(&h.store, "api", 1).await;
    service.status = ServiceStatus::Active;
    h.store.save_service(&service).await.unwrap();

    h.deployer.restart(&service.id, &options()).await.unwrap();

    assert!(h.store.list_records(&service.id).await.unwrap().is_empty());
    let current = h.store.find_service(&service.id).await.unwrap().unwrap();
    assert_eq!(current.status, ServiceStatus::Active);
}

#[tokio::test]
async fn failed_restart_raises_upstream_error_and_still_skips_the_ledger() {
    let h = harness(stub_cli("echo \"restart refused\" >&2\nexit 1"));
    let service = seed_service(&h.store, "api", 1).await;

    let err = h
        .deployer
        .restart(&service.id, &options())
        .await
        .unwrap_err();
    match err {
        DeployError::CommandFailed { detail, .. } => {
            assert!(detail.contains("restart refused"));
        }
        other => panic!("expected CommandFailed, got {other:?}"),
    }
    assert!(h.store.list_records(&service.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn single_deploy_records_success_url_and_duration() {
    let h = harness(stub_cli(
        "echo \"Deployed https://api-prod.up.railway.app\"\nexit 0",
    ));
    let service = seed_service(&h.store, "api", 1).await;

    let record = h.deployer.deploy(&service.id, &options()).await.unwrap();

    assert_eq!(record.status, DeploymentStatus::Success);
    assert_eq!(record.url.as_deref(), Some("https://api-prod.up.railway.app"));
    assert!(record.build_seconds.is_some());
    assert!(record.completed_at.is_some());

    let current = h.store.find_service(&service.id).await.unwrap().unwrap();
    assert_eq!(current.status, ServiceStatus::Active);
    assert_eq!(
        current.domain.as_deref(),
        Some("https://api-prod.up.railway.app")
    );
}

#[tokio::test]
async fn failed_deploy_lands_in_failed_with_sanitized_stderr() {
    let h = harness(stub_cli(
        "echo \"cannot reach postgres://u:p@db.internal:5432/app\" >&2\nexit 1",
    ));
    let service = seed_service(&h.store, "api", 1).await;

    let record = h.deployer.deploy(&service.id, &options()).await.unwrap();

    assert_eq!(record.status, DeploymentStatus::Failed);
    let error = record.error.unwrap();
    assert!(!error.contains("u:p@db.internal"));
    assert!(error.contains("postgresql://***:***@***"));

    let current = h.store.find_service(&service.id).await.unwrap().unwrap();
    assert_eq!(current.status, ServiceStatus::Failed);
}
