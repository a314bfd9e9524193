// ABOUTME: Integration tests for variable management.
// ABOUTME: Values never escape into results, audit payloads, or errors.

mod support;

use std::collections::BTreeMap;

use railyard::deploy::{DeployError, DeployOptions};
use support::{harness, seed_service, stub_cli, token};

fn options() -> DeployOptions {
    DeployOptions::new(token(), "tester@host")
}

#[tokio::test]
async fn list_reports_names_and_presence_only() {
    let stub = stub_cli(
        r#"if [ "$1" = "variable" ] && [ "$2" = "list" ]; then
  echo "API_KEY=supersecretvalue"
  echo "DATABASE_URL=postgres://u:p@host/db"
  echo "LOG_LEVEL=debug"
  exit 0
fi
exit 1"#,
    );
    let h = harness(stub);
    let service = seed_service(&h.store, "api", 1).await;

    let variables = h
        .deployer
        .list_variables(&service.id, &options())
        .await
        .unwrap();

    let names: Vec<&str> = variables.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["API_KEY", "DATABASE_URL", "LOG_LEVEL"]);
    assert!(variables.iter().all(|v| v.masked));

    // Neither the returned structures nor any audit payload carry a value.
    let rendered = format!("{variables:?}");
    assert!(!rendered.contains("supersecretvalue"));
    for event in h.audit.events.lock().iter() {
        let payload = format!("{event:?}");
        assert!(!payload.contains("supersecretvalue"));
        assert!(!payload.contains("u:p@host"));
    }
}

#[tokio::test]
async fn set_audits_names_and_counts_never_values() {
    let h = harness(stub_cli("exit 0"));
    let service = seed_service(&h.store, "api", 1).await;

    let mut variables = BTreeMap::new();
    variables.insert("API_KEY".to_string(), "supersecretvalue".to_string());
    variables.insert("LOG_LEVEL".to_string(), "debug".to_string());

    let count = h
        .deployer
        .set_variables(&service.id, &variables, &options())
        .await
        .unwrap();
    assert_eq!(count, 2);

    let events = h.audit.events.lock();
    let event = events
        .iter()
        .find(|e| e.action == "service.variables_set")
        .expect("set audit event");
    assert_eq!(
        event.metadata.get("names").and_then(|v| v.as_str()),
        Some("API_KEY,LOG_LEVEL")
    );
    assert_eq!(
        event.metadata.get("count").and_then(|v| v.as_u64()),
        Some(2)
    );
    assert!(!format!("{event:?}").contains("supersecretvalue"));
}

#[tokio::test]
async fn failed_set_surfaces_a_terse_error_without_the_value() {
    let h = harness(stub_cli("echo \"variable service unavailable\" >&2\nexit 1"));
    let service = seed_service(&h.store, "api", 1).await;

    let mut variables = BTreeMap::new();
    variables.insert("API_KEY".to_string(), "supersecretvalue".to_string());

    let err = h
        .deployer
        .set_variables(&service.id, &variables, &options())
        .await
        .unwrap_err();
    match err {
        DeployError::CommandFailed { detail, .. } => {
            assert!(detail.contains("variable service unavailable"));
            assert!(!detail.contains("supersecretvalue"));
        }
        other => panic!("expected CommandFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn delete_passes_the_name_through_the_variable_verb() {
    let stub = stub_cli(
        r#"if [ "$1" = "variable" ] && [ "$2" = "delete" ] && [ "$3" = "API_KEY" ]; then
  exit 0
fi
echo "unexpected argv: $*" >&2
exit 1"#,
    );
    let h = harness(stub);
    let service = seed_service(&h.store, "api", 1).await;

    h.deployer
        .delete_variable(&service.id, "API_KEY", &options())
        .await
        .unwrap();

    let events = h.audit.events.lock();
    let event = events
        .iter()
        .find(|e| e.action == "service.variable_deleted")
        .expect("delete audit event");
    assert_eq!(
        event.metadata.get("name").and_then(|v| v.as_str()),
        Some("API_KEY")
    );
}
