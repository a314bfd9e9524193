// ABOUTME: Health probe and deployment history commands.
// ABOUTME: Read-only views over the CLI connection and the local ledger.

use railyard::error::Result;
use railyard::output::Output;
use railyard::store::{DeploymentLedger, ServiceRegistry};

use super::context::AppContext;

/// Project overview: every service with its rollout order and last status.
pub async fn status(ctx: &AppContext, output: &mut Output) -> Result<()> {
    let services = ctx.registry.list_services(&ctx.project_id).await?;
    for service in &services {
        output.progress(&format!(
            "{:<20} order {}  {:<12} {}",
            service.name.to_string(),
            service.deploy_order,
            service.status.to_string(),
            service.domain.as_deref().unwrap_or("-")
        ));
    }
    output.success(&format!("{} service(s) configured", services.len()));
    Ok(())
}

/// Probe CLI connectivity with `whoami`.
pub async fn health(ctx: &AppContext, output: &mut Output) -> Result<()> {
    output.start_timer();
    let status = ctx.deployer.check_health(&ctx.token).await;

    if status.connected {
        let who = status.username.as_deref().unwrap_or("(unknown user)");
        output.success(&format!("Connected as {who}"));
    } else {
        let why = status.error.as_deref().unwrap_or("no diagnostic available");
        output.error(&format!("Not connected: {why}"));
    }
    Ok(())
}

/// Print the recorded deployment history for a service, newest first.
pub async fn history(ctx: &AppContext, service_name: &str, output: &mut Output) -> Result<()> {
    let service = ctx.resolve_service(service_name).await?;
    let mut records = ctx.ledger.list_records(&service.id).await?;
    records.reverse();

    if records.is_empty() {
        output.progress(&format!("No deployments recorded for {}", service.name));
        return Ok(());
    }

    for record in &records {
        let duration = record
            .build_seconds
            .map(|s| format!("{s:.1}s"))
            .unwrap_or_else(|| "-".to_string());
        let mut line = format!(
            "{}  {}  {}  {}  {}",
            record.started_at.format("%Y-%m-%d %H:%M:%S"),
            record.id,
            record.trigger,
            record.status,
            duration
        );
        if let Some(source) = record.rollback_source() {
            line.push_str(&format!("  (restores {source})"));
        }
        output.progress(&line);
    }
    output.success(&format!(
        "{} deployment(s) recorded for {}",
        records.len(),
        service.name
    ));
    Ok(())
}
