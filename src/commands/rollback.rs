// ABOUTME: Rollback and restart command implementations.
// ABOUTME: Rollback goes through the platform API; restart is CLI-only.

use railyard::error::Result;
use railyard::output::Output;
use railyard::types::DeploymentId;

use super::context::AppContext;

/// Roll a service back to an earlier recorded deployment.
pub async fn rollback(
    ctx: &AppContext,
    service_name: &str,
    deployment_id: &str,
    output: &mut Output,
) -> Result<()> {
    let service = ctx.resolve_service(service_name).await?;
    output.start_timer();
    output.progress(&format!(
        "Rolling back {} to deployment {}...",
        service.name, deployment_id
    ));

    let target = DeploymentId::new(deployment_id);
    let record = ctx
        .deployer
        .rollback(&service.id, &target, &ctx.op_options())
        .await?;

    output.success(&format!(
        "Rollback started: new deployment {} (restores {})",
        record.id, deployment_id
    ));
    Ok(())
}

/// Restart a running service. Never touches the deployment ledger.
pub async fn restart(ctx: &AppContext, service_name: &str, output: &mut Output) -> Result<()> {
    let service = ctx.resolve_service(service_name).await?;
    output.start_timer();
    output.progress(&format!("Restarting {}...", service.name));

    ctx.deployer
        .restart(&service.id, &ctx.op_options())
        .await?;

    output.success(&format!("Restarted {}", service.name));
    Ok(())
}
