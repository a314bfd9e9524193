// ABOUTME: Deploy command implementations.
// ABOUTME: Single-service deploy/redeploy and the dependency-ordered bulk rollout.

use railyard::deploy::BulkStatus;
use railyard::error::{Error, Result};
use railyard::output::{Output, OutputMode};
use railyard::readiness::ServiceReadinessPoller;
use railyard::types::DeploymentStatus;

use super::context::AppContext;

/// Deploy one service with `up`.
pub async fn deploy(ctx: &AppContext, service_name: &str, output: &mut Output) -> Result<()> {
    run_single(ctx, service_name, output, false).await
}

/// Redeploy one service's latest build.
pub async fn redeploy(ctx: &AppContext, service_name: &str, output: &mut Output) -> Result<()> {
    run_single(ctx, service_name, output, true).await
}

async fn run_single(
    ctx: &AppContext,
    service_name: &str,
    output: &mut Output,
    redeploy: bool,
) -> Result<()> {
    let service = ctx.resolve_service(service_name).await?;
    output.start_timer();
    output.progress(&format!(
        "{} {} ({})...",
        if redeploy { "Redeploying" } else { "Deploying" },
        service.name,
        service.kind
    ));

    let options = ctx.deploy_options(output.mode() == OutputMode::Normal);
    let record = if redeploy {
        ctx.deployer.redeploy(&service.id, &options).await?
    } else {
        ctx.deployer.deploy(&service.id, &options).await?
    };

    match record.status {
        DeploymentStatus::Success => {
            // When the platform id is known, wait for the service to settle
            // before declaring victory. Slow settling is a warning, not a
            // failed deploy.
            if let Some(platform_id) = &service.platform_id {
                output.progress(&format!("Waiting for {} to report active...", service.name));
                let poller = ServiceReadinessPoller::new(ctx.executor.clone());
                if let Err(e) = poller
                    .wait_until_ready(&ctx.token, platform_id, ctx.config.readiness_timeout)
                    .await
                {
                    output.warning(&e.to_string());
                }
            }
            let target = record.url.as_deref().unwrap_or("(no URL reported)");
            output.success(&format!("Deployed {} -> {}", service.name, target));
            Ok(())
        }
        _ => {
            let detail = record
                .error
                .unwrap_or_else(|| "deployment failed".to_string());
            output.error(&detail);
            Err(Error::DeploymentFailed {
                service: service.name.to_string(),
                detail,
            })
        }
    }
}

/// Deploy every service of the project in dependency order.
pub async fn deploy_all(ctx: &AppContext, output: &mut Output) -> Result<()> {
    output.start_timer();
    output.progress(&format!(
        "Deploying {} service(s) in dependency order...",
        ctx.config.services.len()
    ));

    let options = ctx.deploy_options(output.mode() == OutputMode::Normal);
    let result = ctx.orchestrator.deploy_all(&ctx.project_id, &options).await?;

    for outcome in &result.results {
        let line = match outcome.status {
            DeploymentStatus::Success => {
                format!("  ✓ {} (order {})", outcome.service_name, outcome.deploy_order)
            }
            DeploymentStatus::Cancelled => format!(
                "  - {} (order {}): cancelled",
                outcome.service_name, outcome.deploy_order
            ),
            _ => format!(
                "  ✗ {} (order {}): {}",
                outcome.service_name,
                outcome.deploy_order,
                outcome.error.as_deref().unwrap_or("failed")
            ),
        };
        output.progress(&line);
    }

    match result.overall_status {
        BulkStatus::Success => {
            output.success(&format!(
                "Rollout complete: {} succeeded",
                result.succeeded()
            ));
            Ok(())
        }
        BulkStatus::PartialFailure => {
            output.warning(&format!(
                "Rollout finished with partial failure: {} succeeded, {} failed",
                result.succeeded(),
                result.failed()
            ));
            Ok(())
        }
        BulkStatus::Failed => {
            output.error(&format!(
                "Rollout halted: {} succeeded, {} failed, {} cancelled",
                result.succeeded(),
                result.failed(),
                result.cancelled()
            ));
            Err(Error::RolloutHalted)
        }
    }
}
