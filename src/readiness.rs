// ABOUTME: Polls a provisioned service's status until it reports active.
// ABOUTME: Uses the CLI's JSON status output; malformed output means keep waiting.

use secrecy::SecretString;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::executor::{CommandExecutor, CommandRequest, ValidationError};

/// Fixed pause between status polls.
pub const POLL_INTERVAL: Duration = Duration::from_millis(2_000);

#[derive(Debug, Error)]
pub enum ReadinessError {
    #[error("service {service} did not become active within {timeout:?}")]
    Timeout { service: String, timeout: Duration },

    #[error("status command rejected: {0}")]
    Rejected(#[from] ValidationError),
}

#[derive(Debug, Deserialize)]
struct StatusReport {
    status: String,
}

/// Waits for a freshly provisioned service to come up.
pub struct ServiceReadinessPoller {
    executor: Arc<CommandExecutor>,
}

impl ServiceReadinessPoller {
    pub fn new(executor: Arc<CommandExecutor>) -> Self {
        Self { executor }
    }

    /// Poll until the platform reports the service `active`, or the deadline
    /// passes. The final poll is clamped so it never overruns the deadline.
    pub async fn wait_until_ready(
        &self,
        token: &SecretString,
        platform_service_id: &str,
        timeout: Duration,
    ) -> Result<(), ReadinessError> {
        let deadline = Instant::now() + timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(ReadinessError::Timeout {
                    service: platform_service_id.to_string(),
                    timeout,
                });
            }

            let request = CommandRequest::new("status", token.clone())
                .service(platform_service_id)
                .flag("--json")
                .timeout(remaining);
            let result = self.executor.execute(&request).await?;
            if result.success() && reports_active(&result.stdout) {
                return Ok(());
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(ReadinessError::Timeout {
                    service: platform_service_id.to_string(),
                    timeout,
                });
            }
            tokio::time::sleep(remaining.min(POLL_INTERVAL)).await;
        }
    }
}

/// Unparseable status output counts as not-yet-ready, not as an error; the
/// CLI prints partial JSON while provisioning is still settling.
fn reports_active(stdout: &str) -> bool {
    serde_json::from_str::<StatusReport>(stdout.trim())
        .map(|report| report.status.eq_ignore_ascii_case("active"))
        .unwrap_or(false)
}
