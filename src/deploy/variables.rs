// ABOUTME: Service variable management through the CLI's variable verb.
// ABOUTME: Values never appear in return values, logs, or audit payloads.

use std::collections::BTreeMap;

use super::error::DeployError;
use super::single::{DeployOptions, SingleServiceDeployer};
use crate::audit::AuditEvent;
use crate::types::ServiceId;

/// A variable as reported to callers: name and presence only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableSummary {
    pub name: String,
    /// Always true: the value existed but was withheld.
    pub masked: bool,
}

impl SingleServiceDeployer {
    /// List variable names for a service. Values are parsed out of the CLI
    /// output and dropped before anything leaves this function.
    pub async fn list_variables(
        &self,
        service_id: &ServiceId,
        options: &DeployOptions,
    ) -> Result<Vec<VariableSummary>, DeployError> {
        let service = self.require_service(service_id).await?;
        let request = self.scoped_request("variable list", &service, options);
        let result = self.executor().execute(&request).await?;
        if !result.success() {
            return Err(DeployError::CommandFailed {
                operation: "variable list",
                service: service.name.to_string(),
                detail: variable_failure_detail(&result.stderr, result.exit_code),
            });
        }

        let variables: Vec<VariableSummary> = result
            .stdout
            .lines()
            .filter_map(|line| line.split_once('='))
            .map(|(name, _)| VariableSummary {
                name: name.trim().to_string(),
                masked: true,
            })
            .collect();

        self.emit_audit(
            AuditEvent::new(
                &service.workspace_id,
                &options.actor,
                "service.variables_listed",
                "service",
                service.id.as_str(),
            )
            .with_meta("service_name", service.name.to_string())
            .with_meta("count", variables.len()),
        )
        .await;

        Ok(variables)
    }

    /// Set variables one key at a time. The audit trail records the sorted
    /// key names and the count, never a value.
    pub async fn set_variables(
        &self,
        service_id: &ServiceId,
        variables: &BTreeMap<String, String>,
        options: &DeployOptions,
    ) -> Result<usize, DeployError> {
        let service = self.require_service(service_id).await?;

        for (name, value) in variables {
            let request = self
                .scoped_request("variable set", &service, options)
                .arg(format!("{name}={value}"));
            let result = self.executor().execute(&request).await?;
            if !result.success() {
                return Err(DeployError::CommandFailed {
                    operation: "variable set",
                    service: service.name.to_string(),
                    detail: variable_failure_detail(&result.stderr, result.exit_code),
                });
            }
        }

        let names: Vec<&str> = variables.keys().map(String::as_str).collect();
        self.emit_audit(
            AuditEvent::new(
                &service.workspace_id,
                &options.actor,
                "service.variables_set",
                "service",
                service.id.as_str(),
            )
            .with_meta("service_name", service.name.to_string())
            .with_meta("names", names.join(","))
            .with_meta("count", variables.len()),
        )
        .await;

        Ok(variables.len())
    }

    /// Delete one variable by name.
    pub async fn delete_variable(
        &self,
        service_id: &ServiceId,
        name: &str,
        options: &DeployOptions,
    ) -> Result<(), DeployError> {
        let service = self.require_service(service_id).await?;
        let request = self
            .scoped_request("variable delete", &service, options)
            .arg(name);
        let result = self.executor().execute(&request).await?;
        if !result.success() {
            return Err(DeployError::CommandFailed {
                operation: "variable delete",
                service: service.name.to_string(),
                detail: variable_failure_detail(&result.stderr, result.exit_code),
            });
        }

        self.emit_audit(
            AuditEvent::new(
                &service.workspace_id,
                &options.actor,
                "service.variable_deleted",
                "service",
                service.id.as_str(),
            )
            .with_meta("service_name", service.name.to_string())
            .with_meta("name", name),
        )
        .await;

        Ok(())
    }
}

/// Stderr is already sanitized by the executor, but variable operations keep
/// their error detail terse anyway: first line only.
fn variable_failure_detail(stderr: &str, exit_code: i32) -> String {
    match stderr.lines().find(|line| !line.trim().is_empty()) {
        Some(line) => line.trim().to_string(),
        None => format!("command exited with code {exit_code}"),
    }
}
