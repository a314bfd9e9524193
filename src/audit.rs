// ABOUTME: Audit and notification sinks for deployment events.
// ABOUTME: Fire-and-forget contracts; callers log failures and never propagate them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("sink failure: {0}")]
pub struct SinkError(pub String);

/// One audit trail entry. Metadata must never carry secret values; variable
/// operations record names and counts only.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub workspace_id: String,
    pub actor: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub metadata: HashMap<String, serde_json::Value>,
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        workspace_id: impl Into<String>,
        actor: impl Into<String>,
        action: impl Into<String>,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            actor: actor.into(),
            action: action.into(),
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            metadata: HashMap::new(),
            occurred_at: Utc::now(),
        }
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }
}

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: AuditEvent) -> Result<(), SinkError>;
}

/// Best-effort user-facing event.
#[derive(Debug, Clone)]
pub struct Notification {
    pub actor: String,
    pub title: String,
    pub body: String,
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, notification: Notification) -> Result<(), SinkError>;
}

/// Writes audit events to the tracing log. Default sink for the CLI.
#[derive(Debug, Default)]
pub struct LogAuditSink;

#[async_trait]
impl AuditSink for LogAuditSink {
    async fn record(&self, event: AuditEvent) -> Result<(), SinkError> {
        tracing::info!(
            action = %event.action,
            actor = %event.actor,
            entity_type = %event.entity_type,
            entity_id = %event.entity_id,
            metadata = %serde_json::to_string(&event.metadata).unwrap_or_default(),
            "audit"
        );
        Ok(())
    }
}

/// Writes notifications to the tracing log.
#[derive(Debug, Default)]
pub struct LogNotificationSink;

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn notify(&self, notification: Notification) -> Result<(), SinkError> {
        tracing::info!(
            actor = %notification.actor,
            title = %notification.title,
            body = %notification.body,
            "notification"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_accumulates_metadata() {
        let event = AuditEvent::new("ws", "jo@host", "service.deployed", "service", "svc-1")
            .with_meta("status", "success")
            .with_meta("duration_seconds", 12.5);
        assert_eq!(event.metadata.len(), 2);
        assert_eq!(
            event.metadata.get("status"),
            Some(&serde_json::Value::String("success".into()))
        );
    }
}
