use async_trait::async_trait;

use super::bus::{LifecycleObserver, ObserverError};
use super::{ComponentEvent, LifecycleEvent};

/// Writes one structured log line per lifecycle event
#[derive(Debug, Default)]
pub struct AuditLogObserver;

#[async_trait]
impl LifecycleObserver for AuditLogObserver {
    fn name(&self) -> &'static str {
        "audit_log"
    }

    async fn notify(&self, event: &LifecycleEvent) -> Result<(), ObserverError> {
        match &event.kind {
            ComponentEvent::Deleted { id, index, chart_deleted, deleted_map_config_ids } => tracing::info!(
                event_id = %event.id,
                component_id = id,
                index = %index,
                chart_deleted,
                deleted_map_configs = ?deleted_map_config_ids,
                "audit: component deleted"
            ),
            other => {
                let payload = serde_json::to_string(other).map_err(|e| ObserverError::Failed(e.to_string()))?;
                tracing::info!(event_id = %event.id, at = %event.occurred_at, "audit: {}", payload);
            }
        }
        Ok(())
    }
}
