pub mod audit;
pub mod bus;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub use audit::AuditLogObserver;
pub use bus::{EventBus, LifecycleObserver, ObserverError};

/// Something that happened to a component after its transaction committed
#[derive(Debug, Clone, Serialize)]
pub struct LifecycleEvent {
    pub id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub kind: ComponentEvent,
}

impl LifecycleEvent {
    pub fn new(kind: ComponentEvent) -> Self {
        Self { id: Uuid::new_v4(), occurred_at: Utc::now(), kind }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ComponentEvent {
    Created { id: i64, index: String },
    Updated { id: i64 },
    ChartUpdated { id: i64, index: String },
    MapConfigUpdated { map_config_id: i64 },
    Deleted {
        id: i64,
        index: String,
        chart_deleted: bool,
        deleted_map_config_ids: Vec<i64>,
    },
}

impl ComponentEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ComponentEvent::Created { .. } => "created",
            ComponentEvent::Updated { .. } => "updated",
            ComponentEvent::ChartUpdated { .. } => "chart_updated",
            ComponentEvent::MapConfigUpdated { .. } => "map_config_updated",
            ComponentEvent::Deleted { .. } => "deleted",
        }
    }
}
