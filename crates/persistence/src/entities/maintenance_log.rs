//! Maintenance log entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::device::DeviceStatus;
use domain::models::maintenance_log::{
    Attachment, MaintenanceAction, MaintenanceCost, MaintenanceType, ReplacedPart,
};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the maintenance_logs table.
#[derive(Debug, Clone, FromRow)]
pub struct MaintenanceLogEntity {
    pub id: Uuid,
    pub device_id: Uuid,
    pub maintenance_type: String,
    pub performed_by: Uuid,
    pub performed_at: DateTime<Utc>,
    pub description: String,
    pub actions: Json<Vec<MaintenanceAction>>,
    pub parts_replaced: Json<Vec<ReplacedPart>>,
    pub before_status: String,
    pub after_status: Option<String>,
    pub next_maintenance_due: Option<DateTime<Utc>>,
    pub cost: Option<Json<MaintenanceCost>>,
    pub attachments: Json<Vec<Attachment>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<MaintenanceLogEntity> for domain::models::MaintenanceLog {
    fn from(entity: MaintenanceLogEntity) -> Self {
        Self {
            id: entity.id,
            device_id: entity.device_id,
            maintenance_type: entity
                .maintenance_type
                .parse()
                .unwrap_or(MaintenanceType::Other),
            performed_by: entity.performed_by,
            performed_at: entity.performed_at,
            description: entity.description,
            actions: entity.actions.0,
            parts_replaced: entity.parts_replaced.0,
            before_status: entity.before_status.parse().unwrap_or(DeviceStatus::Active),
            after_status: entity
                .after_status
                .and_then(|s| s.parse::<DeviceStatus>().ok()),
            next_maintenance_due: entity.next_maintenance_due,
            cost: entity.cost.map(|c| c.0),
            attachments: entity.attachments.0,
            notes: entity.notes,
            created_at: entity.created_at,
        }
    }
}
