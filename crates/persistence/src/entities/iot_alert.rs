//! IoT alert entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::iot_alert::{AlertSeverity, AlertStatus, AlertType, NotificationChannel};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the iot_alerts table.
#[derive(Debug, Clone, FromRow)]
pub struct IotAlertEntity {
    pub id: Uuid,
    pub device_id: Option<Uuid>,
    pub field_id: Option<Uuid>,
    pub crop_id: Option<Uuid>,
    pub alert_type: String,
    pub severity: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub value: Option<serde_json::Value>,
    pub threshold: Option<serde_json::Value>,
    pub status: String,
    pub acknowledged_by: Option<Uuid>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution_notes: Option<String>,
    pub notification_sent: bool,
    pub notification_channels: Vec<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IotAlertEntity {
    pub fn status(&self) -> AlertStatus {
        self.status.parse().unwrap_or_default()
    }

    /// Convert to domain model.
    pub fn into_domain(self) -> domain::models::IotAlert {
        let status = self.status();
        let notification_channels = self
            .notification_channels
            .iter()
            .filter_map(|c| c.parse::<NotificationChannel>().ok())
            .collect();

        domain::models::IotAlert {
            id: self.id,
            device_id: self.device_id,
            field_id: self.field_id,
            crop_id: self.crop_id,
            alert_type: self.alert_type.parse().unwrap_or(AlertType::Other),
            severity: self.severity.parse().unwrap_or(AlertSeverity::Medium),
            message: self.message,
            timestamp: self.timestamp,
            value: self.value,
            threshold: self.threshold,
            status,
            acknowledged_by: self.acknowledged_by,
            acknowledged_at: self.acknowledged_at,
            resolved_by: self.resolved_by,
            resolved_at: self.resolved_at,
            resolution_notes: self.resolution_notes,
            notification_sent: self.notification_sent,
            notification_channels,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl From<IotAlertEntity> for domain::models::IotAlert {
    fn from(entity: IotAlertEntity) -> Self {
        entity.into_domain()
    }
}
