//! IoT alert repository for database operations.

use chrono::{DateTime, Utc};
use domain::models::iot_alert::{
    AlertSeverity, AlertStatus, AlertType, CreateAlertRequest,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::IotAlertEntity;
use crate::metrics::QueryTimer;

const ALERT_COLUMNS: &str = r#"
    a.id, a.device_id, a.field_id, a.crop_id, a.alert_type, a.severity, a.message,
    a.timestamp, a.value, a.threshold, a.status,
    a.acknowledged_by, a.acknowledged_at, a.resolved_by, a.resolved_at,
    a.resolution_notes, a.notification_sent, a.notification_channels, a.metadata,
    a.created_at, a.updated_at
"#;

/// Shared WHERE clause for listing and counting.
const ALERT_FILTER: &str = r#"
    FROM iot_alerts a
    LEFT JOIN devices d ON d.id = a.device_id
    LEFT JOIN fields f ON f.id = a.field_id
    WHERE ($1::uuid IS NULL OR d.owner_id = $1 OR f.owner_id = $1)
      AND ($2::uuid IS NULL OR a.device_id = $2)
      AND ($3::uuid IS NULL OR a.field_id = $3)
      AND ($4::text IS NULL OR a.alert_type = $4)
      AND ($5::text IS NULL OR a.severity = $5)
      AND ($6::text IS NULL OR a.status = $6)
      AND ($7::timestamptz IS NULL OR a.timestamp >= $7)
      AND ($8::timestamptz IS NULL OR a.timestamp <= $8)
"#;

/// Filters for alert listings.
#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    /// Restrict to alerts on devices or fields owned by this user; `None` for admins.
    pub visible_to: Option<Uuid>,
    pub device_id: Option<Uuid>,
    pub field_id: Option<Uuid>,
    pub alert_type: Option<AlertType>,
    pub severity: Option<AlertSeverity>,
    pub status: Option<AlertStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Repository for IoT alert database operations.
#[derive(Clone)]
pub struct IotAlertRepository {
    pool: PgPool,
}

impl IotAlertRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record an alert.
    pub async fn create(&self, req: &CreateAlertRequest) -> Result<IotAlertEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_iot_alert");
        let channels: Vec<&str> = req.notification_channels.iter().map(|c| c.as_str()).collect();

        let result = sqlx::query_as::<_, IotAlertEntity>(&format!(
            r#"
            INSERT INTO iot_alerts AS a (
                device_id, field_id, crop_id, alert_type, severity, message, timestamp,
                value, threshold, notification_channels, metadata
            )
            VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, NOW()), $8, $9, $10, $11)
            RETURNING {ALERT_COLUMNS}
            "#
        ))
        .bind(req.device_id)
        .bind(req.field_id)
        .bind(req.crop_id)
        .bind(req.alert_type.as_str())
        .bind(req.severity.as_str())
        .bind(&req.message)
        .bind(req.timestamp)
        .bind(&req.value)
        .bind(&req.threshold)
        .bind(&channels)
        .bind(req.metadata.clone().unwrap_or_else(|| serde_json::json!({})))
        .fetch_one(&self.pool)
        .await;

        timer.record();
        result
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<IotAlertEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_iot_alert_by_id");
        let result = sqlx::query_as::<_, IotAlertEntity>(&format!(
            "SELECT {ALERT_COLUMNS} FROM iot_alerts a WHERE a.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// One page of alerts, newest first, plus the total matching count.
    pub async fn list(
        &self,
        filter: &AlertFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<IotAlertEntity>, i64), sqlx::Error> {
        let timer = QueryTimer::new("list_iot_alerts");

        let rows = sqlx::query_as::<_, IotAlertEntity>(&format!(
            r#"
            SELECT {ALERT_COLUMNS}
            {ALERT_FILTER}
            ORDER BY a.timestamp DESC, a.id DESC
            LIMIT $9 OFFSET $10
            "#
        ))
        .bind(filter.visible_to)
        .bind(filter.device_id)
        .bind(filter.field_id)
        .bind(filter.alert_type.map(|t| t.as_str()))
        .bind(filter.severity.map(|s| s.as_str()))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.from)
        .bind(filter.to)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) {ALERT_FILTER}"))
            .bind(filter.visible_to)
            .bind(filter.device_id)
            .bind(filter.field_id)
            .bind(filter.alert_type.map(|t| t.as_str()))
            .bind(filter.severity.map(|s| s.as_str()))
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.from)
            .bind(filter.to)
            .fetch_one(&self.pool)
            .await?;

        timer.record();
        Ok((rows, total.0))
    }

    /// Move an alert to `target` only if its current status allows it.
    ///
    /// The status check and the write are one statement, so two concurrent
    /// transitions cannot both succeed. Returns `None` when the alert is
    /// missing or its status did not permit the move.
    pub async fn transition(
        &self,
        id: Uuid,
        target: AlertStatus,
        actor: Uuid,
        resolution_notes: Option<&str>,
    ) -> Result<Option<IotAlertEntity>, sqlx::Error> {
        let timer = QueryTimer::new("transition_iot_alert");
        let sources: Vec<&str> = AlertStatus::sources_for(target)
            .iter()
            .map(|s| s.as_str())
            .collect();

        let result = sqlx::query_as::<_, IotAlertEntity>(&format!(
            r#"
            UPDATE iot_alerts AS a SET
                status = $2,
                acknowledged_by = CASE WHEN $2 = 'acknowledged' THEN $4 ELSE a.acknowledged_by END,
                acknowledged_at = CASE WHEN $2 = 'acknowledged' THEN NOW() ELSE a.acknowledged_at END,
                resolved_by = CASE WHEN $2 = 'resolved' THEN $4 ELSE a.resolved_by END,
                resolved_at = CASE WHEN $2 = 'resolved' THEN NOW() ELSE a.resolved_at END,
                resolution_notes = CASE WHEN $2 = 'resolved' THEN $5 ELSE a.resolution_notes END
            WHERE a.id = $1 AND a.status = ANY($3)
            RETURNING {ALERT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(target.as_str())
        .bind(&sources)
        .bind(actor)
        .bind(resolution_notes)
        .fetch_optional(&self.pool)
        .await;

        timer.record();
        result
    }

    /// Delete an alert. Returns the number of rows removed.
    pub async fn delete(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_iot_alert");
        let result = sqlx::query("DELETE FROM iot_alerts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected())
    }
}
