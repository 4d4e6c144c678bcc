//! Maintenance log repository for database operations.

use chrono::{DateTime, Utc};
use domain::models::maintenance_log::{CreateMaintenanceLogRequest, MaintenanceType};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::MaintenanceLogEntity;
use crate::metrics::QueryTimer;

const LOG_COLUMNS: &str = r#"
    id, device_id, maintenance_type, performed_by, performed_at, description,
    actions, parts_replaced, before_status, after_status, next_maintenance_due,
    cost, attachments, notes, created_at
"#;

const LOG_FILTER: &str = r#"
    FROM maintenance_logs
    WHERE device_id = $1
      AND ($2::text IS NULL OR maintenance_type = $2)
      AND ($3::uuid IS NULL OR performed_by = $3)
      AND ($4::timestamptz IS NULL OR performed_at >= $4)
      AND ($5::timestamptz IS NULL OR performed_at <= $5)
"#;

/// Filters for a device's maintenance history.
#[derive(Debug, Clone, Default)]
pub struct MaintenanceFilter {
    pub maintenance_type: Option<MaintenanceType>,
    pub performed_by: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Repository for maintenance history. Entries are never updated or deleted
/// individually.
#[derive(Clone)]
pub struct MaintenanceLogRepository {
    pool: PgPool,
}

impl MaintenanceLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append a log entry and apply its effects to the device in one
    /// transaction: `last_maintenance` becomes `performed_at`, and the status
    /// and next due date follow the entry when it sets them.
    ///
    /// Returns `None` if the device does not exist.
    pub async fn create(
        &self,
        device_id: Uuid,
        performed_by: Uuid,
        req: &CreateMaintenanceLogRequest,
    ) -> Result<Option<MaintenanceLogEntity>, sqlx::Error> {
        let timer = QueryTimer::new("create_maintenance_log");
        let mut tx = self.pool.begin().await?;

        let current: Option<(String,)> =
            sqlx::query_as("SELECT status FROM devices WHERE id = $1 FOR UPDATE")
                .bind(device_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((current_status,)) = current else {
            return Ok(None);
        };

        let before_status = req
            .before_status
            .map(|s| s.as_str().to_string())
            .unwrap_or(current_status);
        let performed_at = req.performed_at.unwrap_or_else(Utc::now);

        let log = sqlx::query_as::<_, MaintenanceLogEntity>(&format!(
            r#"
            INSERT INTO maintenance_logs (
                device_id, maintenance_type, performed_by, performed_at, description,
                actions, parts_replaced, before_status, after_status, next_maintenance_due,
                cost, attachments, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {LOG_COLUMNS}
            "#
        ))
        .bind(device_id)
        .bind(req.maintenance_type.as_str())
        .bind(performed_by)
        .bind(performed_at)
        .bind(&req.description)
        .bind(Json(&req.actions))
        .bind(Json(&req.parts_replaced))
        .bind(&before_status)
        .bind(req.after_status.map(|s| s.as_str()))
        .bind(req.next_maintenance_due)
        .bind(req.cost.as_ref().map(Json))
        .bind(Json(&req.attachments))
        .bind(&req.notes)
        .fetch_one(&mut *tx)
        .await?;

        // A backdated entry is history only; the device keeps the state set
        // by its most recent maintenance.
        sqlx::query(
            r#"
            UPDATE devices SET
                last_maintenance = GREATEST(COALESCE(last_maintenance, $2), $2),
                status = CASE
                    WHEN $2 >= COALESCE(last_maintenance, $2) THEN COALESCE($3, status)
                    ELSE status
                END,
                next_maintenance = CASE
                    WHEN $2 >= COALESCE(last_maintenance, $2) THEN COALESCE($4, next_maintenance)
                    ELSE next_maintenance
                END
            WHERE id = $1
            "#,
        )
        .bind(device_id)
        .bind(performed_at)
        .bind(req.after_status.map(|s| s.as_str()))
        .bind(req.next_maintenance_due)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(Some(log))
    }

    /// One page of a device's history, most recent first, plus the total.
    pub async fn list_for_device(
        &self,
        device_id: Uuid,
        filter: &MaintenanceFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<MaintenanceLogEntity>, i64), sqlx::Error> {
        let timer = QueryTimer::new("list_maintenance_logs");

        let rows = sqlx::query_as::<_, MaintenanceLogEntity>(&format!(
            r#"
            SELECT {LOG_COLUMNS}
            {LOG_FILTER}
            ORDER BY performed_at DESC, id DESC
            LIMIT $6 OFFSET $7
            "#
        ))
        .bind(device_id)
        .bind(filter.maintenance_type.map(|t| t.as_str()))
        .bind(filter.performed_by)
        .bind(filter.from)
        .bind(filter.to)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) {LOG_FILTER}"))
            .bind(device_id)
            .bind(filter.maintenance_type.map(|t| t.as_str()))
            .bind(filter.performed_by)
            .bind(filter.from)
            .bind(filter.to)
            .fetch_one(&self.pool)
            .await?;

        timer.record();
        Ok((rows, total.0))
    }
}
