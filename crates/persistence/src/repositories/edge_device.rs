//! Edge gateway repository for database operations.

use domain::models::edge_device::{CreateEdgeDeviceRequest, UpdateEdgeDeviceRequest};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::EdgeDeviceEntity;
use crate::metrics::QueryTimer;

const EDGE_COLUMNS: &str = r#"
    e.id, e.device_id, e.name, e.device_type, e.owner_id, e.field_id,
    ST_Y(e.location::geometry) AS latitude,
    ST_X(e.location::geometry) AS longitude,
    e.altitude, e.accuracy,
    COALESCE(
        (SELECT array_agg(c.device_id ORDER BY c.connected_at, c.device_id)
         FROM edge_device_connections c
         WHERE c.edge_device_id = e.id),
        ARRAY[]::uuid[]
    ) AS connected_devices,
    e.processing_capabilities, e.operating_system, e.firmware_version,
    e.ip_address, e.mac_address, e.connection_type, e.status, e.last_connected,
    e.deployed_models, e.configuration, e.metadata, e.created_at, e.updated_at
"#;

/// Repository for edge gateway database operations.
#[derive(Clone)]
pub struct EdgeDeviceRepository {
    pool: PgPool,
}

impl EdgeDeviceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register a gateway. A taken `device_id` surfaces as a unique violation.
    pub async fn create(
        &self,
        owner_id: Uuid,
        req: &CreateEdgeDeviceRequest,
    ) -> Result<EdgeDeviceEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_edge_device");
        let location = req.location.as_ref();
        let empty = || serde_json::json!({});

        let result = sqlx::query_as::<_, EdgeDeviceEntity>(&format!(
            r#"
            INSERT INTO edge_devices AS e (
                device_id, name, device_type, owner_id, field_id,
                location, altitude, accuracy,
                processing_capabilities, operating_system, firmware_version,
                ip_address, mac_address, connection_type, status,
                deployed_models, configuration, metadata
            )
            VALUES (
                $1, $2, $3, $4, $5,
                CASE WHEN $6::float8 IS NULL THEN NULL
                     ELSE ST_SetSRID(ST_MakePoint($6, $7), 4326)::geography END,
                $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19
            )
            RETURNING {EDGE_COLUMNS}
            "#
        ))
        .bind(&req.device_id)
        .bind(&req.name)
        .bind(req.device_type.as_str())
        .bind(owner_id)
        .bind(req.field_id)
        .bind(location.map(|l| l.longitude)) // MakePoint takes (x=lon, y=lat)
        .bind(location.map(|l| l.latitude))
        .bind(location.and_then(|l| l.altitude))
        .bind(location.and_then(|l| l.accuracy))
        .bind(Json(&req.processing_capabilities))
        .bind(&req.operating_system)
        .bind(&req.firmware_version)
        .bind(&req.ip_address)
        .bind(&req.mac_address)
        .bind(req.connection_type.as_str())
        .bind(req.status.as_str())
        .bind(Json(&req.deployed_models))
        .bind(req.configuration.clone().unwrap_or_else(empty))
        .bind(req.metadata.clone().unwrap_or_else(empty))
        .fetch_one(&self.pool)
        .await;

        timer.record();
        result
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<EdgeDeviceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_edge_device_by_id");
        let result = sqlx::query_as::<_, EdgeDeviceEntity>(&format!(
            "SELECT {EDGE_COLUMNS} FROM edge_devices e WHERE e.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List gateways, newest first. `owner_id = None` lists every gateway.
    pub async fn list(&self, owner_id: Option<Uuid>) -> Result<Vec<EdgeDeviceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_edge_devices");
        let result = sqlx::query_as::<_, EdgeDeviceEntity>(&format!(
            r#"
            SELECT {EDGE_COLUMNS} FROM edge_devices e
            WHERE ($1::uuid IS NULL OR e.owner_id = $1)
            ORDER BY e.created_at DESC, e.id DESC
            "#
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Apply a partial update. Returns `None` if the gateway does not exist.
    pub async fn update(
        &self,
        id: Uuid,
        req: &UpdateEdgeDeviceRequest,
    ) -> Result<Option<EdgeDeviceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_edge_device");
        let location = req.location.as_ref();

        let result = sqlx::query_as::<_, EdgeDeviceEntity>(&format!(
            r#"
            UPDATE edge_devices AS e SET
                name = COALESCE($2, e.name),
                field_id = COALESCE($3, e.field_id),
                location = CASE
                    WHEN $4::float8 IS NULL THEN e.location
                    ELSE ST_SetSRID(ST_MakePoint($4, $5), 4326)::geography
                END,
                altitude = CASE WHEN $4::float8 IS NULL THEN e.altitude ELSE $6 END,
                accuracy = CASE WHEN $4::float8 IS NULL THEN e.accuracy ELSE $7 END,
                processing_capabilities = COALESCE($8, e.processing_capabilities),
                operating_system = COALESCE($9, e.operating_system),
                firmware_version = COALESCE($10, e.firmware_version),
                ip_address = COALESCE($11, e.ip_address),
                mac_address = COALESCE($12, e.mac_address),
                connection_type = COALESCE($13, e.connection_type),
                status = COALESCE($14, e.status),
                last_connected = COALESCE($15, e.last_connected),
                deployed_models = COALESCE($16, e.deployed_models),
                configuration = COALESCE($17, e.configuration),
                metadata = COALESCE($18, e.metadata)
            WHERE e.id = $1
            RETURNING {EDGE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&req.name)
        .bind(req.field_id)
        .bind(location.map(|l| l.longitude))
        .bind(location.map(|l| l.latitude))
        .bind(location.and_then(|l| l.altitude))
        .bind(location.and_then(|l| l.accuracy))
        .bind(req.processing_capabilities.as_ref().map(Json))
        .bind(&req.operating_system)
        .bind(&req.firmware_version)
        .bind(&req.ip_address)
        .bind(&req.mac_address)
        .bind(req.connection_type.map(|c| c.as_str()))
        .bind(req.status.map(|s| s.as_str()))
        .bind(req.last_connected)
        .bind(req.deployed_models.as_ref().map(Json))
        .bind(&req.configuration)
        .bind(&req.metadata)
        .fetch_optional(&self.pool)
        .await;

        timer.record();
        result
    }

    /// Replace the set of devices fronted by a gateway.
    ///
    /// Returns `None` if the gateway does not exist. An unknown device id
    /// fails the foreign key and nothing changes.
    pub async fn set_connected_devices(
        &self,
        id: Uuid,
        device_ids: &[Uuid],
    ) -> Result<Option<EdgeDeviceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("set_edge_connected_devices");
        let mut tx = self.pool.begin().await?;

        let exists: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM edge_devices WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Ok(None);
        }

        sqlx::query("DELETE FROM edge_device_connections WHERE edge_device_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO edge_device_connections (edge_device_id, device_id)
            SELECT $1, d FROM UNNEST($2::uuid[]) AS d
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(id)
        .bind(device_ids)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE edge_devices SET updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let entity = sqlx::query_as::<_, EdgeDeviceEntity>(&format!(
            "SELECT {EDGE_COLUMNS} FROM edge_devices e WHERE e.id = $1"
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(Some(entity))
    }

    /// Delete a gateway and its connection rows.
    pub async fn delete(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_edge_device");
        let result = sqlx::query("DELETE FROM edge_devices WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected())
    }
}
