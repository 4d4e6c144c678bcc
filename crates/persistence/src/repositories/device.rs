//! Device repository for database operations.

use chrono::{DateTime, Utc};
use domain::models::device::{
    CreateDeviceRequest, DeviceStatus, DeviceType, UpdateDeviceRequest,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{DeviceEntity, NearbyDeviceEntity};
use crate::metrics::QueryTimer;

pub(crate) const DEVICE_COLUMNS: &str = r#"
    id, device_id, name, device_type, manufacturer, model, firmware_version,
    owner_id, field_id,
    ST_Y(location::geometry) AS latitude,
    ST_X(location::geometry) AS longitude,
    altitude, accuracy,
    installation_date, last_maintenance, next_maintenance,
    battery_level, power_source, connection_type, ip_address, mac_address,
    status, last_connected, configuration, calibration_data, metadata,
    created_at, updated_at
"#;

/// Filters for device listings. `owner_id = None` means every owner.
#[derive(Debug, Clone, Default)]
pub struct DeviceFilter {
    pub owner_id: Option<Uuid>,
    pub field_id: Option<Uuid>,
    pub device_type: Option<DeviceType>,
    pub status: Option<DeviceStatus>,
}

/// Repository for device-related database operations.
#[derive(Clone)]
pub struct DeviceRepository {
    pool: PgPool,
}

impl DeviceRepository {
    /// Creates a new DeviceRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register a device. A taken `device_id` surfaces as a unique violation.
    ///
    /// Uses PostGIS ST_SetSRID and ST_MakePoint to create the geography point.
    pub async fn create(
        &self,
        owner_id: Uuid,
        req: &CreateDeviceRequest,
    ) -> Result<DeviceEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_device");
        let empty = || serde_json::json!({});

        let result = sqlx::query_as::<_, DeviceEntity>(&format!(
            r#"
            INSERT INTO devices (
                device_id, name, device_type, manufacturer, model, firmware_version,
                owner_id, field_id, location, altitude, accuracy,
                installation_date, next_maintenance, battery_level,
                power_source, connection_type, ip_address, mac_address, status,
                configuration, calibration_data, metadata
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8,
                ST_SetSRID(ST_MakePoint($9, $10), 4326)::geography,
                $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23
            )
            RETURNING {DEVICE_COLUMNS}
            "#
        ))
        .bind(&req.device_id)
        .bind(&req.name)
        .bind(req.device_type.as_str())
        .bind(&req.manufacturer)
        .bind(&req.model)
        .bind(&req.firmware_version)
        .bind(owner_id)
        .bind(req.field_id)
        .bind(req.location.longitude) // MakePoint takes (x=lon, y=lat)
        .bind(req.location.latitude)
        .bind(req.location.altitude)
        .bind(req.location.accuracy)
        .bind(req.installation_date)
        .bind(req.next_maintenance)
        .bind(req.battery_level)
        .bind(req.power_source.as_str())
        .bind(req.connection_type.as_str())
        .bind(&req.ip_address)
        .bind(&req.mac_address)
        .bind(req.status.as_str())
        .bind(req.configuration.clone().unwrap_or_else(empty))
        .bind(req.calibration_data.clone().unwrap_or_else(empty))
        .bind(req.metadata.clone().unwrap_or_else(empty))
        .fetch_one(&self.pool)
        .await;

        timer.record();
        result
    }

    /// Find a device by its internal UUID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<DeviceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_device_by_id");
        let result = sqlx::query_as::<_, DeviceEntity>(&format!(
            "SELECT {DEVICE_COLUMNS} FROM devices WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find the devices with the given ids. Missing ids are skipped.
    pub async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<DeviceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_devices_by_ids");
        let result = sqlx::query_as::<_, DeviceEntity>(&format!(
            "SELECT {DEVICE_COLUMNS} FROM devices WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List devices matching the filter, newest first.
    pub async fn list(&self, filter: &DeviceFilter) -> Result<Vec<DeviceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_devices");
        let result = sqlx::query_as::<_, DeviceEntity>(&format!(
            r#"
            SELECT {DEVICE_COLUMNS} FROM devices
            WHERE ($1::uuid IS NULL OR owner_id = $1)
              AND ($2::uuid IS NULL OR field_id = $2)
              AND ($3::text IS NULL OR device_type = $3)
              AND ($4::text IS NULL OR status = $4)
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(filter.owner_id)
        .bind(filter.field_id)
        .bind(filter.device_type.map(|t| t.as_str()))
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Devices within `radius_meters` of a point, nearest first.
    pub async fn find_nearby(
        &self,
        owner_id: Option<Uuid>,
        latitude: f64,
        longitude: f64,
        radius_meters: f64,
    ) -> Result<Vec<NearbyDeviceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_nearby_devices");
        let result = sqlx::query_as::<_, NearbyDeviceEntity>(&format!(
            r#"
            WITH origin AS (
                SELECT ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography AS point
            )
            SELECT {DEVICE_COLUMNS},
                   ST_Distance(location, origin.point) AS distance_meters
            FROM devices, origin
            WHERE ST_DWithin(location, origin.point, $3)
              AND ($4::uuid IS NULL OR owner_id = $4)
            ORDER BY distance_meters ASC, id ASC
            "#
        ))
        .bind(longitude)
        .bind(latitude)
        .bind(radius_meters)
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Apply a partial update. Absent fields keep their stored value.
    /// Returns `None` if the device does not exist.
    pub async fn update(
        &self,
        id: Uuid,
        req: &UpdateDeviceRequest,
    ) -> Result<Option<DeviceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_device");
        let location = req.location.as_ref();

        let result = sqlx::query_as::<_, DeviceEntity>(&format!(
            r#"
            UPDATE devices SET
                name = COALESCE($2, name),
                manufacturer = COALESCE($3, manufacturer),
                model = COALESCE($4, model),
                firmware_version = COALESCE($5, firmware_version),
                field_id = COALESCE($6, field_id),
                location = CASE
                    WHEN $7::float8 IS NULL THEN location
                    ELSE ST_SetSRID(ST_MakePoint($7, $8), 4326)::geography
                END,
                altitude = CASE WHEN $7::float8 IS NULL THEN altitude ELSE $9 END,
                accuracy = CASE WHEN $7::float8 IS NULL THEN accuracy ELSE $10 END,
                battery_level = COALESCE($11, battery_level),
                power_source = COALESCE($12, power_source),
                connection_type = COALESCE($13, connection_type),
                ip_address = COALESCE($14, ip_address),
                mac_address = COALESCE($15, mac_address),
                installation_date = COALESCE($16, installation_date),
                next_maintenance = COALESCE($17, next_maintenance),
                configuration = COALESCE($18, configuration),
                calibration_data = COALESCE($19, calibration_data),
                metadata = COALESCE($20, metadata)
            WHERE id = $1
            RETURNING {DEVICE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&req.name)
        .bind(&req.manufacturer)
        .bind(&req.model)
        .bind(&req.firmware_version)
        .bind(req.field_id)
        .bind(location.map(|l| l.longitude))
        .bind(location.map(|l| l.latitude))
        .bind(location.and_then(|l| l.altitude))
        .bind(location.and_then(|l| l.accuracy))
        .bind(req.battery_level)
        .bind(req.power_source.map(|p| p.as_str()))
        .bind(req.connection_type.map(|c| c.as_str()))
        .bind(&req.ip_address)
        .bind(&req.mac_address)
        .bind(req.installation_date)
        .bind(req.next_maintenance)
        .bind(&req.configuration)
        .bind(&req.calibration_data)
        .bind(&req.metadata)
        .fetch_optional(&self.pool)
        .await;

        timer.record();
        result
    }

    /// Set the lifecycle status. Returns `None` if the device does not exist.
    pub async fn update_status(
        &self,
        id: Uuid,
        status: DeviceStatus,
    ) -> Result<Option<DeviceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_device_status");
        let result = sqlx::query_as::<_, DeviceEntity>(&format!(
            r#"
            UPDATE devices SET status = $2
            WHERE id = $1
            RETURNING {DEVICE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Record that the device was heard from at `timestamp`. Never moves
    /// `last_connected` backwards.
    pub async fn touch_last_connected(
        conn: &mut sqlx::PgConnection,
        id: Uuid,
        timestamp: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE devices
            SET last_connected = GREATEST(COALESCE(last_connected, $2), $2)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(timestamp)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Delete a device; readings, maintenance history and gateway links go
    /// with it and alerts lose their device reference.
    /// Returns the number of rows deleted.
    pub async fn delete(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_device");
        let result = sqlx::query("DELETE FROM devices WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected())
    }
}
