//! Reading repository for database operations.

use chrono::{DateTime, Utc};
use domain::models::reading::{NewReading, ReadingType};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::device::DeviceRepository;
use crate::entities::ReadingEntity;
use crate::metrics::QueryTimer;

const READING_COLUMNS: &str = r#"
    r.id, r.device_id, r.timestamp, r.reading_type, r.numeric_value, r.payload,
    r.unit, r.quality,
    ST_Y(r.location::geometry) AS latitude,
    ST_X(r.location::geometry) AS longitude,
    r.field_id, r.crop_id, r.metadata, r.alerts, r.created_at
"#;

/// Query parameters for reading listings, newest first.
#[derive(Debug, Clone, Default)]
pub struct ReadingQuery {
    /// Restrict to devices owned by this user; `None` for admins.
    pub owner_id: Option<Uuid>,
    pub device_id: Option<Uuid>,
    pub field_id: Option<Uuid>,
    pub reading_type: Option<ReadingType>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub cursor_timestamp: Option<DateTime<Utc>>,
    pub cursor_id: Option<Uuid>,
    pub limit: i64,
}

/// Repository for sensor reading database operations.
#[derive(Clone)]
pub struct ReadingRepository {
    pool: PgPool,
}

impl ReadingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_with(
        conn: &mut sqlx::PgConnection,
        reading: &NewReading,
    ) -> Result<ReadingEntity, sqlx::Error> {
        let location = reading.location.as_ref();
        sqlx::query_as::<_, ReadingEntity>(&format!(
            r#"
            INSERT INTO readings AS r (
                device_id, timestamp, reading_type, numeric_value, payload, unit, quality,
                location, field_id, crop_id, metadata, alerts
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7,
                CASE WHEN $8::float8 IS NULL THEN NULL
                     ELSE ST_SetSRID(ST_MakePoint($8, $9), 4326)::geography END,
                $10, $11, $12, $13
            )
            RETURNING {READING_COLUMNS}
            "#
        ))
        .bind(reading.device_id)
        .bind(reading.timestamp)
        .bind(reading.value.reading_type().as_str())
        .bind(reading.value.numeric())
        .bind(reading.value.payload())
        .bind(&reading.unit)
        .bind(reading.quality.as_str())
        .bind(location.map(|l| l.longitude)) // MakePoint takes (x=lon, y=lat)
        .bind(location.map(|l| l.latitude))
        .bind(reading.field_id)
        .bind(reading.crop_id)
        .bind(&reading.metadata)
        .bind(Json(&reading.alerts))
        .fetch_one(&mut *conn)
        .await
    }

    /// Insert one reading and advance the device's `last_connected` in the
    /// same transaction.
    pub async fn insert(&self, reading: &NewReading) -> Result<ReadingEntity, sqlx::Error> {
        let timer = QueryTimer::new("insert_reading");
        let mut tx = self.pool.begin().await?;

        let entity = Self::insert_with(&mut *tx, reading).await?;
        DeviceRepository::touch_last_connected(&mut *tx, reading.device_id, reading.timestamp)
            .await?;

        tx.commit().await?;
        timer.record();
        Ok(entity)
    }

    /// Insert a batch atomically: either every reading is stored or none is.
    pub async fn insert_batch(
        &self,
        readings: &[NewReading],
    ) -> Result<Vec<ReadingEntity>, sqlx::Error> {
        let timer = QueryTimer::new("insert_readings_batch");
        let mut tx = self.pool.begin().await?;
        let mut inserted = Vec::with_capacity(readings.len());

        for reading in readings {
            inserted.push(Self::insert_with(&mut *tx, reading).await?);
            DeviceRepository::touch_last_connected(&mut *tx, reading.device_id, reading.timestamp)
                .await?;
        }

        tx.commit().await?;
        timer.record_rows(inserted.len());
        Ok(inserted)
    }

    /// Page through readings newest first with a `(timestamp, id)` keyset.
    ///
    /// Returns `(readings, has_more)`.
    pub async fn list(
        &self,
        query: &ReadingQuery,
    ) -> Result<(Vec<ReadingEntity>, bool), sqlx::Error> {
        let timer = QueryTimer::new("list_readings");

        // Fetch limit + 1 to determine if more results exist
        let fetch_limit = query.limit + 1;

        let mut rows = sqlx::query_as::<_, ReadingEntity>(&format!(
            r#"
            SELECT {READING_COLUMNS}
            FROM readings r
            JOIN devices d ON d.id = r.device_id
            WHERE ($1::uuid IS NULL OR d.owner_id = $1)
              AND ($2::uuid IS NULL OR r.device_id = $2)
              AND ($3::uuid IS NULL OR r.field_id = $3)
              AND ($4::text IS NULL OR r.reading_type = $4)
              AND ($5::timestamptz IS NULL OR r.timestamp >= $5)
              AND ($6::timestamptz IS NULL OR r.timestamp <= $6)
              AND ($7::timestamptz IS NULL OR (r.timestamp, r.id) < ($7, $8))
            ORDER BY r.timestamp DESC, r.id DESC
            LIMIT $9
            "#
        ))
        .bind(query.owner_id)
        .bind(query.device_id)
        .bind(query.field_id)
        .bind(query.reading_type.map(|t| t.as_str()))
        .bind(query.from)
        .bind(query.to)
        .bind(query.cursor_timestamp)
        .bind(query.cursor_id.unwrap_or(Uuid::max()))
        .bind(fetch_limit)
        .fetch_all(&self.pool)
        .await?;

        timer.record();

        let has_more = rows.len() as i64 > query.limit;
        if has_more {
            rows.pop();
        }
        Ok((rows, has_more))
    }
}
