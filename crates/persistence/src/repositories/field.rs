//! Field repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::FieldEntity;
use crate::metrics::QueryTimer;

const FIELD_COLUMNS: &str = r#"
    id, owner_id, name,
    ST_Y(location::geometry) AS latitude,
    ST_X(location::geometry) AS longitude,
    area_hectares, created_at, updated_at
"#;

/// Repository for field database operations.
#[derive(Clone)]
pub struct FieldRepository {
    pool: PgPool,
}

impl FieldRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a field.
    pub async fn create(
        &self,
        owner_id: Uuid,
        name: &str,
        latitude: f64,
        longitude: f64,
        area_hectares: Option<f64>,
    ) -> Result<FieldEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_field");
        let result = sqlx::query_as::<_, FieldEntity>(&format!(
            r#"
            INSERT INTO fields (owner_id, name, location, area_hectares)
            VALUES ($1, $2, ST_SetSRID(ST_MakePoint($3, $4), 4326)::geography, $5)
            RETURNING {FIELD_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(name)
        .bind(longitude) // MakePoint takes (x=lon, y=lat)
        .bind(latitude)
        .bind(area_hectares)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<FieldEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_field_by_id");
        let result = sqlx::query_as::<_, FieldEntity>(&format!(
            "SELECT {FIELD_COLUMNS} FROM fields WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List fields, newest first. `owner_id = None` lists every field.
    pub async fn list(&self, owner_id: Option<Uuid>) -> Result<Vec<FieldEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_fields");
        let result = sqlx::query_as::<_, FieldEntity>(&format!(
            r#"
            SELECT {FIELD_COLUMNS} FROM fields
            WHERE ($1::uuid IS NULL OR owner_id = $1)
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Delete a field. Returns the number of rows removed.
    pub async fn delete(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_field");
        let result = sqlx::query("DELETE FROM fields WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected())
    }
}
