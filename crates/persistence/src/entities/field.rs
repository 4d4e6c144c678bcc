//! Field entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::GeoPoint;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the fields table.
///
/// The location column is PostGIS GEOGRAPHY, read back through ST_Y/ST_X.
#[derive(Debug, Clone, FromRow)]
pub struct FieldEntity {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub area_hectares: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<FieldEntity> for domain::models::Field {
    fn from(entity: FieldEntity) -> Self {
        Self {
            id: entity.id,
            owner_id: entity.owner_id,
            name: entity.name,
            location: GeoPoint::new(entity.latitude, entity.longitude),
            area_hectares: entity.area_hectares,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
