//! Reading entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::reading::{ReadingAlert, ReadingQuality, ReadingType, ReadingValue};
use domain::models::GeoPoint;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the readings table.
///
/// Numeric readings live in `numeric_value`; media and free-form readings
/// live in `payload`. Location is optional and read via ST_Y/ST_X.
#[derive(Debug, Clone, FromRow)]
pub struct ReadingEntity {
    pub id: Uuid,
    pub device_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub reading_type: String,
    pub numeric_value: Option<f64>,
    pub payload: Option<serde_json::Value>,
    pub unit: Option<String>,
    pub quality: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub field_id: Option<Uuid>,
    pub crop_id: Option<Uuid>,
    pub metadata: serde_json::Value,
    pub alerts: Json<Vec<ReadingAlert>>,
    pub created_at: DateTime<Utc>,
}

impl ReadingEntity {
    /// Convert to domain model. Fails only on rows whose stored value does not
    /// match their type tag.
    pub fn into_domain(self) -> Result<domain::models::Reading, sqlx::Error> {
        let reading_type: ReadingType = self
            .reading_type
            .parse()
            .map_err(|e: String| sqlx::Error::Decode(e.into()))?;
        let value = ReadingValue::from_stored(reading_type, self.numeric_value, self.payload)
            .map_err(|e| sqlx::Error::Decode(e.into()))?;

        let location = match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
            _ => None,
        };

        Ok(domain::models::Reading {
            id: self.id,
            device_id: self.device_id,
            timestamp: self.timestamp,
            value,
            unit: self.unit,
            quality: self.quality.parse().unwrap_or(ReadingQuality::Invalid),
            location,
            field_id: self.field_id,
            crop_id: self.crop_id,
            metadata: self.metadata,
            alerts: self.alerts.0,
            created_at: self.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_entity(reading_type: &str) -> ReadingEntity {
        ReadingEntity {
            id: Uuid::new_v4(),
            device_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            reading_type: reading_type.to_string(),
            numeric_value: Some(34.5),
            payload: None,
            unit: Some("%".to_string()),
            quality: "good".to_string(),
            latitude: Some(18.5),
            longitude: Some(73.8),
            field_id: None,
            crop_id: None,
            metadata: serde_json::json!({}),
            alerts: Json(vec![]),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_numeric_reading_to_domain() {
        let reading = create_test_entity("soil_moisture").into_domain().unwrap();
        assert_eq!(reading.value, ReadingValue::SoilMoisture(34.5));
        assert_eq!(reading.quality, ReadingQuality::Good);
        assert_eq!(reading.location.unwrap().latitude, 18.5);
    }

    #[test]
    fn test_media_reading_to_domain() {
        let mut entity = create_test_entity("image");
        entity.numeric_value = None;
        entity.payload = Some(serde_json::json!({"url": "https://cdn.example.com/leaf.jpg"}));
        let reading = entity.into_domain().unwrap();
        assert!(matches!(reading.value, ReadingValue::Image(ref m) if m.url.ends_with("leaf.jpg")));
    }

    #[test]
    fn test_mismatched_row_is_decode_error() {
        let mut entity = create_test_entity("video");
        entity.payload = None;
        assert!(matches!(entity.into_domain(), Err(sqlx::Error::Decode(_))));
    }

    #[test]
    fn test_missing_location() {
        let mut entity = create_test_entity("temperature");
        entity.latitude = None;
        assert!(entity.into_domain().unwrap().location.is_none());
    }
}
