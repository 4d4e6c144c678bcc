//! Field (farm parcel) domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::geo::GeoPoint;

/// A farm parcel owned by one user. Devices, readings, alerts and weather
/// records may reference it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub location: GeoPoint,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_hectares: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request payload for registering a field.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateFieldRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(nested)]
    pub location: GeoPoint,

    #[validate(custom(function = "shared::validation::validate_non_negative"))]
    pub area_hectares: Option<f64>,
}

/// Response for listing fields.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFieldsResponse {
    pub fields: Vec<Field>,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_field_request() {
        let json = r#"{
            "name": "North Paddy",
            "location": {"latitude": 21.1, "longitude": 79.0},
            "areaHectares": 4.5
        }"#;
        let req: CreateFieldRequest = serde_json::from_str(json).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.area_hectares, Some(4.5));
    }

    #[test]
    fn test_create_field_rejects_negative_area() {
        let req = CreateFieldRequest {
            name: "Plot".into(),
            location: GeoPoint::new(0.0, 0.0),
            area_hectares: Some(-2.0),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_create_field_rejects_bad_location() {
        let req = CreateFieldRequest {
            name: "Plot".into(),
            location: GeoPoint::new(91.0, 0.0),
            area_hectares: None,
        };
        assert!(req.validate().is_err());
    }
}
