//! Geographic point shared by devices, fields, readings and weather records.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// A WGS84 point with optional altitude (metres) and horizontal accuracy (metres).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "shared::validation::validate_accuracy"))]
    pub accuracy: Option<f64>,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
            accuracy: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_point() {
        assert!(GeoPoint::new(28.61, 77.20).validate().is_ok());
    }

    #[test]
    fn test_out_of_range_point() {
        let errors = GeoPoint::new(95.0, 200.0).validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("latitude"));
        assert!(fields.contains_key("longitude"));
    }

    #[test]
    fn test_negative_accuracy() {
        let mut point = GeoPoint::new(10.0, 10.0);
        point.accuracy = Some(-1.0);
        assert!(point.validate().is_err());
    }

    #[test]
    fn test_optional_fields_omitted() {
        let json = serde_json::to_value(GeoPoint::new(1.0, 2.0)).unwrap();
        assert_eq!(json, serde_json::json!({"latitude": 1.0, "longitude": 2.0}));
    }
}
