//! Sensor reading domain model.
//!
//! A reading's payload depends on its type: most sensors report a single
//! number, cameras report a media reference, and `other` carries arbitrary
//! JSON. [`ReadingValue`] makes that a closed set so a soil pH reading can
//! never carry an image URL.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::geo::GeoPoint;

/// Tolerated clock skew for reading timestamps reported by devices.
pub const MAX_FUTURE_SKEW_SECS: i64 = 300;

string_enum! {
    pub enum ReadingType: "reading type" {
        SoilMoisture => "soil_moisture",
        Temperature => "temperature",
        Humidity => "humidity",
        Rainfall => "rainfall",
        Light => "light",
        WindSpeed => "wind_speed",
        WindDirection => "wind_direction",
        SoilPh => "soil_ph",
        SoilNitrogen => "soil_nitrogen",
        SoilPhosphorus => "soil_phosphorus",
        SoilPotassium => "soil_potassium",
        WaterLevel => "water_level",
        Image => "image",
        Video => "video",
        Other => "other",
    }
}

string_enum! {
    #[derive(Default)]
    pub enum ReadingQuality: "reading quality" {
        Excellent => "excellent",
        #[default]
        Good => "good",
        Fair => "fair",
        Poor => "poor",
        Invalid => "invalid",
    }
}

string_enum! {
    pub enum ReadingAlertKind: "reading alert type" {
        Warning => "warning",
        Critical => "critical",
        Information => "information",
    }
}

string_enum! {
    #[derive(Default)]
    pub enum ReadingAlertStatus: "reading alert status" {
        #[default]
        Active => "active",
        Acknowledged => "acknowledged",
        Resolved => "resolved",
    }
}

/// Location of a captured image or video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MediaRef {
    #[validate(url(message = "Media url must be a valid URL"))]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// Reading payload keyed by reading type.
///
/// Serialized adjacently as `{"readingType": "...", "value": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "readingType", content = "value", rename_all = "snake_case")]
pub enum ReadingValue {
    /// Volumetric water content, percent.
    SoilMoisture(f64),
    Temperature(f64),
    /// Relative humidity, percent.
    Humidity(f64),
    Rainfall(f64),
    Light(f64),
    WindSpeed(f64),
    /// Degrees from north.
    WindDirection(f64),
    SoilPh(f64),
    SoilNitrogen(f64),
    SoilPhosphorus(f64),
    SoilPotassium(f64),
    WaterLevel(f64),
    Image(MediaRef),
    Video(MediaRef),
    Other(serde_json::Value),
}

fn value_error(message: String) -> ValidationError {
    let mut err = ValidationError::new("reading_value");
    err.message = Some(message.into());
    err
}

impl ReadingValue {
    pub fn reading_type(&self) -> ReadingType {
        match self {
            ReadingValue::SoilMoisture(_) => ReadingType::SoilMoisture,
            ReadingValue::Temperature(_) => ReadingType::Temperature,
            ReadingValue::Humidity(_) => ReadingType::Humidity,
            ReadingValue::Rainfall(_) => ReadingType::Rainfall,
            ReadingValue::Light(_) => ReadingType::Light,
            ReadingValue::WindSpeed(_) => ReadingType::WindSpeed,
            ReadingValue::WindDirection(_) => ReadingType::WindDirection,
            ReadingValue::SoilPh(_) => ReadingType::SoilPh,
            ReadingValue::SoilNitrogen(_) => ReadingType::SoilNitrogen,
            ReadingValue::SoilPhosphorus(_) => ReadingType::SoilPhosphorus,
            ReadingValue::SoilPotassium(_) => ReadingType::SoilPotassium,
            ReadingValue::WaterLevel(_) => ReadingType::WaterLevel,
            ReadingValue::Image(_) => ReadingType::Image,
            ReadingValue::Video(_) => ReadingType::Video,
            ReadingValue::Other(_) => ReadingType::Other,
        }
    }

    /// Numeric payload, stored in the `numeric_value` column.
    pub fn numeric(&self) -> Option<f64> {
        match self {
            ReadingValue::SoilMoisture(v)
            | ReadingValue::Temperature(v)
            | ReadingValue::Humidity(v)
            | ReadingValue::Rainfall(v)
            | ReadingValue::Light(v)
            | ReadingValue::WindSpeed(v)
            | ReadingValue::WindDirection(v)
            | ReadingValue::SoilPh(v)
            | ReadingValue::SoilNitrogen(v)
            | ReadingValue::SoilPhosphorus(v)
            | ReadingValue::SoilPotassium(v)
            | ReadingValue::WaterLevel(v) => Some(*v),
            _ => None,
        }
    }

    /// Structured payload, stored in the `payload` JSONB column.
    pub fn payload(&self) -> Option<serde_json::Value> {
        match self {
            ReadingValue::Image(media) | ReadingValue::Video(media) => {
                serde_json::to_value(media).ok()
            }
            ReadingValue::Other(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// Builds and range-checks a value from its type tag and raw JSON.
    pub fn from_parts(
        reading_type: ReadingType,
        raw: serde_json::Value,
    ) -> Result<Self, ValidationError> {
        let number = |raw: &serde_json::Value| -> Result<f64, ValidationError> {
            raw.as_f64().filter(|v| v.is_finite()).ok_or_else(|| {
                value_error(format!("Value for {} must be a number", reading_type))
            })
        };
        let in_range = |v: f64, min: f64, max: f64| -> Result<f64, ValidationError> {
            if (min..=max).contains(&v) {
                Ok(v)
            } else {
                Err(value_error(format!(
                    "Value for {} must be between {} and {}",
                    reading_type, min, max
                )))
            }
        };
        let non_negative = |v: f64| -> Result<f64, ValidationError> {
            if v >= 0.0 {
                Ok(v)
            } else {
                Err(value_error(format!(
                    "Value for {} must be non-negative",
                    reading_type
                )))
            }
        };
        let media = |raw: serde_json::Value| -> Result<MediaRef, ValidationError> {
            let media: MediaRef = serde_json::from_value(raw).map_err(|_| {
                value_error(format!(
                    "Value for {} must be an object with a url",
                    reading_type
                ))
            })?;
            media.validate().map_err(|_| {
                value_error(format!("Value for {} must have a valid url", reading_type))
            })?;
            Ok(media)
        };

        let value = match reading_type {
            ReadingType::SoilMoisture => {
                ReadingValue::SoilMoisture(in_range(number(&raw)?, 0.0, 100.0)?)
            }
            ReadingType::Temperature => ReadingValue::Temperature(number(&raw)?),
            ReadingType::Humidity => ReadingValue::Humidity(in_range(number(&raw)?, 0.0, 100.0)?),
            ReadingType::Rainfall => ReadingValue::Rainfall(non_negative(number(&raw)?)?),
            ReadingType::Light => ReadingValue::Light(non_negative(number(&raw)?)?),
            ReadingType::WindSpeed => ReadingValue::WindSpeed(non_negative(number(&raw)?)?),
            ReadingType::WindDirection => {
                ReadingValue::WindDirection(in_range(number(&raw)?, 0.0, 360.0)?)
            }
            ReadingType::SoilPh => ReadingValue::SoilPh(in_range(number(&raw)?, 0.0, 14.0)?),
            ReadingType::SoilNitrogen => ReadingValue::SoilNitrogen(non_negative(number(&raw)?)?),
            ReadingType::SoilPhosphorus => {
                ReadingValue::SoilPhosphorus(non_negative(number(&raw)?)?)
            }
            ReadingType::SoilPotassium => {
                ReadingValue::SoilPotassium(non_negative(number(&raw)?)?)
            }
            ReadingType::WaterLevel => ReadingValue::WaterLevel(number(&raw)?),
            ReadingType::Image => ReadingValue::Image(media(raw)?),
            ReadingType::Video => ReadingValue::Video(media(raw)?),
            ReadingType::Other => {
                if raw.is_null() {
                    return Err(value_error("Value is required".to_string()));
                }
                ReadingValue::Other(raw)
            }
        };

        Ok(value)
    }

    /// Rebuilds a value from its stored columns without range checks.
    pub fn from_stored(
        reading_type: ReadingType,
        numeric: Option<f64>,
        payload: Option<serde_json::Value>,
    ) -> Result<Self, String> {
        let missing = || format!("Stored {} reading has no value", reading_type);
        let media = |payload: Option<serde_json::Value>| -> Result<MediaRef, String> {
            serde_json::from_value(payload.ok_or_else(missing)?).map_err(|e| e.to_string())
        };

        Ok(match reading_type {
            ReadingType::SoilMoisture => ReadingValue::SoilMoisture(numeric.ok_or_else(missing)?),
            ReadingType::Temperature => ReadingValue::Temperature(numeric.ok_or_else(missing)?),
            ReadingType::Humidity => ReadingValue::Humidity(numeric.ok_or_else(missing)?),
            ReadingType::Rainfall => ReadingValue::Rainfall(numeric.ok_or_else(missing)?),
            ReadingType::Light => ReadingValue::Light(numeric.ok_or_else(missing)?),
            ReadingType::WindSpeed => ReadingValue::WindSpeed(numeric.ok_or_else(missing)?),
            ReadingType::WindDirection => ReadingValue::WindDirection(numeric.ok_or_else(missing)?),
            ReadingType::SoilPh => ReadingValue::SoilPh(numeric.ok_or_else(missing)?),
            ReadingType::SoilNitrogen => ReadingValue::SoilNitrogen(numeric.ok_or_else(missing)?),
            ReadingType::SoilPhosphorus => {
                ReadingValue::SoilPhosphorus(numeric.ok_or_else(missing)?)
            }
            ReadingType::SoilPotassium => ReadingValue::SoilPotassium(numeric.ok_or_else(missing)?),
            ReadingType::WaterLevel => ReadingValue::WaterLevel(numeric.ok_or_else(missing)?),
            ReadingType::Image => ReadingValue::Image(media(payload)?),
            ReadingType::Video => ReadingValue::Video(media(payload)?),
            ReadingType::Other => ReadingValue::Other(payload.ok_or_else(missing)?),
        })
    }
}

/// Alert note attached to a single reading by the reporting device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReadingAlert {
    #[serde(rename = "type")]
    pub kind: ReadingAlertKind,

    #[validate(length(min = 1, max = 500, message = "Alert message must be 1-500 characters"))]
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<serde_json::Value>,

    #[serde(default)]
    pub status: ReadingAlertStatus,
}

/// A stored sensor reading.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub id: Uuid,
    pub device_id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub value: ReadingValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub quality: ReadingQuality,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_id: Option<Uuid>,
    pub metadata: serde_json::Value,
    pub alerts: Vec<ReadingAlert>,
    pub created_at: DateTime<Utc>,
}

/// Validated reading ready for insertion, with device defaults applied.
#[derive(Debug, Clone)]
pub struct NewReading {
    pub device_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub value: ReadingValue,
    pub unit: Option<String>,
    pub quality: ReadingQuality,
    pub location: Option<GeoPoint>,
    pub field_id: Option<Uuid>,
    pub crop_id: Option<Uuid>,
    pub metadata: serde_json::Value,
    pub alerts: Vec<ReadingAlert>,
}

fn validate_not_future(timestamp: &DateTime<Utc>) -> Result<(), ValidationError> {
    if *timestamp <= Utc::now() + Duration::seconds(MAX_FUTURE_SKEW_SECS) {
        Ok(())
    } else {
        let mut err = ValidationError::new("timestamp_future");
        err.message = Some("Timestamp cannot be in the future".into());
        Err(err)
    }
}

/// Request payload for a single reading.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReadingRequest {
    pub device_id: Uuid,

    #[validate(custom(function = "validate_not_future"))]
    pub timestamp: Option<DateTime<Utc>>,

    pub reading_type: ReadingType,

    pub value: serde_json::Value,

    #[validate(length(max = 20, message = "Unit must be at most 20 characters"))]
    pub unit: Option<String>,

    #[serde(default)]
    pub quality: ReadingQuality,

    #[validate(nested)]
    pub location: Option<GeoPoint>,

    pub field_id: Option<Uuid>,

    pub crop_id: Option<Uuid>,

    pub metadata: Option<serde_json::Value>,

    #[serde(default)]
    #[validate(nested)]
    pub alerts: Vec<ReadingAlert>,
}

impl CreateReadingRequest {
    /// Converts into an insertable reading, falling back to the device's
    /// location and field when the request omits them.
    pub fn into_new_reading(
        self,
        device_location: GeoPoint,
        device_field: Option<Uuid>,
    ) -> Result<NewReading, ValidationError> {
        let value = ReadingValue::from_parts(self.reading_type, self.value)?;

        Ok(NewReading {
            device_id: self.device_id,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            value,
            unit: self.unit,
            quality: self.quality,
            location: Some(self.location.unwrap_or(device_location)),
            field_id: self.field_id.or(device_field),
            crop_id: self.crop_id,
            metadata: self.metadata.unwrap_or_else(|| serde_json::json!({})),
            alerts: self.alerts,
        })
    }
}

/// Request payload for batch ingestion.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BatchReadingsRequest {
    #[validate(nested)]
    pub readings: Vec<CreateReadingRequest>,
}

/// Query parameters for reading listings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListReadingsQuery {
    pub device_id: Option<Uuid>,
    pub field_id: Option<Uuid>,
    pub reading_type: Option<ReadingType>,
    /// Inclusive lower bound on timestamp
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on timestamp
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub cursor: Option<String>,
}

/// Cursor metadata for reading listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorPagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

/// Response for reading listings, newest first.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListReadingsResponse {
    pub readings: Vec<Reading>,
    pub pagination: CursorPagination,
}

/// Response for batch ingestion.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReadingsResponse {
    pub inserted: usize,
    pub readings: Vec<Reading>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_parts_numeric() {
        let value = ReadingValue::from_parts(ReadingType::SoilMoisture, json!(34.5)).unwrap();
        assert_eq!(value, ReadingValue::SoilMoisture(34.5));
        assert_eq!(value.reading_type(), ReadingType::SoilMoisture);
        assert_eq!(value.numeric(), Some(34.5));
        assert!(value.payload().is_none());
    }

    #[test]
    fn test_from_parts_integer_json_is_accepted() {
        let value = ReadingValue::from_parts(ReadingType::Temperature, json!(21)).unwrap();
        assert_eq!(value, ReadingValue::Temperature(21.0));
    }

    #[test]
    fn test_from_parts_rejects_out_of_range() {
        assert!(ReadingValue::from_parts(ReadingType::SoilPh, json!(15.0)).is_err());
        assert!(ReadingValue::from_parts(ReadingType::Humidity, json!(-3)).is_err());
        assert!(ReadingValue::from_parts(ReadingType::WindDirection, json!(400)).is_err());
        assert!(ReadingValue::from_parts(ReadingType::Rainfall, json!(-0.1)).is_err());
    }

    #[test]
    fn test_from_parts_rejects_wrong_shape() {
        let err = ReadingValue::from_parts(ReadingType::Temperature, json!("hot")).unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "Value for temperature must be a number"
        );
        assert!(ReadingValue::from_parts(ReadingType::Image, json!(12)).is_err());
        assert!(ReadingValue::from_parts(ReadingType::Other, serde_json::Value::Null).is_err());
    }

    #[test]
    fn test_from_parts_media() {
        let value = ReadingValue::from_parts(
            ReadingType::Image,
            json!({"url": "https://cdn.example.com/f/1.jpg", "format": "jpeg"}),
        )
        .unwrap();
        assert_eq!(value.reading_type(), ReadingType::Image);
        assert_eq!(
            value.payload().unwrap()["url"],
            "https://cdn.example.com/f/1.jpg"
        );
        assert!(value.numeric().is_none());

        assert!(ReadingValue::from_parts(ReadingType::Video, json!({"url": "nope"})).is_err());
    }

    #[test]
    fn test_from_stored_matches_columns() {
        let value = ReadingValue::from_stored(ReadingType::SoilPh, Some(6.8), None).unwrap();
        assert_eq!(value, ReadingValue::SoilPh(6.8));

        let value =
            ReadingValue::from_stored(ReadingType::Other, None, Some(json!({"raw": [1, 2]})))
                .unwrap();
        assert_eq!(value, ReadingValue::Other(json!({"raw": [1, 2]})));

        assert!(ReadingValue::from_stored(ReadingType::Light, None, None).is_err());
    }

    #[test]
    fn test_reading_serializes_tag_and_value_inline() {
        let now = Utc::now();
        let reading = Reading {
            id: Uuid::new_v4(),
            device_id: Uuid::new_v4(),
            timestamp: now,
            value: ReadingValue::WindSpeed(12.5),
            unit: Some("km/h".into()),
            quality: ReadingQuality::Good,
            location: None,
            field_id: None,
            crop_id: None,
            metadata: json!({}),
            alerts: vec![],
            created_at: now,
        };

        let json = serde_json::to_value(&reading).unwrap();
        assert_eq!(json["readingType"], "wind_speed");
        assert_eq!(json["value"], 12.5);
        assert_eq!(json["quality"], "good");
        assert!(json.get("location").is_none());
    }

    #[test]
    fn test_create_request_defaults_from_device() {
        let field = Uuid::new_v4();
        let req: CreateReadingRequest = serde_json::from_value(json!({
            "deviceId": Uuid::new_v4(),
            "readingType": "humidity",
            "value": 61.0,
            "alerts": [{"type": "warning", "message": "Humidity rising"}]
        }))
        .unwrap();
        assert!(req.validate().is_ok());

        let new = req
            .into_new_reading(GeoPoint::new(12.0, 77.0), Some(field))
            .unwrap();
        assert_eq!(new.value, ReadingValue::Humidity(61.0));
        assert_eq!(new.quality, ReadingQuality::Good);
        assert_eq!(new.location, Some(GeoPoint::new(12.0, 77.0)));
        assert_eq!(new.field_id, Some(field));
        assert_eq!(new.alerts[0].status, ReadingAlertStatus::Active);
    }

    #[test]
    fn test_create_request_rejects_future_timestamp() {
        let req: CreateReadingRequest = serde_json::from_value(json!({
            "deviceId": Uuid::new_v4(),
            "timestamp": Utc::now() + Duration::hours(2),
            "readingType": "temperature",
            "value": 20.0
        }))
        .unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("timestamp"));
    }
}
