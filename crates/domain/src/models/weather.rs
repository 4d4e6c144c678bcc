//! Weather snapshots, forecasts, alerts and monthly history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::geo::GeoPoint;

string_enum! {
    #[derive(Default)]
    pub enum TemperatureUnit: "temperature unit" {
        #[default]
        Celsius => "celsius",
        Fahrenheit => "fahrenheit",
    }
}

string_enum! {
    #[derive(Default)]
    pub enum PrecipitationType: "precipitation type" {
        Rain => "rain",
        Snow => "snow",
        Sleet => "sleet",
        Hail => "hail",
        #[default]
        None => "none",
    }
}

string_enum! {
    #[derive(Default)]
    pub enum PrecipitationUnit: "precipitation unit" {
        #[default]
        Mm => "mm",
        Inches => "inches",
    }
}

string_enum! {
    #[derive(Default)]
    pub enum WindUnit: "wind unit" {
        #[default]
        KmH => "km/h",
        Mph => "mph",
        MS => "m/s",
    }
}

string_enum! {
    #[derive(Default)]
    pub enum PressureUnit: "pressure unit" {
        #[default]
        HPa => "hPa",
        InHg => "inHg",
    }
}

string_enum! {
    #[derive(Default)]
    pub enum VisibilityUnit: "visibility unit" {
        #[default]
        Km => "km",
        Miles => "miles",
    }
}

string_enum! {
    pub enum WeatherSeverity: "weather alert severity" {
        Low => "Low",
        Moderate => "Moderate",
        High => "High",
        Extreme => "Extreme",
    }
}

impl WeatherSeverity {
    /// Ordinal rank used for sorting, higher is more severe.
    pub fn rank(&self) -> i32 {
        match self {
            WeatherSeverity::Low => 1,
            WeatherSeverity::Moderate => 2,
            WeatherSeverity::High => 3,
            WeatherSeverity::Extreme => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Temperature {
    pub current: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default)]
    pub unit: TemperatureUnit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Precipitation {
    #[validate(custom(function = "shared::validation::validate_non_negative"))]
    pub amount: f64,
    #[serde(default, rename = "type")]
    pub kind: PrecipitationType,
    #[serde(default)]
    pub unit: PrecipitationUnit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "shared::validation::validate_percentage"))]
    pub probability: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Wind {
    #[validate(custom(function = "shared::validation::validate_non_negative"))]
    pub speed: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "shared::validation::validate_direction"))]
    pub direction: Option<f64>,
    #[serde(default)]
    pub unit: WindUnit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pressure {
    pub value: f64,
    #[serde(default)]
    pub unit: PressureUnit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Visibility {
    #[validate(custom(function = "shared::validation::validate_non_negative"))]
    pub value: f64,
    #[serde(default)]
    pub unit: VisibilityUnit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrecipitationOutlook {
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
}

/// One day of the outlook embedded in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_outlook_day"))]
pub struct OutlookDay {
    pub date: DateTime<Utc>,
    pub temperature: TemperatureRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precipitation: Option<PrecipitationOutlook>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn validate_outlook_day(day: &OutlookDay) -> Result<(), ValidationError> {
    if day.temperature.min > day.temperature.max {
        let mut err = ValidationError::new("temperature_range");
        err.message = Some("Minimum temperature cannot exceed maximum".into());
        return Err(err);
    }
    if let Some(probability) = day.precipitation.as_ref().and_then(|p| p.probability) {
        shared::validation::validate_percentage(probability)?;
    }
    Ok(())
}

/// A point-in-time observation for a location, optionally scoped to a field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentWeather {
    pub id: Uuid,
    pub location: String,
    pub coordinates: GeoPoint,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_id: Option<Uuid>,
    pub date: DateTime<Utc>,
    pub temperature: Temperature,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feels_like: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precipitation: Option<Precipitation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind: Option<Wind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressure: Option<Pressure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_cover: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uv_index: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sunrise: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sunset: Option<DateTime<Utc>>,
    pub source: String,
    pub forecast: Vec<OutlookDay>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCurrentWeatherRequest {
    #[validate(length(min = 1, max = 200, message = "Location must be 1-200 characters"))]
    pub location: String,

    #[validate(nested)]
    pub coordinates: GeoPoint,

    pub field_id: Option<Uuid>,

    pub date: Option<DateTime<Utc>>,

    #[validate(nested)]
    pub temperature: Temperature,

    pub feels_like: Option<f64>,

    #[validate(length(max = 100, message = "Condition must be at most 100 characters"))]
    pub condition: Option<String>,

    #[validate(custom(function = "shared::validation::validate_percentage"))]
    pub humidity: Option<f64>,

    #[validate(nested)]
    pub precipitation: Option<Precipitation>,

    #[validate(nested)]
    pub wind: Option<Wind>,

    pub pressure: Option<Pressure>,

    #[validate(custom(function = "shared::validation::validate_percentage"))]
    pub cloud_cover: Option<f64>,

    #[validate(custom(function = "shared::validation::validate_non_negative"))]
    pub uv_index: Option<f64>,

    #[validate(nested)]
    pub visibility: Option<Visibility>,

    pub sunrise: Option<DateTime<Utc>>,

    pub sunset: Option<DateTime<Utc>>,

    #[validate(length(min = 1, max = 100, message = "Source is required"))]
    pub source: String,

    #[serde(default)]
    #[validate(nested)]
    pub forecast: Vec<OutlookDay>,
}

/// One forecast day for a named location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherForecast {
    pub id: Uuid,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<GeoPoint>,
    pub date: DateTime<Utc>,
    pub day: String,
    pub condition: String,
    pub high_temp: f64,
    pub low_temp: f64,
    pub precipitation: f64,
    pub wind_speed: f64,
    pub wind_direction: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_forecast_temps"))]
pub struct CreateForecastRequest {
    #[validate(length(min = 1, max = 200, message = "Location must be 1-200 characters"))]
    pub location: String,

    #[validate(nested)]
    pub coordinates: Option<GeoPoint>,

    pub date: DateTime<Utc>,

    #[validate(length(min = 1, max = 20, message = "Day must be 1-20 characters"))]
    pub day: String,

    #[validate(length(min = 1, max = 100, message = "Condition must be 1-100 characters"))]
    pub condition: String,

    pub high_temp: f64,

    pub low_temp: f64,

    #[validate(custom(function = "shared::validation::validate_non_negative"))]
    pub precipitation: f64,

    #[validate(custom(function = "shared::validation::validate_non_negative"))]
    pub wind_speed: f64,

    #[validate(length(min = 1, max = 10, message = "Wind direction must be 1-10 characters"))]
    pub wind_direction: String,
}

fn validate_forecast_temps(req: &CreateForecastRequest) -> Result<(), ValidationError> {
    if req.low_temp > req.high_temp {
        let mut err = ValidationError::new("temperature_range");
        err.message = Some("Low temperature cannot exceed high temperature".into());
        return Err(err);
    }
    Ok(())
}

/// Several forecast days written together.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BulkForecastRequest {
    #[validate(nested)]
    pub forecasts: Vec<CreateForecastRequest>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkForecastResponse {
    pub inserted: usize,
    pub forecasts: Vec<WeatherForecast>,
}

/// A time-boxed advisory for a location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherAlert {
    pub id: Uuid,
    pub location: String,
    #[serde(rename = "type")]
    pub alert_type: String,
    pub severity: WeatherSeverity,
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_alert_window"))]
pub struct CreateWeatherAlertRequest {
    #[validate(length(min = 1, max = 200, message = "Location must be 1-200 characters"))]
    pub location: String,

    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 100, message = "Type must be 1-100 characters"))]
    pub alert_type: String,

    pub severity: WeatherSeverity,

    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 5000, message = "Description is required"))]
    pub description: String,

    pub start_date: DateTime<Utc>,

    pub end_date: DateTime<Utc>,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

fn validate_alert_window(req: &CreateWeatherAlertRequest) -> Result<(), ValidationError> {
    check_window(req.start_date, req.end_date)
}

pub fn check_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), ValidationError> {
    if start > end {
        let mut err = ValidationError::new("date_window");
        err.message = Some("Start date must not be after end date".into());
        return Err(err);
    }
    Ok(())
}

/// Partial update of an advisory. The window is rechecked against the stored
/// row once merged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWeatherAlertRequest {
    #[validate(length(min = 1, max = 200, message = "Location must be 1-200 characters"))]
    pub location: Option<String>,

    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 100, message = "Type must be 1-100 characters"))]
    pub alert_type: Option<String>,

    pub severity: Option<WeatherSeverity>,

    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 5000, message = "Description must be 1-5000 characters"))]
    pub description: Option<String>,

    pub start_date: Option<DateTime<Utc>>,

    pub end_date: Option<DateTime<Utc>>,

    pub is_active: Option<bool>,
}

/// Monthly aggregate for a location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalWeather {
    pub id: Uuid,
    pub location: String,
    pub year: i32,
    pub month: i32,
    pub avg_high: f64,
    pub avg_low: f64,
    pub total_precipitation: f64,
    pub avg_humidity: f64,
    pub avg_wind_speed: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateHistoricalWeatherRequest {
    #[validate(length(min = 1, max = 200, message = "Location must be 1-200 characters"))]
    pub location: String,

    #[validate(range(min = 1900, max = 2200, message = "Year out of range"))]
    pub year: i32,

    #[validate(range(min = 1, max = 12, message = "Month must be between 1 and 12"))]
    pub month: i32,

    pub avg_high: f64,

    pub avg_low: f64,

    #[validate(custom(function = "shared::validation::validate_non_negative"))]
    pub total_precipitation: f64,

    #[validate(custom(function = "shared::validation::validate_percentage"))]
    pub avg_humidity: f64,

    #[validate(custom(function = "shared::validation::validate_non_negative"))]
    pub avg_wind_speed: f64,
}

/// `?location=` shared by the read endpoints. `"all"` or absent means no filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationQuery {
    pub location: Option<String>,
}

impl LocationQuery {
    pub fn filter(&self) -> Option<&str> {
        location_filter(self.location.as_deref())
    }
}

/// Observation window over one field's stored snapshots.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldWeatherHistoryQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForecastQuery {
    pub location: Option<String>,
    pub days: Option<i64>,
}

impl ForecastQuery {
    pub const DEFAULT_DAYS: i64 = 7;

    pub fn filter(&self) -> Option<&str> {
        location_filter(self.location.as_deref())
    }

    pub fn days(&self) -> i64 {
        self.days.unwrap_or(Self::DEFAULT_DAYS)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoricalQuery {
    pub location: Option<String>,
    pub year: Option<i32>,
}

impl HistoricalQuery {
    pub fn filter(&self) -> Option<&str> {
        location_filter(self.location.as_deref())
    }

    /// Requested year, or the current UTC year.
    pub fn year_or(&self, now: DateTime<Utc>) -> i32 {
        use chrono::Datelike;
        self.year.unwrap_or_else(|| now.year())
    }
}

fn location_filter(location: Option<&str>) -> Option<&str> {
    match location.map(str::trim) {
        None | Some("") => None,
        Some(l) if l.eq_ignore_ascii_case("all") => None,
        Some(l) => Some(l),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_severity_wire_names_are_capitalised() {
        assert_eq!(WeatherSeverity::Extreme.as_str(), "Extreme");
        assert!("extreme".parse::<WeatherSeverity>().is_err());
        assert_eq!(
            serde_json::to_string(&WeatherSeverity::Moderate).unwrap(),
            r#""Moderate""#
        );
    }

    #[test]
    fn test_severity_rank_is_ordinal() {
        let mut all = WeatherSeverity::ALL.to_vec();
        all.sort_by_key(|s| std::cmp::Reverse(s.rank()));
        assert_eq!(
            all,
            vec![
                WeatherSeverity::Extreme,
                WeatherSeverity::High,
                WeatherSeverity::Moderate,
                WeatherSeverity::Low
            ]
        );
    }

    #[test]
    fn test_location_filter() {
        let q = LocationQuery { location: Some("all".into()) };
        assert_eq!(q.filter(), None);
        let q = LocationQuery { location: Some("Pune".into()) };
        assert_eq!(q.filter(), Some("Pune"));
        assert_eq!(LocationQuery::default().filter(), None);
    }

    #[test]
    fn test_forecast_days_default() {
        assert_eq!(ForecastQuery::default().days(), 7);
        let q = ForecastQuery { location: None, days: Some(3) };
        assert_eq!(q.days(), 3);
    }

    #[test]
    fn test_historical_year_defaults_to_now() {
        let now = Utc.with_ymd_and_hms(2025, 4, 2, 0, 0, 0).unwrap();
        assert_eq!(HistoricalQuery::default().year_or(now), 2025);
        let q = HistoricalQuery { location: None, year: Some(2023) };
        assert_eq!(q.year_or(now), 2023);
    }

    #[test]
    fn test_alert_window_validated() {
        let now = Utc::now();
        let json = serde_json::json!({
            "location": "Nashik",
            "type": "frost",
            "severity": "High",
            "title": "Frost warning",
            "description": "Ground frost expected overnight",
            "startDate": now,
            "endDate": now - Duration::hours(1),
        });
        let req: CreateWeatherAlertRequest = serde_json::from_value(json).unwrap();
        assert!(req.is_active);
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_forecast_low_above_high_rejected() {
        let json = serde_json::json!({
            "location": "Pune",
            "date": "2024-06-01T00:00:00Z",
            "day": "Saturday",
            "condition": "Sunny",
            "highTemp": 20.0,
            "lowTemp": 25.0,
            "precipitation": 0.0,
            "windSpeed": 5.0,
            "windDirection": "NE"
        });
        let req: CreateForecastRequest = serde_json::from_value(json).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_current_weather_requires_source() {
        let json = serde_json::json!({
            "location": "Pune",
            "coordinates": {"latitude": 18.52, "longitude": 73.85},
            "temperature": {"current": 31.5},
            "source": ""
        });
        let req: CreateCurrentWeatherRequest = serde_json::from_value(json).unwrap();
        assert_eq!(req.temperature.unit, TemperatureUnit::Celsius);
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_wind_unit_wire_names() {
        assert_eq!("km/h".parse::<WindUnit>().unwrap(), WindUnit::KmH);
        assert_eq!("m/s".parse::<WindUnit>().unwrap(), WindUnit::MS);
    }

    #[test]
    fn test_historical_month_range() {
        let json = serde_json::json!({
            "location": "Pune", "year": 2023, "month": 13,
            "avgHigh": 30.0, "avgLow": 20.0, "totalPrecipitation": 10.0,
            "avgHumidity": 60.0, "avgWindSpeed": 8.0
        });
        let req: CreateHistoricalWeatherRequest = serde_json::from_value(json).unwrap();
        assert!(req.validate().is_err());
    }
}
