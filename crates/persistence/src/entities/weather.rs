//! Weather entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::weather::{
    OutlookDay, Precipitation, Pressure, Temperature, Visibility, WeatherSeverity, Wind,
};
use domain::models::GeoPoint;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the weather_current table.
#[derive(Debug, Clone, FromRow)]
pub struct CurrentWeatherEntity {
    pub id: Uuid,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
    pub field_id: Option<Uuid>,
    pub date: DateTime<Utc>,
    pub temperature: Json<Temperature>,
    pub feels_like: Option<f64>,
    pub condition: Option<String>,
    pub humidity: Option<f64>,
    pub precipitation: Option<Json<Precipitation>>,
    pub wind: Option<Json<Wind>>,
    pub pressure: Option<Json<Pressure>>,
    pub cloud_cover: Option<f64>,
    pub uv_index: Option<f64>,
    pub visibility: Option<Json<Visibility>>,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
    pub source: String,
    pub forecast: Json<Vec<OutlookDay>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CurrentWeatherEntity> for domain::models::CurrentWeather {
    fn from(entity: CurrentWeatherEntity) -> Self {
        Self {
            id: entity.id,
            location: entity.location,
            coordinates: GeoPoint {
                latitude: entity.latitude,
                longitude: entity.longitude,
                altitude: entity.altitude,
                accuracy: None,
            },
            field_id: entity.field_id,
            date: entity.date,
            temperature: entity.temperature.0,
            feels_like: entity.feels_like,
            condition: entity.condition,
            humidity: entity.humidity,
            precipitation: entity.precipitation.map(|p| p.0),
            wind: entity.wind.map(|w| w.0),
            pressure: entity.pressure.map(|p| p.0),
            cloud_cover: entity.cloud_cover,
            uv_index: entity.uv_index,
            visibility: entity.visibility.map(|v| v.0),
            sunrise: entity.sunrise,
            sunset: entity.sunset,
            source: entity.source,
            forecast: entity.forecast.0,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Database row mapping for the weather_forecasts table.
#[derive(Debug, Clone, FromRow)]
pub struct WeatherForecastEntity {
    pub id: Uuid,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
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

impl From<WeatherForecastEntity> for domain::models::WeatherForecast {
    fn from(entity: WeatherForecastEntity) -> Self {
        let coordinates = match (entity.latitude, entity.longitude) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
            _ => None,
        };
        Self {
            id: entity.id,
            location: entity.location,
            coordinates,
            date: entity.date,
            day: entity.day,
            condition: entity.condition,
            high_temp: entity.high_temp,
            low_temp: entity.low_temp,
            precipitation: entity.precipitation,
            wind_speed: entity.wind_speed,
            wind_direction: entity.wind_direction,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Database row mapping for the weather_alerts table.
#[derive(Debug, Clone, FromRow)]
pub struct WeatherAlertEntity {
    pub id: Uuid,
    pub location: String,
    pub alert_type: String,
    pub severity: String,
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<WeatherAlertEntity> for domain::models::WeatherAlert {
    fn from(entity: WeatherAlertEntity) -> Self {
        Self {
            id: entity.id,
            location: entity.location,
            alert_type: entity.alert_type,
            severity: entity.severity.parse().unwrap_or(WeatherSeverity::Low),
            title: entity.title,
            description: entity.description,
            start_date: entity.start_date,
            end_date: entity.end_date,
            is_active: entity.is_active,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Database row mapping for the weather_historical table.
#[derive(Debug, Clone, FromRow)]
pub struct HistoricalWeatherEntity {
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

impl From<HistoricalWeatherEntity> for domain::models::HistoricalWeather {
    fn from(entity: HistoricalWeatherEntity) -> Self {
        Self {
            id: entity.id,
            location: entity.location,
            year: entity.year,
            month: entity.month,
            avg_high: entity.avg_high,
            avg_low: entity.avg_low,
            total_precipitation: entity.total_precipitation,
            avg_humidity: entity.avg_humidity,
            avg_wind_speed: entity.avg_wind_speed,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::weather::TemperatureUnit;

    #[test]
    fn test_alert_entity_severity_parsed() {
        let entity = WeatherAlertEntity {
            id: Uuid::new_v4(),
            location: "Nashik".to_string(),
            alert_type: "hail".to_string(),
            severity: "Extreme".to_string(),
            title: "Hailstorm".to_string(),
            description: "Large hail expected".to_string(),
            start_date: Utc::now(),
            end_date: Utc::now(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let alert: domain::models::WeatherAlert = entity.into();
        assert_eq!(alert.severity, WeatherSeverity::Extreme);
        assert_eq!(alert.alert_type, "hail");
    }

    #[test]
    fn test_current_entity_to_domain() {
        let entity = CurrentWeatherEntity {
            id: Uuid::new_v4(),
            location: "Pune".to_string(),
            latitude: 18.52,
            longitude: 73.85,
            altitude: None,
            field_id: None,
            date: Utc::now(),
            temperature: Json(Temperature {
                current: 29.0,
                min: Some(22.0),
                max: Some(33.0),
                unit: TemperatureUnit::Celsius,
            }),
            feels_like: Some(31.0),
            condition: Some("Partly cloudy".to_string()),
            humidity: Some(64.0),
            precipitation: None,
            wind: None,
            pressure: None,
            cloud_cover: Some(40.0),
            uv_index: Some(7.0),
            visibility: None,
            sunrise: None,
            sunset: None,
            source: "station".to_string(),
            forecast: Json(vec![]),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let current: domain::models::CurrentWeather = entity.into();
        assert_eq!(current.coordinates.latitude, 18.52);
        assert_eq!(current.temperature.max, Some(33.0));
        assert_eq!(current.source, "station");
    }

    #[test]
    fn test_forecast_entity_without_coordinates() {
        let entity = WeatherForecastEntity {
            id: Uuid::new_v4(),
            location: "Pune".to_string(),
            latitude: None,
            longitude: None,
            date: Utc::now(),
            day: "Monday".to_string(),
            condition: "Rain".to_string(),
            high_temp: 27.0,
            low_temp: 21.0,
            precipitation: 12.0,
            wind_speed: 14.0,
            wind_direction: "SW".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let forecast: domain::models::WeatherForecast = entity.into();
        assert!(forecast.coordinates.is_none());
    }
}
