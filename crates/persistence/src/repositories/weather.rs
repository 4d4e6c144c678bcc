//! Weather repository: snapshots, forecasts, advisories and monthly history.

use chrono::{DateTime, Utc};
use domain::models::weather::{
    CreateCurrentWeatherRequest, CreateForecastRequest, CreateHistoricalWeatherRequest,
    CreateWeatherAlertRequest, UpdateWeatherAlertRequest, WeatherSeverity,
};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{
    CurrentWeatherEntity, HistoricalWeatherEntity, WeatherAlertEntity, WeatherForecastEntity,
};
use crate::metrics::QueryTimer;

const CURRENT_COLUMNS: &str = r#"
    id, location,
    ST_Y(coordinates::geometry) AS latitude,
    ST_X(coordinates::geometry) AS longitude,
    altitude, field_id, date, temperature, feels_like, condition, humidity,
    precipitation, wind, pressure, cloud_cover, uv_index, visibility,
    sunrise, sunset, source, forecast, created_at, updated_at
"#;

const FORECAST_COLUMNS: &str = r#"
    id, location,
    ST_Y(coordinates::geometry) AS latitude,
    ST_X(coordinates::geometry) AS longitude,
    date, day, condition, high_temp, low_temp, precipitation,
    wind_speed, wind_direction, created_at, updated_at
"#;

const ALERT_COLUMNS: &str = r#"
    id, location, alert_type, severity, title, description,
    start_date, end_date, is_active, created_at, updated_at
"#;

const HISTORICAL_COLUMNS: &str = r#"
    id, location, year, month, avg_high, avg_low, total_precipitation,
    avg_humidity, avg_wind_speed, created_at, updated_at
"#;

/// `CASE` over the stored severity label yielding [`WeatherSeverity::rank`].
fn severity_rank_sql() -> String {
    let arms: String = WeatherSeverity::ALL
        .iter()
        .map(|s| format!(" WHEN '{}' THEN {}", s.as_str(), s.rank()))
        .collect();
    format!("CASE severity{} ELSE 0 END", arms)
}

/// Repository for weather database operations.
#[derive(Clone)]
pub struct WeatherRepository {
    pool: PgPool,
}

impl WeatherRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Latest snapshot by observation date, optionally for one location.
    pub async fn latest_current(
        &self,
        location: Option<&str>,
    ) -> Result<Option<CurrentWeatherEntity>, sqlx::Error> {
        let timer = QueryTimer::new("latest_current_weather");
        let result = sqlx::query_as::<_, CurrentWeatherEntity>(&format!(
            r#"
            SELECT {CURRENT_COLUMNS} FROM weather_current
            WHERE ($1::text IS NULL OR location = $1)
            ORDER BY date DESC, created_at DESC
            LIMIT 1
            "#
        ))
        .bind(location)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Latest snapshot recorded against a field.
    pub async fn latest_current_for_field(
        &self,
        field_id: Uuid,
    ) -> Result<Option<CurrentWeatherEntity>, sqlx::Error> {
        let timer = QueryTimer::new("latest_field_weather");
        let result = sqlx::query_as::<_, CurrentWeatherEntity>(&format!(
            r#"
            SELECT {CURRENT_COLUMNS} FROM weather_current
            WHERE field_id = $1
            ORDER BY date DESC, created_at DESC
            LIMIT 1
            "#
        ))
        .bind(field_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// A field's snapshots within an inclusive date window, newest first.
    pub async fn list_current_for_field(
        &self,
        field_id: Uuid,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<CurrentWeatherEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_field_weather");
        let result = sqlx::query_as::<_, CurrentWeatherEntity>(&format!(
            r#"
            SELECT {CURRENT_COLUMNS} FROM weather_current
            WHERE field_id = $1
              AND ($2::timestamptz IS NULL OR date >= $2)
              AND ($3::timestamptz IS NULL OR date <= $3)
            ORDER BY date DESC, created_at DESC
            "#
        ))
        .bind(field_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn create_current(
        &self,
        req: &CreateCurrentWeatherRequest,
    ) -> Result<CurrentWeatherEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_current_weather");
        let result = sqlx::query_as::<_, CurrentWeatherEntity>(&format!(
            r#"
            INSERT INTO weather_current (
                location, coordinates, altitude, field_id, date, temperature, feels_like,
                condition, humidity, precipitation, wind, pressure, cloud_cover, uv_index,
                visibility, sunrise, sunset, source, forecast
            )
            VALUES (
                $1, ST_SetSRID(ST_MakePoint($2, $3), 4326)::geography,
                $4, $5, COALESCE($6, NOW()), $7, $8, $9, $10, $11, $12, $13, $14, $15,
                $16, $17, $18, $19, $20
            )
            RETURNING {CURRENT_COLUMNS}
            "#
        ))
        .bind(&req.location)
        .bind(req.coordinates.longitude) // MakePoint takes (x=lon, y=lat)
        .bind(req.coordinates.latitude)
        .bind(req.coordinates.altitude)
        .bind(req.field_id)
        .bind(req.date)
        .bind(Json(&req.temperature))
        .bind(req.feels_like)
        .bind(&req.condition)
        .bind(req.humidity)
        .bind(req.precipitation.as_ref().map(Json))
        .bind(req.wind.as_ref().map(Json))
        .bind(req.pressure.as_ref().map(Json))
        .bind(req.cloud_cover)
        .bind(req.uv_index)
        .bind(req.visibility.as_ref().map(Json))
        .bind(req.sunrise)
        .bind(req.sunset)
        .bind(&req.source)
        .bind(Json(&req.forecast))
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Upcoming forecast days in date order, at most `days` rows.
    pub async fn list_forecast(
        &self,
        location: Option<&str>,
        days: i64,
    ) -> Result<Vec<WeatherForecastEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_weather_forecast");
        let result = sqlx::query_as::<_, WeatherForecastEntity>(&format!(
            r#"
            SELECT {FORECAST_COLUMNS} FROM weather_forecasts
            WHERE ($1::text IS NULL OR location = $1)
            ORDER BY date ASC, id ASC
            LIMIT $2
            "#
        ))
        .bind(location)
        .bind(days)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    async fn insert_forecast_with(
        conn: &mut sqlx::PgConnection,
        req: &CreateForecastRequest,
    ) -> Result<WeatherForecastEntity, sqlx::Error> {
        let coordinates = req.coordinates.as_ref();
        sqlx::query_as::<_, WeatherForecastEntity>(&format!(
            r#"
            INSERT INTO weather_forecasts (
                location, coordinates, date, day, condition, high_temp, low_temp,
                precipitation, wind_speed, wind_direction
            )
            VALUES (
                $1,
                CASE WHEN $2::float8 IS NULL THEN NULL
                     ELSE ST_SetSRID(ST_MakePoint($2, $3), 4326)::geography END,
                $4, $5, $6, $7, $8, $9, $10, $11
            )
            RETURNING {FORECAST_COLUMNS}
            "#
        ))
        .bind(&req.location)
        .bind(coordinates.map(|c| c.longitude))
        .bind(coordinates.map(|c| c.latitude))
        .bind(req.date)
        .bind(&req.day)
        .bind(&req.condition)
        .bind(req.high_temp)
        .bind(req.low_temp)
        .bind(req.precipitation)
        .bind(req.wind_speed)
        .bind(&req.wind_direction)
        .fetch_one(&mut *conn)
        .await
    }

    pub async fn create_forecast(
        &self,
        req: &CreateForecastRequest,
    ) -> Result<WeatherForecastEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_weather_forecast");
        let mut conn = self.pool.acquire().await?;
        let result = Self::insert_forecast_with(&mut conn, req).await;
        timer.record();
        result
    }

    /// Insert several forecast days in one transaction.
    pub async fn create_forecasts_bulk(
        &self,
        forecasts: &[CreateForecastRequest],
    ) -> Result<Vec<WeatherForecastEntity>, sqlx::Error> {
        let timer = QueryTimer::new("create_weather_forecasts_bulk");
        let mut tx = self.pool.begin().await?;
        let mut inserted = Vec::with_capacity(forecasts.len());

        for forecast in forecasts {
            inserted.push(Self::insert_forecast_with(&mut *tx, forecast).await?);
        }

        tx.commit().await?;
        timer.record_rows(inserted.len());
        Ok(inserted)
    }

    /// Advisories in effect at `now`, most severe first, then newest start.
    pub async fn list_active_alerts(
        &self,
        location: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Vec<WeatherAlertEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_active_weather_alerts");
        let severity_rank = severity_rank_sql();
        let result = sqlx::query_as::<_, WeatherAlertEntity>(&format!(
            r#"
            SELECT {ALERT_COLUMNS} FROM weather_alerts
            WHERE is_active
              AND start_date <= $2
              AND end_date >= $2
              AND ($1::text IS NULL OR location = $1)
            ORDER BY {severity_rank} DESC, start_date DESC, id ASC
            "#
        ))
        .bind(location)
        .bind(now)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn create_alert(
        &self,
        req: &CreateWeatherAlertRequest,
    ) -> Result<WeatherAlertEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_weather_alert");
        let result = sqlx::query_as::<_, WeatherAlertEntity>(&format!(
            r#"
            INSERT INTO weather_alerts (
                location, alert_type, severity, title, description,
                start_date, end_date, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ALERT_COLUMNS}
            "#
        ))
        .bind(&req.location)
        .bind(&req.alert_type)
        .bind(req.severity.as_str())
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.start_date)
        .bind(req.end_date)
        .bind(req.is_active)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Apply a partial update. The window check constraint rejects a merged
    /// row whose start falls after its end. Returns `None` if missing.
    pub async fn update_alert(
        &self,
        id: Uuid,
        req: &UpdateWeatherAlertRequest,
    ) -> Result<Option<WeatherAlertEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_weather_alert");
        let result = sqlx::query_as::<_, WeatherAlertEntity>(&format!(
            r#"
            UPDATE weather_alerts SET
                location = COALESCE($2, location),
                alert_type = COALESCE($3, alert_type),
                severity = COALESCE($4, severity),
                title = COALESCE($5, title),
                description = COALESCE($6, description),
                start_date = COALESCE($7, start_date),
                end_date = COALESCE($8, end_date),
                is_active = COALESCE($9, is_active)
            WHERE id = $1
            RETURNING {ALERT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&req.location)
        .bind(&req.alert_type)
        .bind(req.severity.map(|s| s.as_str()))
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.start_date)
        .bind(req.end_date)
        .bind(req.is_active)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn delete_alert(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_weather_alert");
        let result = sqlx::query("DELETE FROM weather_alerts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected())
    }

    /// Monthly aggregates for one year in month order.
    pub async fn list_historical(
        &self,
        location: Option<&str>,
        year: i32,
    ) -> Result<Vec<HistoricalWeatherEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_historical_weather");
        let result = sqlx::query_as::<_, HistoricalWeatherEntity>(&format!(
            r#"
            SELECT {HISTORICAL_COLUMNS} FROM weather_historical
            WHERE year = $2
              AND ($1::text IS NULL OR location = $1)
            ORDER BY month ASC, location ASC
            "#
        ))
        .bind(location)
        .bind(year)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Insert a monthly aggregate. A second row for the same location and
    /// month surfaces as a unique violation.
    pub async fn create_historical(
        &self,
        req: &CreateHistoricalWeatherRequest,
    ) -> Result<HistoricalWeatherEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_historical_weather");
        let result = sqlx::query_as::<_, HistoricalWeatherEntity>(&format!(
            r#"
            INSERT INTO weather_historical (
                location, year, month, avg_high, avg_low, total_precipitation,
                avg_humidity, avg_wind_speed
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {HISTORICAL_COLUMNS}
            "#
        ))
        .bind(&req.location)
        .bind(req.year)
        .bind(req.month)
        .bind(req.avg_high)
        .bind(req.avg_low)
        .bind(req.total_precipitation)
        .bind(req.avg_humidity)
        .bind(req.avg_wind_speed)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }
}
