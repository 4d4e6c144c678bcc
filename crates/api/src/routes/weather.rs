//! Weather handlers. Location reads are public, field reads follow field
//! ownership, and writes sit behind the admin gate.

use axum::{extract::State, http::StatusCode};
use chrono::Utc;
use domain::models::weather::{
    check_window, BulkForecastRequest, BulkForecastResponse, CreateCurrentWeatherRequest,
    CreateForecastRequest, CreateHistoricalWeatherRequest, CreateWeatherAlertRequest,
    CurrentWeather, FieldWeatherHistoryQuery, ForecastQuery, HistoricalQuery, HistoricalWeather,
    LocationQuery, UpdateWeatherAlertRequest, WeatherAlert, WeatherForecast,
};
use persistence::repositories::WeatherRepository;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AuthUser, Json, Path, Query};
use crate::routes::fields::load_accessible_field;

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn weather_alert_not_found() -> ApiError {
    ApiError::NotFound("Weather alert not found".to_string())
}

fn window_error(err: validator::ValidationError) -> ApiError {
    ApiError::Validation(
        err.message
            .map(|m| m.to_string())
            .unwrap_or_else(|| err.code.to_string()),
    )
}

/// GET /api/weather/current?location=
pub async fn get_current_weather(
    State(state): State<AppState>,
    Query(query): Query<LocationQuery>,
) -> Result<Json<CurrentWeather>, ApiError> {
    let current = WeatherRepository::new(state.pool.clone())
        .latest_current(query.filter())
        .await?
        .ok_or_else(|| ApiError::NotFound("No current weather data found".to_string()))?;

    Ok(Json(current.into()))
}

/// GET /api/weather/field/:field_id/current
pub async fn get_field_current_weather(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(field_id): Path<Uuid>,
) -> Result<Json<CurrentWeather>, ApiError> {
    load_accessible_field(&state, &auth, field_id).await?;

    let current = WeatherRepository::new(state.pool.clone())
        .latest_current_for_field(field_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No weather data found for this field".to_string()))?;

    Ok(Json(current.into()))
}

/// GET /api/weather/field/:field_id/history?from=&to=
pub async fn get_field_weather_history(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(field_id): Path<Uuid>,
    Query(query): Query<FieldWeatherHistoryQuery>,
) -> Result<Json<Vec<CurrentWeather>>, ApiError> {
    if let (Some(from), Some(to)) = (query.from, query.to) {
        check_window(from, to).map_err(window_error)?;
    }
    load_accessible_field(&state, &auth, field_id).await?;

    let records = WeatherRepository::new(state.pool.clone())
        .list_current_for_field(field_id, query.from, query.to)
        .await?
        .into_iter()
        .map(CurrentWeather::from)
        .collect();

    Ok(Json(records))
}

/// POST /api/weather/current
pub async fn create_current_weather(
    State(state): State<AppState>,
    Json(request): Json<CreateCurrentWeatherRequest>,
) -> Result<(StatusCode, Json<CurrentWeather>), ApiError> {
    request.validate()?;

    let current: CurrentWeather = WeatherRepository::new(state.pool.clone())
        .create_current(&request)
        .await?
        .into();

    info!(id = %current.id, location = %current.location, "Current weather recorded");
    Ok((StatusCode::CREATED, Json(current)))
}

/// GET /api/weather/forecast?location=&days=
pub async fn get_forecast(
    State(state): State<AppState>,
    Query(query): Query<ForecastQuery>,
) -> Result<Json<Vec<WeatherForecast>>, ApiError> {
    let days = query.days();
    let max_days = state.config.limits.max_forecast_days;
    if !(1..=max_days).contains(&days) {
        return Err(ApiError::Validation(format!(
            "days must be between 1 and {}",
            max_days
        )));
    }

    let forecasts = WeatherRepository::new(state.pool.clone())
        .list_forecast(query.filter(), days)
        .await?
        .into_iter()
        .map(WeatherForecast::from)
        .collect();

    Ok(Json(forecasts))
}

/// POST /api/weather/forecast
pub async fn create_forecast(
    State(state): State<AppState>,
    Json(request): Json<CreateForecastRequest>,
) -> Result<(StatusCode, Json<WeatherForecast>), ApiError> {
    request.validate()?;

    let forecast: WeatherForecast = WeatherRepository::new(state.pool.clone())
        .create_forecast(&request)
        .await?
        .into();

    info!(id = %forecast.id, location = %forecast.location, "Forecast created");
    Ok((StatusCode::CREATED, Json(forecast)))
}

/// POST /api/weather/forecast/bulk
///
/// All entries are validated before the insert, which is one transaction.
pub async fn bulk_create_forecast(
    State(state): State<AppState>,
    Json(request): Json<BulkForecastRequest>,
) -> Result<(StatusCode, Json<BulkForecastResponse>), ApiError> {
    if request.forecasts.is_empty() {
        return Err(ApiError::Validation(
            "At least one forecast is required".to_string(),
        ));
    }
    let max = state.config.limits.max_batch_size;
    if request.forecasts.len() > max {
        return Err(ApiError::Validation(format!(
            "Bulk forecast exceeds maximum of {} entries",
            max
        )));
    }
    request.validate()?;

    let forecasts: Vec<WeatherForecast> = WeatherRepository::new(state.pool.clone())
        .create_forecasts_bulk(&request.forecasts)
        .await?
        .into_iter()
        .map(WeatherForecast::from)
        .collect();

    info!(count = forecasts.len(), "Bulk forecasts created");
    Ok((
        StatusCode::CREATED,
        Json(BulkForecastResponse {
            inserted: forecasts.len(),
            forecasts,
        }),
    ))
}

/// GET /api/weather/alerts?location=
///
/// Active advisories whose window contains now, most severe first.
pub async fn get_weather_alerts(
    State(state): State<AppState>,
    Query(query): Query<LocationQuery>,
) -> Result<Json<Vec<WeatherAlert>>, ApiError> {
    let alerts = WeatherRepository::new(state.pool.clone())
        .list_active_alerts(query.filter(), Utc::now())
        .await?
        .into_iter()
        .map(WeatherAlert::from)
        .collect();

    Ok(Json(alerts))
}

/// POST /api/weather/alerts
pub async fn create_weather_alert(
    State(state): State<AppState>,
    Json(request): Json<CreateWeatherAlertRequest>,
) -> Result<(StatusCode, Json<WeatherAlert>), ApiError> {
    request.validate()?;

    let alert: WeatherAlert = WeatherRepository::new(state.pool.clone())
        .create_alert(&request)
        .await?
        .into();

    info!(
        id = %alert.id,
        location = %alert.location,
        severity = %alert.severity,
        "Weather alert created"
    );
    Ok((StatusCode::CREATED, Json(alert)))
}

/// PUT /api/weather/alerts/:id
pub async fn update_weather_alert(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateWeatherAlertRequest>,
) -> Result<Json<WeatherAlert>, ApiError> {
    request.validate()?;
    // A window supplied in full is checked here; a half window is checked
    // against the stored bound by the table constraint.
    if let (Some(start), Some(end)) = (request.start_date, request.end_date) {
        check_window(start, end).map_err(window_error)?;
    }

    let alert: WeatherAlert = WeatherRepository::new(state.pool.clone())
        .update_alert(id, &request)
        .await?
        .ok_or_else(weather_alert_not_found)?
        .into();

    info!(id = %alert.id, "Weather alert updated");
    Ok(Json(alert))
}

/// DELETE /api/weather/alerts/:id
pub async fn delete_weather_alert(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let deleted = WeatherRepository::new(state.pool.clone())
        .delete_alert(id)
        .await?;
    if deleted == 0 {
        return Err(weather_alert_not_found());
    }

    info!(id = %id, "Weather alert deleted");
    Ok(Json(MessageResponse {
        message: "Weather alert deleted successfully".to_string(),
    }))
}

/// GET /api/weather/historical?location=&year=
pub async fn get_historical_weather(
    State(state): State<AppState>,
    Query(query): Query<HistoricalQuery>,
) -> Result<Json<Vec<HistoricalWeather>>, ApiError> {
    let year = query.year_or(Utc::now());

    let records = WeatherRepository::new(state.pool.clone())
        .list_historical(query.filter(), year)
        .await?
        .into_iter()
        .map(HistoricalWeather::from)
        .collect();

    Ok(Json(records))
}

/// POST /api/weather/historical
pub async fn create_historical_weather(
    State(state): State<AppState>,
    Json(request): Json<CreateHistoricalWeatherRequest>,
) -> Result<(StatusCode, Json<HistoricalWeather>), ApiError> {
    request.validate()?;

    let record: HistoricalWeather = WeatherRepository::new(state.pool.clone())
        .create_historical(&request)
        .await
        .map_err(|e| match ApiError::from(e) {
            ApiError::Conflict(_) => ApiError::Conflict(
                "Historical weather for this location and month already exists".to_string(),
            ),
            other => other,
        })?
        .into();

    info!(
        id = %record.id,
        location = %record.location,
        year = record.year,
        month = record.month,
        "Historical weather created"
    );
    Ok((StatusCode::CREATED, Json(record)))
}
