//! Sensor reading ingest and listing.

use axum::{extract::State, http::StatusCode};
use domain::models::device::Device;
use domain::models::reading::{
    BatchReadingsRequest, BatchReadingsResponse, CreateReadingRequest, CursorPagination,
    ListReadingsQuery, ListReadingsResponse, NewReading, Reading,
};
use persistence::repositories::{DeviceRepository, ReadingQuery, ReadingRepository};
use shared::pagination::{decode_cursor, encode_cursor};
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::{ApiError, ValidationDetail};
use crate::extractors::{AuthUser, Json, Query};
use crate::middleware::metrics::record_readings_ingested;
use crate::routes::devices::load_accessible_device;
use crate::routes::fields::load_accessible_field;

fn invalid_value(field: String, err: validator::ValidationError) -> ApiError {
    let message = err
        .message
        .map(|m| m.to_string())
        .unwrap_or_else(|| err.code.to_string());
    ApiError::InvalidFields {
        message: message.clone(),
        details: vec![ValidationDetail { field, message }],
    }
}

fn into_domain(entities: Vec<persistence::entities::ReadingEntity>) -> Result<Vec<Reading>, ApiError> {
    entities
        .into_iter()
        .map(|e| e.into_domain().map_err(ApiError::from))
        .collect()
}

/// POST /api/iot/readings
pub async fn create_reading(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateReadingRequest>,
) -> Result<(StatusCode, Json<Reading>), ApiError> {
    request.validate()?;

    let device = load_accessible_device(&state, &auth, request.device_id).await?;
    if let Some(field_id) = request.field_id {
        load_accessible_field(&state, &auth, field_id).await?;
    }

    let new_reading = request
        .into_new_reading(device.location.clone(), device.field_id)
        .map_err(|e| invalid_value("value".to_string(), e))?;

    let reading = ReadingRepository::new(state.pool.clone())
        .insert(&new_reading)
        .await?
        .into_domain()?;

    record_readings_ingested(1);
    info!(
        reading_id = %reading.id,
        device_id = %reading.device_id,
        reading_type = %reading.value.reading_type(),
        "Reading recorded"
    );

    Ok((StatusCode::CREATED, Json(reading)))
}

/// POST /api/iot/readings/batch
///
/// Every reading is checked before anything is written; the insert is a
/// single transaction.
pub async fn create_readings_batch(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<BatchReadingsRequest>,
) -> Result<(StatusCode, Json<BatchReadingsResponse>), ApiError> {
    if request.readings.is_empty() {
        return Err(ApiError::Validation(
            "Batch must contain at least one reading".to_string(),
        ));
    }
    let max = state.config.limits.max_batch_size;
    if request.readings.len() > max {
        return Err(ApiError::Validation(format!(
            "Batch size exceeds maximum of {} readings",
            max
        )));
    }
    request.validate()?;

    let mut device_ids: Vec<Uuid> = request.readings.iter().map(|r| r.device_id).collect();
    device_ids.sort_unstable();
    device_ids.dedup();

    let devices: HashMap<Uuid, Device> = DeviceRepository::new(state.pool.clone())
        .find_by_ids(&device_ids)
        .await?
        .into_iter()
        .map(|e| {
            let device = e.into_domain();
            (device.id, device)
        })
        .collect();

    for device_id in &device_ids {
        let device = devices.get(device_id).ok_or_else(|| {
            ApiError::NotFound(format!("Device {} not found", device_id))
        })?;
        auth.ensure_access(device.owner_id)?;
    }

    let mut field_ids: Vec<Uuid> = request.readings.iter().filter_map(|r| r.field_id).collect();
    field_ids.sort_unstable();
    field_ids.dedup();
    for field_id in field_ids {
        load_accessible_field(&state, &auth, field_id).await?;
    }

    let new_readings = request
        .readings
        .into_iter()
        .enumerate()
        .map(|(index, reading)| {
            // Presence was checked above.
            let device = devices
                .get(&reading.device_id)
                .ok_or_else(|| ApiError::NotFound("Device not found".to_string()))?;
            reading
                .into_new_reading(device.location.clone(), device.field_id)
                .map_err(|e| invalid_value(format!("readings[{}].value", index), e))
        })
        .collect::<Result<Vec<NewReading>, ApiError>>()?;

    let readings = into_domain(
        ReadingRepository::new(state.pool.clone())
            .insert_batch(&new_readings)
            .await?,
    )?;

    record_readings_ingested(readings.len());
    info!(
        count = readings.len(),
        devices = device_ids.len(),
        "Reading batch recorded"
    );

    Ok((
        StatusCode::CREATED,
        Json(BatchReadingsResponse {
            inserted: readings.len(),
            readings,
        }),
    ))
}

/// GET /api/iot/readings
pub async fn list_readings(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListReadingsQuery>,
) -> Result<Json<ListReadingsResponse>, ApiError> {
    let limits = &state.config.limits;
    let limit = match query.limit {
        Some(l) if l > 0 => l.min(limits.max_page_size),
        Some(_) => {
            return Err(ApiError::Validation(
                "limit must be a positive number".to_string(),
            ))
        }
        None => limits.default_page_size,
    };

    let (cursor_timestamp, cursor_id) = match query.cursor.as_deref() {
        Some(cursor) => {
            let (ts, id) = decode_cursor(cursor)
                .map_err(|e| ApiError::Validation(format!("Invalid cursor: {}", e)))?;
            (Some(ts), Some(id))
        }
        None => (None, None),
    };

    let filter = ReadingQuery {
        owner_id: auth.owner_filter(),
        device_id: query.device_id,
        field_id: query.field_id,
        reading_type: query.reading_type,
        from: query.from,
        to: query.to,
        cursor_timestamp,
        cursor_id,
        limit,
    };

    let (entities, has_more) = ReadingRepository::new(state.pool.clone())
        .list(&filter)
        .await?;
    let readings = into_domain(entities)?;

    let next_cursor = if has_more {
        readings.last().map(|r| encode_cursor(r.timestamp, r.id))
    } else {
        None
    };

    Ok(Json(ListReadingsResponse {
        readings,
        pagination: CursorPagination {
            next_cursor,
            has_more,
        },
    }))
}
