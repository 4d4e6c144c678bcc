//! IoT device registry handlers.

use axum::{extract::State, http::StatusCode};
use domain::models::device::{
    CreateDeviceRequest, Device, ListDevicesQuery, ListDevicesResponse, NearbyDevice,
    NearbyDevicesQuery, UpdateDeviceRequest, UpdateDeviceStatusRequest,
};
use persistence::repositories::{DeviceFilter, DeviceRepository};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AuthUser, Json, Path, Query};
use crate::middleware::metrics::record_device_registered;
use crate::routes::fields::load_accessible_field;

fn device_not_found() -> ApiError {
    ApiError::NotFound("Device not found".to_string())
}

/// Loads a device and applies the owner-or-admin rule: 404 when it does
/// not exist, 403 when the caller may not see it.
pub(crate) async fn load_accessible_device(
    state: &AppState,
    auth: &AuthUser,
    device_id: Uuid,
) -> Result<Device, ApiError> {
    let device = DeviceRepository::new(state.pool.clone())
        .find_by_id(device_id)
        .await?
        .ok_or_else(device_not_found)?
        .into_domain();

    auth.ensure_access(device.owner_id)?;
    Ok(device)
}

/// POST /api/iot/devices
pub async fn create_device(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateDeviceRequest>,
) -> Result<(StatusCode, Json<Device>), ApiError> {
    request.validate()?;

    if let Some(field_id) = request.field_id {
        load_accessible_field(&state, &auth, field_id).await?;
    }

    let device = DeviceRepository::new(state.pool.clone())
        .create(auth.user_id, &request)
        .await
        .map_err(|e| match ApiError::from(e) {
            ApiError::Conflict(_) => {
                ApiError::Conflict("Device with this ID already exists".to_string())
            }
            other => other,
        })?
        .into_domain();

    record_device_registered();
    info!(
        id = %device.id,
        device_id = %device.device_id,
        device_type = %device.device_type,
        owner_id = %device.owner_id,
        "Device registered"
    );

    Ok((StatusCode::CREATED, Json(device)))
}

/// GET /api/iot/devices
pub async fn list_devices(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListDevicesQuery>,
) -> Result<Json<ListDevicesResponse>, ApiError> {
    let filter = DeviceFilter {
        owner_id: auth.owner_filter(),
        field_id: query.field_id,
        device_type: query.device_type,
        status: query.status,
    };

    let devices: Vec<Device> = DeviceRepository::new(state.pool.clone())
        .list(&filter)
        .await?
        .into_iter()
        .map(Device::from)
        .collect();

    let total = devices.len();
    Ok(Json(ListDevicesResponse { devices, total }))
}

/// GET /api/iot/devices/near
pub async fn list_nearby_devices(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<NearbyDevicesQuery>,
) -> Result<Json<Vec<NearbyDevice>>, ApiError> {
    query.validate()?;

    let devices = DeviceRepository::new(state.pool.clone())
        .find_nearby(
            auth.owner_filter(),
            query.latitude,
            query.longitude,
            query.radius_meters,
        )
        .await?
        .into_iter()
        .map(NearbyDevice::from)
        .collect();

    Ok(Json(devices))
}

/// GET /api/iot/devices/:id
pub async fn get_device(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(device_id): Path<Uuid>,
) -> Result<Json<Device>, ApiError> {
    Ok(Json(load_accessible_device(&state, &auth, device_id).await?))
}

/// PUT /api/iot/devices/:id
pub async fn update_device(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(device_id): Path<Uuid>,
    Json(request): Json<UpdateDeviceRequest>,
) -> Result<Json<Device>, ApiError> {
    request.validate()?;
    load_accessible_device(&state, &auth, device_id).await?;

    if let Some(field_id) = request.field_id {
        load_accessible_field(&state, &auth, field_id).await?;
    }

    let device = DeviceRepository::new(state.pool.clone())
        .update(device_id, &request)
        .await?
        .ok_or_else(device_not_found)?
        .into_domain();

    info!(id = %device.id, "Device updated");
    Ok(Json(device))
}

/// PUT /api/iot/devices/:id/status
pub async fn update_device_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(device_id): Path<Uuid>,
    Json(request): Json<UpdateDeviceStatusRequest>,
) -> Result<Json<Device>, ApiError> {
    let previous = load_accessible_device(&state, &auth, device_id).await?;

    let device = DeviceRepository::new(state.pool.clone())
        .update_status(device_id, request.status)
        .await?
        .ok_or_else(device_not_found)?
        .into_domain();

    info!(
        id = %device.id,
        from = %previous.status,
        to = %device.status,
        "Device status changed"
    );
    Ok(Json(device))
}

/// DELETE /api/iot/devices/:id
pub async fn delete_device(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(device_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    load_accessible_device(&state, &auth, device_id).await?;

    let deleted = DeviceRepository::new(state.pool.clone())
        .delete(device_id)
        .await?;
    if deleted == 0 {
        return Err(device_not_found());
    }

    info!(id = %device_id, "Device deleted");
    Ok(StatusCode::NO_CONTENT)
}
