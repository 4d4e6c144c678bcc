//! Edge gateway registry handlers.

use axum::{extract::State, http::StatusCode};
use domain::models::edge_device::{
    CreateEdgeDeviceRequest, EdgeDevice, ListEdgeDevicesResponse, SetConnectedDevicesRequest,
    UpdateEdgeDeviceRequest,
};
use persistence::repositories::{DeviceRepository, EdgeDeviceRepository};
use std::collections::HashSet;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AuthUser, Json, Path};
use crate::routes::fields::load_accessible_field;

fn edge_not_found() -> ApiError {
    ApiError::NotFound("Edge device not found".to_string())
}

async fn load_accessible_edge_device(
    state: &AppState,
    auth: &AuthUser,
    id: Uuid,
) -> Result<EdgeDevice, ApiError> {
    let edge: EdgeDevice = EdgeDeviceRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(edge_not_found)?
        .into();

    auth.ensure_access(edge.owner_id)?;
    Ok(edge)
}

/// POST /api/iot/edge-devices
pub async fn create_edge_device(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateEdgeDeviceRequest>,
) -> Result<(StatusCode, Json<EdgeDevice>), ApiError> {
    request.validate()?;

    if let Some(field_id) = request.field_id {
        load_accessible_field(&state, &auth, field_id).await?;
    }

    let edge: EdgeDevice = EdgeDeviceRepository::new(state.pool.clone())
        .create(auth.user_id, &request)
        .await
        .map_err(|e| match ApiError::from(e) {
            ApiError::Conflict(_) => {
                ApiError::Conflict("Edge device with this ID already exists".to_string())
            }
            other => other,
        })?
        .into();

    info!(
        id = %edge.id,
        device_id = %edge.device_id,
        device_type = %edge.device_type,
        "Edge device registered"
    );

    Ok((StatusCode::CREATED, Json(edge)))
}

/// GET /api/iot/edge-devices
pub async fn list_edge_devices(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ListEdgeDevicesResponse>, ApiError> {
    let edge_devices: Vec<EdgeDevice> = EdgeDeviceRepository::new(state.pool.clone())
        .list(auth.owner_filter())
        .await?
        .into_iter()
        .map(EdgeDevice::from)
        .collect();

    let total = edge_devices.len();
    Ok(Json(ListEdgeDevicesResponse {
        edge_devices,
        total,
    }))
}

/// GET /api/iot/edge-devices/:id
pub async fn get_edge_device(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<EdgeDevice>, ApiError> {
    Ok(Json(load_accessible_edge_device(&state, &auth, id).await?))
}

/// PUT /api/iot/edge-devices/:id
pub async fn update_edge_device(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateEdgeDeviceRequest>,
) -> Result<Json<EdgeDevice>, ApiError> {
    request.validate()?;
    request.validate_models()?;
    load_accessible_edge_device(&state, &auth, id).await?;

    if let Some(field_id) = request.field_id {
        load_accessible_field(&state, &auth, field_id).await?;
    }

    let edge: EdgeDevice = EdgeDeviceRepository::new(state.pool.clone())
        .update(id, &request)
        .await?
        .ok_or_else(edge_not_found)?
        .into();

    info!(id = %edge.id, "Edge device updated");
    Ok(Json(edge))
}

/// PUT /api/iot/edge-devices/:id/devices
///
/// Replaces the connected device list. Every listed device must exist and be
/// visible to the caller.
pub async fn set_connected_devices(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<SetConnectedDevicesRequest>,
) -> Result<Json<EdgeDevice>, ApiError> {
    request.validate()?;
    load_accessible_edge_device(&state, &auth, id).await?;

    let requested: HashSet<Uuid> = request.device_ids.iter().copied().collect();
    let devices = DeviceRepository::new(state.pool.clone())
        .find_by_ids(&request.device_ids)
        .await?;

    let found: HashSet<Uuid> = devices.iter().map(|d| d.id).collect();
    if let Some(missing) = requested.difference(&found).next() {
        return Err(ApiError::NotFound(format!("Device {} not found", missing)));
    }
    for device in &devices {
        auth.ensure_access(device.owner_id)?;
    }

    let edge: EdgeDevice = EdgeDeviceRepository::new(state.pool.clone())
        .set_connected_devices(id, &request.device_ids)
        .await?
        .ok_or_else(edge_not_found)?
        .into();

    info!(
        id = %edge.id,
        connected = edge.connected_devices.len(),
        "Edge device connections replaced"
    );
    Ok(Json(edge))
}

/// DELETE /api/iot/edge-devices/:id
pub async fn delete_edge_device(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    load_accessible_edge_device(&state, &auth, id).await?;

    let deleted = EdgeDeviceRepository::new(state.pool.clone())
        .delete(id)
        .await?;
    if deleted == 0 {
        return Err(edge_not_found());
    }

    info!(id = %id, "Edge device deleted");
    Ok(StatusCode::NO_CONTENT)
}
