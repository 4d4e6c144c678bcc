//! Device maintenance history. Entries are append-only.

use axum::{extract::State, http::StatusCode};
use domain::models::maintenance_log::{
    CreateMaintenanceLogRequest, ListMaintenanceQuery, ListMaintenanceResponse, MaintenanceLog,
};
use persistence::repositories::{MaintenanceFilter, MaintenanceLogRepository};
use shared::pagination::{normalize_page, PageInfo};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AuthUser, Json, Path, Query};
use crate::routes::devices::load_accessible_device;

/// POST /api/iot/devices/:id/maintenance
pub async fn create_maintenance_log(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(device_id): Path<Uuid>,
    Json(request): Json<CreateMaintenanceLogRequest>,
) -> Result<(StatusCode, Json<MaintenanceLog>), ApiError> {
    request.validate()?;
    load_accessible_device(&state, &auth, device_id).await?;

    let log: MaintenanceLog = MaintenanceLogRepository::new(state.pool.clone())
        .create(device_id, auth.user_id, &request)
        .await?
        .ok_or_else(|| ApiError::NotFound("Device not found".to_string()))?
        .into();

    info!(
        log_id = %log.id,
        device_id = %device_id,
        maintenance_type = %log.maintenance_type,
        performed_by = %log.performed_by,
        "Maintenance recorded"
    );

    Ok((StatusCode::CREATED, Json(log)))
}

/// GET /api/iot/devices/:id/maintenance
pub async fn list_maintenance_logs(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(device_id): Path<Uuid>,
    Query(query): Query<ListMaintenanceQuery>,
) -> Result<Json<ListMaintenanceResponse>, ApiError> {
    load_accessible_device(&state, &auth, device_id).await?;

    let limits = &state.config.limits;
    let (page, limit, offset) = normalize_page(
        query.page,
        query.limit,
        limits.default_page_size,
        limits.max_page_size,
    );

    let filter = MaintenanceFilter {
        maintenance_type: query.maintenance_type,
        performed_by: query.performed_by,
        from: query.from,
        to: query.to,
    };

    let (entities, total) = MaintenanceLogRepository::new(state.pool.clone())
        .list_for_device(device_id, &filter, limit, offset)
        .await?;

    Ok(Json(ListMaintenanceResponse {
        logs: entities.into_iter().map(MaintenanceLog::from).collect(),
        pagination: PageInfo::new(total, page, limit),
    }))
}
