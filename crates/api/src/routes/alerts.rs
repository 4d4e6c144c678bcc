//! IoT alert handlers and the acknowledge/resolve/false-alarm workflow.

use axum::{extract::State, http::StatusCode};
use domain::models::iot_alert::{
    AlertStatus, CreateAlertRequest, IotAlert, ListAlertsQuery, ListAlertsResponse,
    ResolveAlertRequest,
};
use persistence::repositories::{AlertFilter, DeviceRepository, FieldRepository, IotAlertRepository};
use shared::pagination::{normalize_page, PageInfo};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AuthUser, Json, Path, Query};
use crate::middleware::metrics::record_alert_raised;
use crate::routes::devices::load_accessible_device;
use crate::routes::fields::load_accessible_field;

fn alert_not_found() -> ApiError {
    ApiError::NotFound("Alert not found".to_string())
}

/// An alert is visible to the owner of its device or of its field. Alerts
/// with neither reference are admin-only.
async fn ensure_alert_access(
    state: &AppState,
    auth: &AuthUser,
    alert: &IotAlert,
) -> Result<(), ApiError> {
    if auth.is_admin() {
        return Ok(());
    }

    if let Some(device_id) = alert.device_id {
        let device = DeviceRepository::new(state.pool.clone())
            .find_by_id(device_id)
            .await?;
        if device.is_some_and(|d| d.owner_id == auth.user_id) {
            return Ok(());
        }
    }

    if let Some(field_id) = alert.field_id {
        let field = FieldRepository::new(state.pool.clone())
            .find_by_id(field_id)
            .await?;
        if field.is_some_and(|f| f.owner_id == auth.user_id) {
            return Ok(());
        }
    }

    Err(ApiError::Forbidden("Access denied".to_string()))
}

async fn load_accessible_alert(
    state: &AppState,
    auth: &AuthUser,
    alert_id: Uuid,
) -> Result<IotAlert, ApiError> {
    let alert = IotAlertRepository::new(state.pool.clone())
        .find_by_id(alert_id)
        .await?
        .ok_or_else(alert_not_found)?
        .into_domain();

    ensure_alert_access(state, auth, &alert).await?;
    Ok(alert)
}

/// Applies a status change as a conditional update. When the update matches
/// nothing the alert is re-read to explain why.
async fn transition(
    state: &AppState,
    auth: &AuthUser,
    alert_id: Uuid,
    target: AlertStatus,
    resolution_notes: Option<&str>,
) -> Result<IotAlert, ApiError> {
    let alert = load_accessible_alert(state, auth, alert_id).await?;
    alert.status.check_transition(target)?;

    let repo = IotAlertRepository::new(state.pool.clone());
    if let Some(updated) = repo
        .transition(alert_id, target, auth.user_id, resolution_notes)
        .await?
    {
        let updated = updated.into_domain();
        info!(
            alert_id = %alert_id,
            from = %alert.status,
            to = %updated.status,
            actor = %auth.user_id,
            "Alert status changed"
        );
        return Ok(updated);
    }

    // Lost a race with another writer or a delete.
    let current = repo.find_by_id(alert_id).await?.ok_or_else(alert_not_found)?;
    current.status().check_transition(target)?;
    Err(ApiError::Conflict(
        "Alert was modified concurrently, retry the request".to_string(),
    ))
}

/// POST /api/iot/alerts
pub async fn create_alert(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateAlertRequest>,
) -> Result<(StatusCode, Json<IotAlert>), ApiError> {
    request.validate()?;

    if let Some(device_id) = request.device_id {
        load_accessible_device(&state, &auth, device_id).await?;
    }
    if let Some(field_id) = request.field_id {
        load_accessible_field(&state, &auth, field_id).await?;
    }

    let alert = IotAlertRepository::new(state.pool.clone())
        .create(&request)
        .await?
        .into_domain();

    record_alert_raised(alert.severity.as_str());
    info!(
        alert_id = %alert.id,
        alert_type = %alert.alert_type,
        severity = %alert.severity,
        device_id = ?alert.device_id,
        "Alert created"
    );

    Ok((StatusCode::CREATED, Json(alert)))
}

/// GET /api/iot/alerts
pub async fn list_alerts(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListAlertsQuery>,
) -> Result<Json<ListAlertsResponse>, ApiError> {
    let limits = &state.config.limits;
    let (page, limit, offset) = normalize_page(
        query.page,
        query.limit,
        limits.default_page_size,
        limits.max_page_size,
    );

    let filter = AlertFilter {
        visible_to: auth.owner_filter(),
        device_id: query.device_id,
        field_id: query.field_id,
        alert_type: query.alert_type,
        severity: query.severity,
        status: query.status,
        from: query.from,
        to: query.to,
    };

    let (entities, total) = IotAlertRepository::new(state.pool.clone())
        .list(&filter, limit, offset)
        .await?;

    Ok(Json(ListAlertsResponse {
        alerts: entities.into_iter().map(IotAlert::from).collect(),
        pagination: PageInfo::new(total, page, limit),
    }))
}

/// PUT /api/iot/alerts/:id/acknowledge
pub async fn acknowledge_alert(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(alert_id): Path<Uuid>,
) -> Result<Json<IotAlert>, ApiError> {
    let alert = transition(&state, &auth, alert_id, AlertStatus::Acknowledged, None).await?;
    Ok(Json(alert))
}

/// PUT /api/iot/alerts/:id/resolve
pub async fn resolve_alert(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(alert_id): Path<Uuid>,
    Json(request): Json<ResolveAlertRequest>,
) -> Result<Json<IotAlert>, ApiError> {
    request.validate()?;
    let notes = request.resolution_notes.trim();
    if notes.is_empty() {
        return Err(ApiError::Validation("Resolution notes are required".to_string()));
    }
    let alert = transition(&state, &auth, alert_id, AlertStatus::Resolved, Some(notes)).await?;
    Ok(Json(alert))
}

/// PUT /api/iot/alerts/:id/false-alarm
pub async fn mark_false_alarm(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(alert_id): Path<Uuid>,
) -> Result<Json<IotAlert>, ApiError> {
    let alert = transition(&state, &auth, alert_id, AlertStatus::FalseAlarm, None).await?;
    Ok(Json(alert))
}

/// DELETE /api/iot/alerts/:id
pub async fn delete_alert(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(alert_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    load_accessible_alert(&state, &auth, alert_id).await?;

    let deleted = IotAlertRepository::new(state.pool.clone())
        .delete(alert_id)
        .await?;
    if deleted == 0 {
        return Err(alert_not_found());
    }

    info!(alert_id = %alert_id, "Alert deleted");
    Ok(StatusCode::NO_CONTENT)
}
