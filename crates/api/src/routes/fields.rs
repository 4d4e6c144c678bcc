//! Field (land parcel) handlers.

use axum::{extract::State, http::StatusCode};
use domain::models::field::{CreateFieldRequest, Field, ListFieldsResponse};
use persistence::repositories::FieldRepository;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AuthUser, Json, Path};

/// Loads a field the caller owns (or any field, for admins).
pub(crate) async fn load_accessible_field(
    state: &AppState,
    auth: &AuthUser,
    field_id: Uuid,
) -> Result<Field, ApiError> {
    let field: Field = FieldRepository::new(state.pool.clone())
        .find_by_id(field_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Field not found".to_string()))?
        .into();

    auth.ensure_access(field.owner_id)?;
    Ok(field)
}

/// POST /api/fields
pub async fn create_field(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateFieldRequest>,
) -> Result<(StatusCode, Json<Field>), ApiError> {
    request.validate()?;

    let field: Field = FieldRepository::new(state.pool.clone())
        .create(
            auth.user_id,
            request.name.trim(),
            request.location.latitude,
            request.location.longitude,
            request.area_hectares,
        )
        .await?
        .into();

    info!(field_id = %field.id, owner_id = %field.owner_id, "Field created");
    Ok((StatusCode::CREATED, Json(field)))
}

/// GET /api/fields
pub async fn list_fields(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ListFieldsResponse>, ApiError> {
    let fields: Vec<Field> = FieldRepository::new(state.pool.clone())
        .list(auth.owner_filter())
        .await?
        .into_iter()
        .map(Field::from)
        .collect();

    let total = fields.len();
    Ok(Json(ListFieldsResponse { fields, total }))
}

/// GET /api/fields/:id
pub async fn get_field(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(field_id): Path<Uuid>,
) -> Result<Json<Field>, ApiError> {
    Ok(Json(load_accessible_field(&state, &auth, field_id).await?))
}

/// DELETE /api/fields/:id
pub async fn delete_field(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(field_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    load_accessible_field(&state, &auth, field_id).await?;

    let deleted = FieldRepository::new(state.pool.clone())
        .delete(field_id)
        .await?;
    if deleted == 0 {
        return Err(ApiError::NotFound("Field not found".to_string()));
    }

    info!(field_id = %field_id, "Field deleted");
    Ok(StatusCode::NO_CONTENT)
}
