use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    repo_types::{Inspection, InspectionInput},
    services::load_inspection_for,
};
use crate::{
    auth::{dto::StatusResponse, extractors::CurrentUser},
    error::ApiError,
    extract::{JsonBody, PathParam},
    state::AppState,
    vehicles::services::load_vehicle_for,
};

/// `GET`/`POST` take a car id; `PUT`/`DELETE` take an inspection id.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/inspections/:id",
        get(list_inspections)
            .post(create_inspection)
            .put(update_inspection)
            .delete(delete_inspection),
    )
}

#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn list_inspections(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathParam(car_id): PathParam<i64>,
) -> Result<Json<Vec<Inspection>>, ApiError> {
    load_vehicle_for(state.store.as_ref(), &user, car_id).await?;
    let rows = state.store.list_inspections(car_id).await?;
    Ok(Json(rows))
}

#[instrument(skip(state, user, payload), fields(user_id = user.id))]
pub async fn create_inspection(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathParam(car_id): PathParam<i64>,
    JsonBody(payload): JsonBody<InspectionInput>,
) -> Result<Json<Inspection>, ApiError> {
    load_vehicle_for(state.store.as_ref(), &user, car_id).await?;
    let row = state.store.create_inspection(car_id, payload).await?;
    info!(car_id, inspection_id = row.id, failing = row.is_failing(), "inspection recorded");
    Ok(Json(row))
}

#[instrument(skip(state, user, payload), fields(user_id = user.id))]
pub async fn update_inspection(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathParam(inspection_id): PathParam<i64>,
    JsonBody(payload): JsonBody<InspectionInput>,
) -> Result<Json<Inspection>, ApiError> {
    load_inspection_for(state.store.as_ref(), &user, inspection_id).await?;
    let row = state
        .store
        .update_inspection(inspection_id, payload)
        .await?
        .ok_or(ApiError::NotFound("Inspection not found"))?;
    info!(inspection_id, "inspection updated");
    Ok(Json(row))
}

#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn delete_inspection(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathParam(inspection_id): PathParam<i64>,
) -> Result<Json<StatusResponse>, ApiError> {
    load_inspection_for(state.store.as_ref(), &user, inspection_id).await?;
    if !state.store.delete_inspection(inspection_id).await? {
        return Err(ApiError::NotFound("Inspection not found"));
    }
    info!(inspection_id, "inspection deleted");
    Ok(Json(StatusResponse::deleted()))
}
