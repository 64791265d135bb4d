use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    repo_types::{Vehicle, VehicleInput},
    services::{load_vehicle_for, validate},
};
use crate::{
    auth::{dto::StatusResponse, extractors::CurrentUser, guard::VehicleScope},
    error::ApiError,
    extract::{JsonBody, PathParam},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cars", get(list_cars).post(create_car))
        .route("/cars/:id", get(get_car).put(update_car).delete(delete_car))
}

/// Admins see every car, everyone else their own.
#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn list_cars(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Vehicle>>, ApiError> {
    let cars = state
        .store
        .list_vehicles(VehicleScope::for_identity(&user))
        .await?;
    Ok(Json(cars))
}

#[instrument(skip(state, user, payload), fields(user_id = user.id))]
pub async fn create_car(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(payload): JsonBody<VehicleInput>,
) -> Result<Json<Vehicle>, ApiError> {
    validate(&payload)?;
    let car = state.store.create_vehicle(user.id, payload).await?;
    info!(car_id = car.id, "car created");
    Ok(Json(car))
}

#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn get_car(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathParam(id): PathParam<i64>,
) -> Result<Json<Vehicle>, ApiError> {
    let car = load_vehicle_for(state.store.as_ref(), &user, id).await?;
    Ok(Json(car))
}

#[instrument(skip(state, user, payload), fields(user_id = user.id))]
pub async fn update_car(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathParam(id): PathParam<i64>,
    JsonBody(payload): JsonBody<VehicleInput>,
) -> Result<Json<Vehicle>, ApiError> {
    load_vehicle_for(state.store.as_ref(), &user, id).await?;
    validate(&payload)?;
    let car = state
        .store
        .update_vehicle(id, payload)
        .await?
        .ok_or(ApiError::NotFound("Car not found"))?;
    info!(car_id = id, "car updated");
    Ok(Json(car))
}

#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn delete_car(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathParam(id): PathParam<i64>,
) -> Result<Json<StatusResponse>, ApiError> {
    load_vehicle_for(state.store.as_ref(), &user, id).await?;
    if !state.store.delete_vehicle(id).await? {
        return Err(ApiError::NotFound("Car not found"));
    }
    info!(car_id = id, "car deleted");
    Ok(Json(StatusResponse::deleted()))
}
