use tracing::debug;

use super::repo_types::{Vehicle, VehicleInput};
use crate::{
    auth::{guard::authorize, repo_types::User, services::require_non_blank},
    error::ApiError,
    store::Store,
};

/// Loads a vehicle the caller may act on: `NotFound` if it does not exist,
/// then `Forbidden` if the guard says no. Every vehicle operation and every
/// inspection operation goes through here.
pub async fn load_vehicle_for(
    store: &dyn Store,
    identity: &User,
    car_id: i64,
) -> Result<Vehicle, ApiError> {
    let vehicle = store
        .find_vehicle(car_id)
        .await?
        .ok_or(ApiError::NotFound("Car not found"))?;
    authorize(identity, vehicle.user_id)?;
    debug!(car_id, owner_id = vehicle.user_id, "vehicle access granted");
    Ok(vehicle)
}

pub fn validate(input: &VehicleInput) -> Result<(), ApiError> {
    require_non_blank("make", &input.make)?;
    require_non_blank("model", &input.model)?;
    require_non_blank("plate", &input.plate)?;
    Ok(())
}
