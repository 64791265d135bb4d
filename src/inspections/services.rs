use super::repo_types::Inspection;
use crate::{
    auth::repo_types::User, error::ApiError, store::Store,
    vehicles::services::load_vehicle_for,
};

/// Inspection counterpart of [`load_vehicle_for`]: the inspection must exist,
/// then its parent car must exist and pass the guard.
pub async fn load_inspection_for(
    store: &dyn Store,
    identity: &User,
    inspection_id: i64,
) -> Result<Inspection, ApiError> {
    let inspection = store
        .find_inspection(inspection_id)
        .await?
        .ok_or(ApiError::NotFound("Inspection not found"))?;
    load_vehicle_for(store, identity, inspection.car_id).await?;
    Ok(inspection)
}
