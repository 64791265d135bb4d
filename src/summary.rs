//! Per-user counters shown on the profile.

use serde::Serialize;
use tracing::debug;

use crate::{
    auth::guard::VehicleScope,
    store::{Store, StoreResult},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub cars_assigned: i64,
    pub inspections_total: i64,
    /// Owned cars whose latest inspection has a bad wheel. Cars never
    /// inspected are not counted.
    pub failed_cars: i64,
}

/// One "latest inspection" lookup per owned car.
pub async fn summarize(store: &dyn Store, user_id: i64) -> StoreResult<UserSummary> {
    let cars = store.list_vehicles(VehicleScope::OwnedBy(user_id)).await?;
    if cars.is_empty() {
        return Ok(UserSummary::default());
    }

    let inspections_total = store.count_inspections_for_owner(user_id).await?;

    let mut failed_cars = 0;
    for car in &cars {
        if let Some(last) = store.latest_inspection(car.id).await? {
            if last.is_failing() {
                failed_cars += 1;
            }
        }
    }

    let summary = UserSummary {
        cars_assigned: cars.len() as i64,
        inspections_total,
        failed_cars,
    };
    debug!(user_id, ?summary, "profile summary");
    Ok(summary)
}
