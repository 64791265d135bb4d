use async_trait::async_trait;
use thiserror::Error;

use crate::{
    auth::{
        guard::VehicleScope,
        repo_types::{NewUser, User},
    },
    inspections::repo_types::{Inspection, InspectionInput},
    vehicles::repo_types::{Vehicle, VehicleInput},
};

#[cfg(test)]
pub mod memory;
pub mod postgres;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence seen by the request handlers.
///
/// Deleting a user removes its vehicles, and deleting a vehicle removes its
/// inspections; every implementation must uphold that cascade. "Latest"
/// inspection means highest `date`, ties broken by highest `id`.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    async fn find_user(&self, id: i64) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Returns false when no such user existed.
    async fn delete_user(&self, id: i64) -> StoreResult<bool>;

    async fn list_vehicles(&self, scope: VehicleScope) -> StoreResult<Vec<Vehicle>>;
    async fn find_vehicle(&self, id: i64) -> StoreResult<Option<Vehicle>>;
    async fn create_vehicle(&self, owner_id: i64, input: VehicleInput) -> StoreResult<Vehicle>;
    async fn update_vehicle(&self, id: i64, input: VehicleInput) -> StoreResult<Option<Vehicle>>;
    async fn delete_vehicle(&self, id: i64) -> StoreResult<bool>;

    /// Inspections of one vehicle, latest first.
    async fn list_inspections(&self, car_id: i64) -> StoreResult<Vec<Inspection>>;
    async fn find_inspection(&self, id: i64) -> StoreResult<Option<Inspection>>;
    async fn create_inspection(
        &self,
        car_id: i64,
        input: InspectionInput,
    ) -> StoreResult<Inspection>;
    async fn update_inspection(
        &self,
        id: i64,
        input: InspectionInput,
    ) -> StoreResult<Option<Inspection>>;
    async fn delete_inspection(&self, id: i64) -> StoreResult<bool>;

    async fn count_inspections_for_owner(&self, user_id: i64) -> StoreResult<i64>;
    async fn latest_inspection(&self, car_id: i64) -> StoreResult<Option<Inspection>>;
}
