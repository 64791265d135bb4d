use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;

use super::{Store, StoreError, StoreResult};
use crate::{
    auth::{
        guard::VehicleScope,
        repo_types::{NewUser, User},
    },
    inspections::repo_types::{Inspection, InspectionInput},
    vehicles::repo_types::{Vehicle, VehicleInput},
};

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: Vec<User>,
    vehicles: Vec<Vehicle>,
    inspections: Vec<Inspection>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Store kept in process memory, for tests.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> StoreResult<T> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| StoreError::Backend(anyhow::anyhow!("memory store poisoned")))?;
        Ok(f(&mut tables))
    }
}

fn latest_first(a: &Inspection, b: &Inspection) -> std::cmp::Ordering {
    b.date.cmp(&a.date).then(b.id.cmp(&a.id))
}

fn apply_inspection(target: &mut Inspection, input: InspectionInput) {
    target.date = input.date;
    target.front_left = input.front_left;
    target.front_right = input.front_right;
    target.rear_left = input.rear_left;
    target.rear_right = input.rear_right;
    target.notes = input.notes;
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        self.with(|t| {
            if t.users.iter().any(|u| u.email == user.email) {
                return Err(StoreError::DuplicateEmail);
            }
            let row = User {
                id: t.next_id(),
                name: user.name,
                email: user.email,
                phone: user.phone,
                role: user.role,
                password_hash: user.password_hash,
                created_at: OffsetDateTime::now_utc(),
            };
            t.users.push(row.clone());
            Ok(row)
        })?
    }

    async fn find_user(&self, id: i64) -> StoreResult<Option<User>> {
        self.with(|t| t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.with(|t| t.users.iter().find(|u| u.email == email).cloned())
    }

    async fn delete_user(&self, id: i64) -> StoreResult<bool> {
        self.with(|t| {
            let before = t.users.len();
            t.users.retain(|u| u.id != id);
            if t.users.len() == before {
                return false;
            }
            let owned: Vec<i64> = t
                .vehicles
                .iter()
                .filter(|v| v.user_id == id)
                .map(|v| v.id)
                .collect();
            t.vehicles.retain(|v| v.user_id != id);
            t.inspections.retain(|i| !owned.contains(&i.car_id));
            true
        })
    }

    async fn list_vehicles(&self, scope: VehicleScope) -> StoreResult<Vec<Vehicle>> {
        self.with(|t| {
            t.vehicles
                .iter()
                .filter(|v| scope.includes(v.user_id))
                .cloned()
                .collect()
        })
    }

    async fn find_vehicle(&self, id: i64) -> StoreResult<Option<Vehicle>> {
        self.with(|t| t.vehicles.iter().find(|v| v.id == id).cloned())
    }

    async fn create_vehicle(&self, owner_id: i64, input: VehicleInput) -> StoreResult<Vehicle> {
        self.with(|t| {
            let row = Vehicle {
                id: t.next_id(),
                user_id: owner_id,
                make: input.make,
                model: input.model,
                year: input.year,
                plate: input.plate,
            };
            t.vehicles.push(row.clone());
            row
        })
    }

    async fn update_vehicle(&self, id: i64, input: VehicleInput) -> StoreResult<Option<Vehicle>> {
        self.with(|t| {
            let v = t.vehicles.iter_mut().find(|v| v.id == id)?;
            v.make = input.make;
            v.model = input.model;
            v.year = input.year;
            v.plate = input.plate;
            Some(v.clone())
        })
    }

    async fn delete_vehicle(&self, id: i64) -> StoreResult<bool> {
        self.with(|t| {
            let before = t.vehicles.len();
            t.vehicles.retain(|v| v.id != id);
            t.inspections.retain(|i| i.car_id != id);
            t.vehicles.len() != before
        })
    }

    async fn list_inspections(&self, car_id: i64) -> StoreResult<Vec<Inspection>> {
        self.with(|t| {
            let mut rows: Vec<Inspection> = t
                .inspections
                .iter()
                .filter(|i| i.car_id == car_id)
                .cloned()
                .collect();
            rows.sort_by(latest_first);
            rows
        })
    }

    async fn find_inspection(&self, id: i64) -> StoreResult<Option<Inspection>> {
        self.with(|t| t.inspections.iter().find(|i| i.id == id).cloned())
    }

    async fn create_inspection(
        &self,
        car_id: i64,
        input: InspectionInput,
    ) -> StoreResult<Inspection> {
        self.with(|t| {
            if !t.vehicles.iter().any(|v| v.id == car_id) {
                return Err(StoreError::Backend(anyhow::anyhow!(
                    "car {car_id} does not exist"
                )));
            }
            let row = Inspection {
                id: t.next_id(),
                car_id,
                date: input.date,
                front_left: input.front_left,
                front_right: input.front_right,
                rear_left: input.rear_left,
                rear_right: input.rear_right,
                notes: input.notes,
            };
            t.inspections.push(row.clone());
            Ok(row)
        })?
    }

    async fn update_inspection(
        &self,
        id: i64,
        input: InspectionInput,
    ) -> StoreResult<Option<Inspection>> {
        self.with(|t| {
            let row = t.inspections.iter_mut().find(|i| i.id == id)?;
            apply_inspection(row, input);
            Some(row.clone())
        })
    }

    async fn delete_inspection(&self, id: i64) -> StoreResult<bool> {
        self.with(|t| {
            let before = t.inspections.len();
            t.inspections.retain(|i| i.id != id);
            t.inspections.len() != before
        })
    }

    async fn count_inspections_for_owner(&self, user_id: i64) -> StoreResult<i64> {
        self.with(|t| {
            let owned: Vec<i64> = t
                .vehicles
                .iter()
                .filter(|v| v.user_id == user_id)
                .map(|v| v.id)
                .collect();
            t.inspections
                .iter()
                .filter(|i| owned.contains(&i.car_id))
                .count() as i64
        })
    }

    async fn latest_inspection(&self, car_id: i64) -> StoreResult<Option<Inspection>> {
        self.with(|t| {
            t.inspections
                .iter()
                .filter(|i| i.car_id == car_id)
                .min_by(|a, b| latest_first(a, b))
                .cloned()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::repo_types::Role, inspections::repo_types::TyreCondition};
    use time::macros::datetime;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Ann".into(),
            email: email.into(),
            phone: "555-0100".into(),
            role: Role::User,
            password_hash: "hash".into(),
        }
    }

    fn car() -> VehicleInput {
        VehicleInput {
            make: "Skoda".into(),
            model: "Octavia".into(),
            year: 2019,
            plate: "KR 12345".into(),
        }
    }

    fn inspection_at(date: OffsetDateTime) -> InspectionInput {
        InspectionInput {
            date,
            front_left: TyreCondition::Good,
            front_right: TyreCondition::Good,
            rear_left: TyreCondition::Good,
            rear_right: TyreCondition::Good,
            notes: None,
        }
    }

    #[tokio::test]
    async fn rejects_duplicate_email_and_keeps_first_user() {
        let store = MemoryStore::new();
        let first = store.create_user(new_user("a@x.com")).await.unwrap();
        let err = store.create_user(new_user("a@x.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
        let found = store.find_user_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(found.id, first.id);
    }

    #[tokio::test]
    async fn email_lookup_is_case_sensitive() {
        let store = MemoryStore::new();
        store.create_user(new_user("a@x.com")).await.unwrap();
        assert!(store.find_user_by_email("A@x.com").await.unwrap().is_none());
        assert!(store.create_user(new_user("A@x.com")).await.is_ok());
    }

    #[tokio::test]
    async fn deleting_user_cascades_to_vehicles_and_inspections() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("a@x.com")).await.unwrap();
        let v = store.create_vehicle(user.id, car()).await.unwrap();
        let i = store
            .create_inspection(v.id, inspection_at(datetime!(2024-01-01 0:00 UTC)))
            .await
            .unwrap();

        assert!(store.delete_user(user.id).await.unwrap());
        assert!(store.find_vehicle(v.id).await.unwrap().is_none());
        assert!(store.find_inspection(i.id).await.unwrap().is_none());
        assert!(!store.delete_user(user.id).await.unwrap());
    }

    #[tokio::test]
    async fn latest_inspection_breaks_date_ties_by_highest_id() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("a@x.com")).await.unwrap();
        let v = store.create_vehicle(user.id, car()).await.unwrap();
        let when = datetime!(2024-03-01 12:00 UTC);
        store.create_inspection(v.id, inspection_at(when)).await.unwrap();
        let second = store.create_inspection(v.id, inspection_at(when)).await.unwrap();
        store
            .create_inspection(v.id, inspection_at(datetime!(2023-12-31 0:00 UTC)))
            .await
            .unwrap();

        let latest = store.latest_inspection(v.id).await.unwrap().unwrap();
        assert_eq!(latest.id, second.id);

        let listed = store.list_inspections(v.id).await.unwrap();
        assert_eq!(listed.first().map(|i| i.id), Some(second.id));
        assert_eq!(listed.len(), 3);
    }
}
