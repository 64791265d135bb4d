use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};

use super::{Store, StoreError, StoreResult};
use crate::{
    auth::{
        guard::VehicleScope,
        repo_types::{NewUser, User},
    },
    inspections::repo_types::{Inspection, InspectionInput},
    vehicles::repo_types::{Vehicle, VehicleInput},
};

const USER_COLUMNS: &str = "id, name, email, phone, role, password_hash, created_at";
const VEHICLE_COLUMNS: &str = "id, user_id, make, model, year, plate";
const INSPECTION_COLUMNS: &str =
    "id, car_id, date, front_left, front_right, rear_left, rear_right, notes";

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if is_unique_violation(&err) {
            return StoreError::DuplicateEmail;
        }
        StoreError::Backend(err.into())
    }
}

/// The only unique constraint in the schema is `users.email`.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { db })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let row = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, phone, role, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(user.role)
        .bind(&user.password_hash)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn find_user(&self, id: i64) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete_user(&self, id: i64) -> StoreResult<bool> {
        // cars and inspections go with it via ON DELETE CASCADE
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_vehicles(&self, scope: VehicleScope) -> StoreResult<Vec<Vehicle>> {
        let rows = match scope {
            VehicleScope::All => {
                sqlx::query_as::<_, Vehicle>(&format!(
                    "SELECT {VEHICLE_COLUMNS} FROM cars ORDER BY id"
                ))
                .fetch_all(&self.db)
                .await?
            }
            VehicleScope::OwnedBy(user_id) => {
                sqlx::query_as::<_, Vehicle>(&format!(
                    "SELECT {VEHICLE_COLUMNS} FROM cars WHERE user_id = $1 ORDER BY id"
                ))
                .bind(user_id)
                .fetch_all(&self.db)
                .await?
            }
        };
        Ok(rows)
    }

    async fn find_vehicle(&self, id: i64) -> StoreResult<Option<Vehicle>> {
        let row = sqlx::query_as::<_, Vehicle>(&format!(
            "SELECT {VEHICLE_COLUMNS} FROM cars WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn create_vehicle(&self, owner_id: i64, input: VehicleInput) -> StoreResult<Vehicle> {
        let row = sqlx::query_as::<_, Vehicle>(&format!(
            r#"
            INSERT INTO cars (user_id, make, model, year, plate)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {VEHICLE_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(&input.make)
        .bind(&input.model)
        .bind(input.year)
        .bind(&input.plate)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn update_vehicle(&self, id: i64, input: VehicleInput) -> StoreResult<Option<Vehicle>> {
        let row = sqlx::query_as::<_, Vehicle>(&format!(
            r#"
            UPDATE cars
               SET make = $2, model = $3, year = $4, plate = $5
             WHERE id = $1
            RETURNING {VEHICLE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&input.make)
        .bind(&input.model)
        .bind(input.year)
        .bind(&input.plate)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete_vehicle(&self, id: i64) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM cars WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_inspections(&self, car_id: i64) -> StoreResult<Vec<Inspection>> {
        let rows = sqlx::query_as::<_, Inspection>(&format!(
            r#"
            SELECT {INSPECTION_COLUMNS}
              FROM inspections
             WHERE car_id = $1
             ORDER BY date DESC, id DESC
            "#
        ))
        .bind(car_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_inspection(&self, id: i64) -> StoreResult<Option<Inspection>> {
        let row = sqlx::query_as::<_, Inspection>(&format!(
            "SELECT {INSPECTION_COLUMNS} FROM inspections WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn create_inspection(
        &self,
        car_id: i64,
        input: InspectionInput,
    ) -> StoreResult<Inspection> {
        let row = sqlx::query_as::<_, Inspection>(&format!(
            r#"
            INSERT INTO inspections
                (car_id, date, front_left, front_right, rear_left, rear_right, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {INSPECTION_COLUMNS}
            "#
        ))
        .bind(car_id)
        .bind(input.date)
        .bind(input.front_left)
        .bind(input.front_right)
        .bind(input.rear_left)
        .bind(input.rear_right)
        .bind(&input.notes)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn update_inspection(
        &self,
        id: i64,
        input: InspectionInput,
    ) -> StoreResult<Option<Inspection>> {
        let row = sqlx::query_as::<_, Inspection>(&format!(
            r#"
            UPDATE inspections
               SET date = $2, front_left = $3, front_right = $4,
                   rear_left = $5, rear_right = $6, notes = $7
             WHERE id = $1
            RETURNING {INSPECTION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(input.date)
        .bind(input.front_left)
        .bind(input.front_right)
        .bind(input.rear_left)
        .bind(input.rear_right)
        .bind(&input.notes)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete_inspection(&self, id: i64) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM inspections WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn count_inspections_for_owner(&self, user_id: i64) -> StoreResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
              FROM inspections i
              JOIN cars c ON c.id = i.car_id
             WHERE c.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;
        Ok(count)
    }

    async fn latest_inspection(&self, car_id: i64) -> StoreResult<Option<Inspection>> {
        let row = sqlx::query_as::<_, Inspection>(&format!(
            r#"
            SELECT {INSPECTION_COLUMNS}
              FROM inspections
             WHERE car_id = $1
             ORDER BY date DESC, id DESC
             LIMIT 1
            "#
        ))
        .bind(car_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }
}
