use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub id: i64,
    pub user_id: i64,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub plate: String,
}

/// Writable vehicle fields, shared by create and full update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleInput {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub plate: String,
}
