//! Role + ownership policy shared by every vehicle and inspection operation.
//!
//! Admins may touch anything; everyone else only what they own. For an
//! inspection the owner is the owner of its parent vehicle.

use tracing::warn;

use super::repo_types::{Role, User};
use crate::error::ApiError;

/// Pure decision: may `identity` act on a resource owned by `owner_id`?
pub fn can_access(identity: &User, owner_id: i64) -> bool {
    match identity.role {
        Role::Admin => true,
        Role::User => identity.id == owner_id,
    }
}

/// [`can_access`] as a handler step; denial becomes `Forbidden`.
pub fn authorize(identity: &User, owner_id: i64) -> Result<(), ApiError> {
    if can_access(identity, owner_id) {
        Ok(())
    } else {
        warn!(user_id = identity.id, owner_id, "access denied");
        Err(ApiError::Forbidden)
    }
}

/// Which vehicles a listing may return. Equivalent to filtering every vehicle
/// through [`can_access`], but pushed down into the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleScope {
    All,
    OwnedBy(i64),
}

impl VehicleScope {
    pub fn for_identity(identity: &User) -> Self {
        match identity.role {
            Role::Admin => VehicleScope::All,
            Role::User => VehicleScope::OwnedBy(identity.id),
        }
    }

    /// In-memory form of the listing filter.
    #[cfg(test)]
    pub fn includes(&self, owner_id: i64) -> bool {
        match self {
            VehicleScope::All => true,
            VehicleScope::OwnedBy(id) => *id == owner_id,
        }
    }
}
