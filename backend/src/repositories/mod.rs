//! Persistence contracts and their database-backed implementations.

pub mod user_repository;

use crate::database::models::{CreateUser, User, UserFilter, UserPatch};
use crate::errors::ServiceResult;
use async_trait::async_trait;

/// Durable user-record store consumed by the lifecycle service.
///
/// Soft-deleted rows are invisible through this interface: `find_one` never
/// returns them and `update` treats them as missing.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Looks up a single user, OR-matching the identifiers in `filter`.
    ///
    /// Fails with a validation error when the filter carries no identifier.
    async fn find_one(&self, filter: UserFilter) -> ServiceResult<Option<User>>;

    /// Inserts a new user row.
    async fn create(&self, draft: CreateUser) -> ServiceResult<User>;

    /// Applies `patch` to the row matching `id`.
    ///
    /// Fails with `NotFound` when no non-deleted row matches.
    async fn update(&self, id: &str, patch: UserPatch) -> ServiceResult<User>;
}
