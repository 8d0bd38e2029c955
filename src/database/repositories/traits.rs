//! Common traits for SeaORM repository implementations

use async_trait::async_trait;

use crate::errors::RepositoryResult;

/// Generic persistence operations shared by the entity repositories
///
/// # Type Parameters
///
/// * `T` - The domain type returned to callers (e.g. `Forum`)
/// * `ID` - The identifier type
#[async_trait]
pub trait Repository<T, ID: Send + 'static>: Send + Sync {
    /// Request type for creating new entities
    type CreateRequest: Send;
    /// Request type for updating existing entities
    type UpdateRequest: Send;

    /// Insert a new entity and return it with its generated id
    async fn add(&self, request: Self::CreateRequest) -> RepositoryResult<T>;

    /// Find an entity by its id
    ///
    /// * `Ok(Some(T))` - Entity found
    /// * `Ok(None)` - Entity not found
    async fn get(&self, id: ID) -> RepositoryResult<Option<T>>;

    /// Update an existing entity; a missing id is `RepositoryError::NotFound`
    async fn update(&self, id: ID, request: Self::UpdateRequest) -> RepositoryResult<T>;

    /// Delete an entity; a missing id is `RepositoryError::NotFound`
    async fn remove(&self, id: ID) -> RepositoryResult<()>;
}
