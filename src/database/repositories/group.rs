//! SeaORM Group repository implementation
//!
//! Groups carry named roles; each role holds a list of integer values that
//! scope it. A `moderate_forum` role lists the forum ids the group moderates.

use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait};
use std::sync::Arc;
use tracing::info;

use crate::cache::{CacheRegion, QueryCache};
use crate::entities::{groups, prelude::*, role_values, roles};
use crate::errors::{RepositoryError, RepositoryResult};
use crate::models::{Group, GroupCreateRequest, MODERATE_FORUM_ROLE};

/// SeaORM-based repository for Group operations
#[derive(Clone)]
pub struct GroupSeaOrmRepository {
    connection: Arc<DatabaseConnection>,
    cache: QueryCache,
}

impl GroupSeaOrmRepository {
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self {
            connection,
            cache: QueryCache::disabled(),
        }
    }

    pub fn with_cache(mut self, cache: QueryCache) -> Self {
        self.cache = cache;
        self
    }

    pub async fn add(&self, request: GroupCreateRequest) -> RepositoryResult<Group> {
        RepositoryError::require_name("name", &request.name)?;

        let model = groups::ActiveModel {
            name: Set(request.name),
            description: Set(request.description),
            ..Default::default()
        }
        .insert(&*self.connection)
        .await?;
        Ok(model.into())
    }

    pub async fn get(&self, id: i32) -> RepositoryResult<Option<Group>> {
        let model = Groups::find_by_id(id).one(&*self.connection).await?;
        Ok(model.map(Group::from))
    }

    /// Grant the group a role scoped to the given values
    pub async fn grant_role(
        &self,
        group_id: i32,
        name: &str,
        values: &[i32],
    ) -> RepositoryResult<()> {
        RepositoryError::require_name("role name", name)?;

        let txn = self.connection.begin().await?;

        if Groups::find_by_id(group_id).one(&txn).await?.is_none() {
            return Err(RepositoryError::not_found("Group", group_id));
        }

        let role = roles::ActiveModel {
            group_id: Set(group_id),
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for value in values {
            role_values::ActiveModel {
                role_id: Set(role.id),
                value: Set(*value),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;

        if name == MODERATE_FORUM_ROLE {
            self.cache.evict_region(CacheRegion::MODERATORS).await;
        }
        info!(
            "Granted role '{}' to group {} for {} value(s)",
            name,
            group_id,
            values.len()
        );
        Ok(())
    }
}
