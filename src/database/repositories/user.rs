//! SeaORM User repository implementation

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use std::sync::Arc;
use tracing::debug;

use crate::entities::{prelude::*, user_groups, users};
use crate::errors::{RepositoryError, RepositoryResult};
use crate::models::{User, UserCreateRequest};

/// SeaORM-based repository for User operations
#[derive(Clone)]
pub struct UserSeaOrmRepository {
    connection: Arc<DatabaseConnection>,
}

impl UserSeaOrmRepository {
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self { connection }
    }

    pub async fn add(&self, request: UserCreateRequest) -> RepositoryResult<User> {
        RepositoryError::require_name("username", &request.username)?;

        let model = users::ActiveModel {
            username: Set(request.username),
            email: Set(request.email),
            registration_date: Set(request.registration_date.unwrap_or_else(Utc::now)),
            ..Default::default()
        }
        .insert(&*self.connection)
        .await?;

        debug!("Registered user {} ({})", model.username, model.id);
        Ok(model.into())
    }

    pub async fn get(&self, id: i32) -> RepositoryResult<Option<User>> {
        let model = Users::find_by_id(id).one(&*self.connection).await?;
        Ok(model.map(User::from))
    }

    /// Make the user a member of the group
    pub async fn add_to_group(&self, user_id: i32, group_id: i32) -> RepositoryResult<()> {
        if Users::find_by_id(user_id)
            .one(&*self.connection)
            .await?
            .is_none()
        {
            return Err(RepositoryError::not_found("User", user_id));
        }
        if Groups::find_by_id(group_id)
            .one(&*self.connection)
            .await?
            .is_none()
        {
            return Err(RepositoryError::not_found("Group", group_id));
        }

        UserGroups::insert(user_groups::ActiveModel {
            user_id: Set(user_id),
            group_id: Set(group_id),
        })
        .exec_without_returning(&*self.connection)
        .await?;
        Ok(())
    }
}
