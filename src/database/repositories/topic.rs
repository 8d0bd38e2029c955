//! SeaORM Topic repository implementation

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::debug;

use super::traits::Repository;
use crate::cache::{CacheRegion, QueryCache};
use crate::entities::{prelude::Topics, topics};
use crate::errors::{RepositoryError, RepositoryResult};
use crate::models::{Topic, TopicCreateRequest, TopicStatus, TopicUpdateRequest};

/// SeaORM-based repository for Topic operations
#[derive(Clone)]
pub struct TopicSeaOrmRepository {
    connection: Arc<DatabaseConnection>,
    cache: QueryCache,
}

impl TopicSeaOrmRepository {
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self {
            connection,
            cache: QueryCache::disabled(),
        }
    }

    /// Evict forum results from a cache shared with the forum repository on writes
    pub fn with_cache(mut self, cache: QueryCache) -> Self {
        self.cache = cache;
        self
    }

    /// Every topic currently in the forum, oldest first
    pub async fn find_by_forum(&self, forum_id: i32) -> RepositoryResult<Vec<Topic>> {
        let models = Topics::find()
            .filter(topics::Column::ForumId.eq(forum_id))
            .order_by_asc(topics::Column::Id)
            .all(&*self.connection)
            .await?;
        Ok(models.into_iter().map(Topic::from).collect())
    }
}

#[async_trait]
impl Repository<Topic, i32> for TopicSeaOrmRepository {
    type CreateRequest = TopicCreateRequest;
    type UpdateRequest = TopicUpdateRequest;

    /// Create an empty topic; its first and last post are filled in as posts arrive
    async fn add(&self, request: TopicCreateRequest) -> RepositoryResult<Topic> {
        RepositoryError::require_name("subject", &request.subject)?;

        let active_model = topics::ActiveModel {
            forum_id: Set(request.forum_id),
            subject: Set(request.subject),
            topic_type: Set(request.topic_type.as_i32()),
            status: Set(TopicStatus::Unlocked.as_i32()),
            views: Set(0),
            replies: Set(0),
            pending_moderation: Set(request.pending_moderation),
            moved_id: Set(None),
            first_post_id: Set(None),
            last_post_id: Set(None),
            user_id: Set(request.user_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        let model = active_model.insert(&*self.connection).await?;
        self.cache.evict_forums(&[model.forum_id]).await;
        debug!("Created topic {} in forum {}", model.id, model.forum_id);
        Ok(model.into())
    }

    async fn get(&self, id: i32) -> RepositoryResult<Option<Topic>> {
        let model = Topics::find_by_id(id).one(&*self.connection).await?;
        Ok(model.map(Topic::from))
    }

    async fn update(&self, id: i32, request: TopicUpdateRequest) -> RepositoryResult<Topic> {
        RepositoryError::require_name("subject", &request.subject)?;

        let model = Topics::find_by_id(id)
            .one(&*self.connection)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Topic", id))?;

        let mut active_model: topics::ActiveModel = model.into();
        active_model.subject = Set(request.subject);
        active_model.topic_type = Set(request.topic_type.as_i32());
        active_model.status = Set(request.status.as_i32());
        active_model.pending_moderation = Set(request.pending_moderation);

        let updated = active_model.update(&*self.connection).await?;
        self.cache.evict_forums(&updated.listing_forum_ids()).await;
        Ok(updated.into())
    }

    async fn remove(&self, id: i32) -> RepositoryResult<()> {
        let model = Topics::find_by_id(id)
            .one(&*self.connection)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Topic", id))?;

        Topics::delete_by_id(id).exec(&*self.connection).await?;
        self.cache.evict_forums(&model.listing_forum_ids()).await;
        self.cache.evict_region(CacheRegion::TOTAL_MESSAGES).await;
        Ok(())
    }
}
