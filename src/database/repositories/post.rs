//! SeaORM Post repository implementation
//!
//! Posts keep their topic's first/last post references and reply counter in
//! step: every write that touches them runs in the same transaction.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::debug;

use super::traits::Repository;
use crate::cache::{CacheRegion, QueryCache};
use crate::entities::{posts, prelude::*, topics};
use crate::errors::{RepositoryError, RepositoryResult};
use crate::models::{Post, PostCreateRequest, PostUpdateRequest};

/// SeaORM-based repository for Post operations
#[derive(Clone)]
pub struct PostSeaOrmRepository {
    connection: Arc<DatabaseConnection>,
    cache: QueryCache,
}

impl PostSeaOrmRepository {
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

    /// Posts of a topic in posting order
    pub async fn find_by_topic(&self, topic_id: i32) -> RepositoryResult<Vec<Post>> {
        let models = Posts::find()
            .filter(posts::Column::TopicId.eq(topic_id))
            .order_by_asc(posts::Column::Id)
            .all(&*self.connection)
            .await?;
        Ok(models.into_iter().map(Post::from).collect())
    }

    /// Drop cached results of every forum listing the post's topic, plus the board total
    async fn evict_listings(&self, post: &posts::Model, topic: Option<&topics::Model>) {
        let forum_ids = topic.map_or_else(|| vec![post.forum_id], |t| t.listing_forum_ids());
        self.cache.evict_forums(&forum_ids).await;
        self.cache.evict_region(CacheRegion::TOTAL_MESSAGES).await;
    }
}

#[async_trait]
impl Repository<Post, i32> for PostSeaOrmRepository {
    type CreateRequest = PostCreateRequest;
    type UpdateRequest = PostUpdateRequest;

    /// Append a post to its topic, inheriting the topic's forum
    async fn add(&self, request: PostCreateRequest) -> RepositoryResult<Post> {
        let txn = self.connection.begin().await?;

        let topic = Topics::find_by_id(request.topic_id)
            .one(&txn)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Topic", request.topic_id))?;

        let post = posts::ActiveModel {
            topic_id: Set(topic.id),
            forum_id: Set(topic.forum_id),
            user_id: Set(request.user_id),
            subject: Set(request.subject),
            text: Set(request.text),
            date: Set(request.date.unwrap_or_else(Utc::now)),
            moderate: Set(request.moderate),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let is_first_post = topic.first_post_id.is_none();
        let replies = if is_first_post {
            topic.replies
        } else {
            topic.replies + 1
        };

        let listed_in = topic.clone();
        let mut topic_model: topics::ActiveModel = topic.into();
        if is_first_post {
            topic_model.first_post_id = Set(Some(post.id));
        }
        topic_model.last_post_id = Set(Some(post.id));
        topic_model.replies = Set(replies);
        topic_model.update(&txn).await?;

        txn.commit().await?;

        self.evict_listings(&post, Some(&listed_in)).await;
        debug!("Created post {} in topic {}", post.id, post.topic_id);
        Ok(post.into())
    }

    async fn get(&self, id: i32) -> RepositoryResult<Option<Post>> {
        let model = Posts::find_by_id(id).one(&*self.connection).await?;
        Ok(model.map(Post::from))
    }

    async fn update(&self, id: i32, request: PostUpdateRequest) -> RepositoryResult<Post> {
        let model = Posts::find_by_id(id)
            .one(&*self.connection)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Post", id))?;

        let mut active_model: posts::ActiveModel = model.into();
        active_model.subject = Set(request.subject);
        active_model.text = Set(request.text);
        active_model.moderate = Set(request.moderate);

        let updated = active_model.update(&*self.connection).await?;
        let topic = Topics::find_by_id(updated.topic_id)
            .one(&*self.connection)
            .await?;
        self.evict_listings(&updated, topic.as_ref()).await;
        Ok(updated.into())
    }

    /// Delete a post, moving its topic's first/last references to the neighbouring posts
    async fn remove(&self, id: i32) -> RepositoryResult<()> {
        let txn = self.connection.begin().await?;

        let post = Posts::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Post", id))?;
        Posts::delete_by_id(id).exec(&txn).await?;

        let topic = Topics::find_by_id(post.topic_id).one(&txn).await?;
        if let Some(topic) = topic.clone() {
            let first = Posts::find()
                .filter(posts::Column::TopicId.eq(topic.id))
                .order_by_asc(posts::Column::Id)
                .one(&txn)
                .await?;
            let last = Posts::find()
                .filter(posts::Column::TopicId.eq(topic.id))
                .order_by_desc(posts::Column::Id)
                .one(&txn)
                .await?;

            let remaining = Posts::find()
                .filter(posts::Column::TopicId.eq(topic.id))
                .count(&txn)
                .await?;
            // The opener is not a reply
            let replies = remaining.saturating_sub(1) as i32;

            let mut topic_model: topics::ActiveModel = topic.into();
            topic_model.first_post_id = Set(first.map(|p| p.id));
            topic_model.last_post_id = Set(last.map(|p| p.id));
            topic_model.replies = Set(replies);
            topic_model.update(&txn).await?;
        }

        txn.commit().await?;

        self.evict_listings(&post, topic.as_ref()).await;
        Ok(())
    }
}
