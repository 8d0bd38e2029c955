//! SeaORM Forum repository implementation
//!
//! Query façade over forums and the topics/posts they contain: listings,
//! moderation queues, counters and board statistics. Hot counters and the
//! first page of each topic listing are kept in the shared `QueryCache`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Alias, Expr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{debug, info};

use super::traits::Repository;
use crate::cache::{CacheKey, CacheRegion, CachedValue, QueryCache};
use crate::config::ForumConfig;
use crate::entities::{
    forums, groups, posts, prelude::*, role_values, roles, topics, user_groups, users,
};
use crate::errors::{RepositoryError, RepositoryResult};
use crate::models::{
    Forum, ForumCreateRequest, ForumStats, ForumUpdateRequest, Group, MODERATE_FORUM_ROLE,
    PaginatedResult, PendingModerationTopic, Post, Topic,
};

/// SeaORM-based Forum repository
#[derive(Clone)]
pub struct ForumSeaOrmRepository {
    connection: Arc<DatabaseConnection>,
    cache: QueryCache,
    config: ForumConfig,
}

impl ForumSeaOrmRepository {
    /// Create a new ForumSeaOrmRepository with a private cache and default query settings
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self {
            connection,
            cache: QueryCache::default(),
            config: ForumConfig::default(),
        }
    }

    /// Share a query cache with other repositories
    pub fn with_cache(mut self, cache: QueryCache) -> Self {
        self.cache = cache;
        self
    }

    /// Override the query settings, e.g. `ignore_moved_topics`
    pub fn with_config(mut self, config: ForumConfig) -> Self {
        self.config = config;
        self
    }

    /// The cache this repository reads from and evicts
    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Move topics to another forum, keeping a trail of where they came from
    ///
    /// Each topic's `moved_id` is set to the forum it is leaving and every post
    /// of those topics follows it to `to_forum`. Both updates share one transaction.
    pub async fn move_topics(&self, to_forum: &Forum, topic_ids: &[i32]) -> RepositoryResult<()> {
        if topic_ids.is_empty() {
            return Ok(());
        }

        let txn = self.connection.begin().await?;

        // Listings of the current forum and of any earlier move source both show these topics
        let previous: Vec<(i32, Option<i32>)> = Topics::find()
            .select_only()
            .column(topics::Column::ForumId)
            .column(topics::Column::MovedId)
            .distinct()
            .filter(topics::Column::Id.is_in(topic_ids.iter().copied()))
            .into_tuple()
            .all(&txn)
            .await?;
        let mut affected_forums: Vec<i32> = previous
            .into_iter()
            .flat_map(|(forum_id, moved_id)| std::iter::once(forum_id).chain(moved_id))
            .collect();

        let moved = Topics::update_many()
            .col_expr(topics::Column::MovedId, Expr::col(topics::Column::ForumId).into())
            .col_expr(topics::Column::ForumId, Expr::value(to_forum.id))
            .filter(topics::Column::Id.is_in(topic_ids.iter().copied()))
            .exec(&txn)
            .await?;

        let reassigned = Posts::update_many()
            .col_expr(posts::Column::ForumId, Expr::value(to_forum.id))
            .filter(posts::Column::TopicId.is_in(topic_ids.iter().copied()))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        affected_forums.push(to_forum.id);
        affected_forums.sort_unstable();
        affected_forums.dedup();
        self.cache.evict_forums(&affected_forums).await;

        info!(
            "Moved {} topics ({} posts) to forum {}",
            moved.rows_affected, reassigned.rows_affected, to_forum.id
        );
        Ok(())
    }

    /// Distinct groups holding the `moderate_forum` role for this forum
    pub async fn get_moderators(&self, forum: &Forum) -> RepositoryResult<Vec<Group>> {
        let key = CacheKey::new(CacheRegion::MODERATORS, forum.id);
        if let Some(CachedValue::Groups(groups)) = self.cache.get(&key).await {
            return Ok(groups);
        }

        let moderators: Vec<Group> = Groups::find()
            .join(JoinType::InnerJoin, groups::Relation::Roles.def())
            .join(JoinType::InnerJoin, roles::Relation::RoleValues.def())
            .filter(roles::Column::Name.eq(MODERATE_FORUM_ROLE))
            .filter(role_values::Column::Value.eq(forum.id))
            .distinct()
            .order_by_asc(groups::Column::Id)
            .all(&*self.connection)
            .await?
            .into_iter()
            .map(Group::from)
            .collect();

        self.cache
            .put(key, CachedValue::Groups(moderators.clone()))
            .await;
        Ok(moderators)
    }

    /// Topics of the forum waiting for a moderator
    ///
    /// A topic qualifies when it is flagged pending or has at least one post
    /// awaiting approval. The post join yields one row per post; rows are folded
    /// back into one entry per topic carrying only the posts still to approve.
    pub async fn get_topics_pending_moderation(
        &self,
        forum: &Forum,
    ) -> RepositoryResult<Vec<PendingModerationTopic>> {
        let rows = Topics::find()
            .find_with_related(Posts)
            .filter(topics::Column::ForumId.eq(forum.id))
            .filter(
                Condition::any()
                    .add(posts::Column::Moderate.eq(true))
                    .add(topics::Column::PendingModeration.eq(true)),
            )
            .order_by_asc(topics::Column::Id)
            .order_by_asc(posts::Column::Id)
            .all(&*self.connection)
            .await?;

        let pending = rows
            .into_iter()
            .map(|(topic, posts)| PendingModerationTopic {
                topic: topic.into(),
                posts: posts
                    .into_iter()
                    .filter(|post| post.moderate)
                    .map(Post::from)
                    .collect(),
            })
            .collect();
        Ok(pending)
    }

    /// Most recent approved post of the forum
    pub async fn get_last_post(&self, forum: &Forum) -> RepositoryResult<Option<Post>> {
        let post = Posts::find()
            .filter(posts::Column::ForumId.eq(forum.id))
            .filter(posts::Column::Moderate.eq(false))
            .order_by_desc(posts::Column::Id)
            .one(&*self.connection)
            .await?;
        Ok(post.map(Post::from))
    }

    /// Number of posts on the whole board
    pub async fn get_total_messages(&self) -> RepositoryResult<u64> {
        let key = CacheKey::new(CacheRegion::TOTAL_MESSAGES, "");
        if let Some(total) = self.cached_count(&key).await {
            return Ok(total);
        }

        let total = Posts::find().count(&*self.connection).await?;
        self.cache.put(key, CachedValue::Count(total)).await;
        Ok(total)
    }

    /// Number of posts in the forum
    pub async fn get_total_posts(&self, forum: &Forum) -> RepositoryResult<u64> {
        let key = CacheKey::new(CacheRegion::total_posts(forum.id), forum.id);
        if let Some(total) = self.cached_count(&key).await {
            return Ok(total);
        }

        let total = Posts::find()
            .filter(posts::Column::ForumId.eq(forum.id))
            .count(&*self.connection)
            .await?;
        self.cache.put(key, CachedValue::Count(total)).await;
        Ok(total)
    }

    /// Number of visible topics in the forum, not counting moved ones
    pub async fn get_total_topics(&self, forum: &Forum) -> RepositoryResult<u64> {
        let key = CacheKey::new(CacheRegion::total_topics(forum.id), forum.id);
        if let Some(total) = self.cached_count(&key).await {
            return Ok(total);
        }

        let total = Topics::find()
            .filter(topics::Column::PendingModeration.eq(false))
            .filter(topics::Column::ForumId.eq(forum.id))
            .filter(topics::Column::MovedId.is_null())
            .count(&*self.connection)
            .await?;
        self.cache.put(key, CachedValue::Count(total)).await;
        Ok(total)
    }

    /// One page of the forum's topic listing
    ///
    /// Only topics with both a first and a last post are listed, announcements
    /// and stickies first, then by most recent post. Topics moved out of this
    /// forum keep showing here unless `ignore_moved_topics` is set.
    pub async fn get_topics(
        &self,
        forum: &Forum,
        start_from: u64,
        count: u64,
    ) -> RepositoryResult<Vec<Topic>> {
        let include_moved = !self.config.ignore_moved_topics;

        // TODO: only the first page is cached; caching further pages needs eviction on every post write
        let cacheable = start_from == 0;
        let key = CacheKey::new(
            CacheRegion::topics(forum.id),
            format!("{start_from}:{count}:{include_moved}"),
        );
        if cacheable {
            if let Some(CachedValue::Topics(topics)) = self.cache.get(&key).await {
                return Ok(topics);
            }
        }

        let forum_condition = if include_moved {
            Condition::any()
                .add(topics::Column::ForumId.eq(forum.id))
                .add(topics::Column::MovedId.eq(forum.id))
        } else {
            Condition::all().add(topics::Column::ForumId.eq(forum.id))
        };

        let topics: Vec<Topic> = Topics::find()
            .join_as(
                JoinType::InnerJoin,
                topics::Relation::FirstPost.def(),
                Alias::new("fp"),
            )
            .join_as(
                JoinType::InnerJoin,
                topics::Relation::LastPost.def(),
                Alias::new("lp"),
            )
            .filter(forum_condition)
            .filter(topics::Column::PendingModeration.eq(false))
            .order_by_desc(topics::Column::TopicType)
            .order_by_desc(topics::Column::LastPostId)
            .offset(start_from)
            .limit(count)
            .all(&*self.connection)
            .await?
            .into_iter()
            .map(Topic::from)
            .collect();

        if cacheable {
            self.cache.put(key, CachedValue::Topics(topics.clone())).await;
        }
        Ok(topics)
    }

    /// Topics whose last post is at or after `from`, with the total match count
    pub async fn get_new_messages(
        &self,
        from: DateTime<Utc>,
        start: u64,
        records_per_page: u64,
    ) -> RepositoryResult<PaginatedResult<Topic>> {
        let query = Topics::find()
            .join(JoinType::InnerJoin, topics::Relation::LastPost.def())
            .filter(topics::Column::PendingModeration.eq(false))
            .filter(posts::Column::Date.gte(from));

        let total = query.clone().count(&*self.connection).await?;

        let results = query
            .order_by_desc(topics::Column::LastPostId)
            .offset(start)
            .limit(records_per_page)
            .all(&*self.connection)
            .await?
            .into_iter()
            .map(Topic::from)
            .collect();

        Ok(PaginatedResult::new(results, total))
    }

    /// All forums in display order
    pub async fn find_all(&self) -> RepositoryResult<Vec<Forum>> {
        let models = Forums::find()
            .order_by_asc(forums::Column::DisplayOrder)
            .order_by_asc(forums::Column::Id)
            .all(&*self.connection)
            .await?;
        Ok(models.into_iter().map(Forum::from).collect())
    }

    /// Board totals with per-day rates measured up to now
    pub async fn get_forum_stats(&self) -> RepositoryResult<ForumStats> {
        self.get_forum_stats_at(Utc::now()).await
    }

    /// Board totals with per-day rates measured up to `today`
    pub async fn get_forum_stats_at(&self, today: DateTime<Utc>) -> RepositoryResult<ForumStats> {
        let total_posts = self.get_total_messages().await?;
        let total_users = Users::find().count(&*self.connection).await?;
        let total_topics = Topics::find().count(&*self.connection).await?;

        let first_post_date = Posts::find()
            .order_by_asc(posts::Column::Date)
            .one(&*self.connection)
            .await?
            .map(|post| post.date);
        let first_registration_date = Users::find()
            .order_by_asc(users::Column::RegistrationDate)
            .one(&*self.connection)
            .await?
            .map(|user| user.registration_date);

        Ok(ForumStats {
            posts: total_posts,
            total_users,
            total_topics,
            posts_per_day: per_day(total_posts, first_post_date, today),
            topics_per_day: per_day(total_topics, first_post_date, today),
            users_per_day: per_day(total_users, first_registration_date, today),
        })
    }

    /// Number of distinct users belonging to any of the groups; other fields stay zero
    pub async fn get_forum_stats_for_groups(&self, groups: &[Group]) -> RepositoryResult<ForumStats> {
        if groups.is_empty() {
            return Ok(ForumStats::default());
        }

        let total_users = Users::find()
            .join(JoinType::InnerJoin, users::Relation::UserGroups.def())
            .filter(user_groups::Column::GroupId.is_in(groups.iter().map(|group| group.id)))
            .distinct()
            .count(&*self.connection)
            .await?;

        Ok(ForumStats {
            total_users,
            ..ForumStats::default()
        })
    }

    async fn cached_count(&self, key: &CacheKey) -> Option<u64> {
        match self.cache.get(key).await {
            Some(CachedValue::Count(total)) => Some(total),
            _ => None,
        }
    }

    /// One past the highest display order in use, or 1 for the first forum
    async fn next_display_order(&self) -> RepositoryResult<i32> {
        let max_order: Option<Option<i32>> = Forums::find()
            .select_only()
            .column_as(Expr::col(forums::Column::DisplayOrder).max(), "max_display_order")
            .into_tuple()
            .one(&*self.connection)
            .await?;

        Ok(max_order.flatten().map_or(1, |max| max + 1))
    }

    async fn evict_forum(&self, forum_id: i32) {
        self.cache.evict_forums(&[forum_id]).await;
        self.cache.evict_region(CacheRegion::MODERATORS).await;
        self.cache.evict_region(CacheRegion::TOTAL_MESSAGES).await;
    }
}

#[async_trait]
impl Repository<Forum, i32> for ForumSeaOrmRepository {
    type CreateRequest = ForumCreateRequest;
    type UpdateRequest = ForumUpdateRequest;

    /// Insert a forum at the end of the display order
    async fn add(&self, request: ForumCreateRequest) -> RepositoryResult<Forum> {
        RepositoryError::require_name("name", &request.name)?;

        let display_order = self.next_display_order().await?;
        let active_model = forums::ActiveModel {
            name: Set(request.name),
            description: Set(request.description),
            display_order: Set(display_order),
            is_moderated: Set(request.is_moderated),
            allow_anonymous_posts: Set(request.allow_anonymous_posts),
            ..Default::default()
        };

        let model = active_model.insert(&*self.connection).await?;
        debug!("Created forum {} with display order {}", model.id, display_order);
        Ok(model.into())
    }

    async fn get(&self, id: i32) -> RepositoryResult<Option<Forum>> {
        let model = Forums::find_by_id(id).one(&*self.connection).await?;
        Ok(model.map(Forum::from))
    }

    async fn update(&self, id: i32, request: ForumUpdateRequest) -> RepositoryResult<Forum> {
        RepositoryError::require_name("name", &request.name)?;

        let model = Forums::find_by_id(id)
            .one(&*self.connection)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Forum", id))?;

        let mut active_model: forums::ActiveModel = model.into();
        active_model.name = Set(request.name);
        active_model.description = Set(request.description);
        active_model.is_moderated = Set(request.is_moderated);
        active_model.allow_anonymous_posts = Set(request.allow_anonymous_posts);

        let updated = active_model.update(&*self.connection).await?;
        self.evict_forum(id).await;
        Ok(updated.into())
    }

    async fn remove(&self, id: i32) -> RepositoryResult<()> {
        // Topics deleted with the forum may still be listed where they were moved from
        let moved_from: Vec<Option<i32>> = Topics::find()
            .select_only()
            .column(topics::Column::MovedId)
            .distinct()
            .filter(topics::Column::ForumId.eq(id))
            .filter(topics::Column::MovedId.is_not_null())
            .into_tuple()
            .all(&*self.connection)
            .await?;

        let result = Forums::delete_by_id(id).exec(&*self.connection).await?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::not_found("Forum", id));
        }

        self.cache
            .evict_forums(&moved_from.into_iter().flatten().collect::<Vec<_>>())
            .await;
        self.evict_forum(id).await;
        info!("Removed forum {}", id);
        Ok(())
    }
}

/// Whole days between `from` and `today`, never less than one
pub fn days_until_today(today: DateTime<Utc>, from: DateTime<Utc>) -> i64 {
    (today - from).num_days().max(1)
}

fn per_day(total: u64, since: Option<DateTime<Utc>>, today: DateTime<Utc>) -> f64 {
    match since {
        Some(from) => total as f64 / days_until_today(today, from) as f64,
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;

    fn today() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap()
    }

    #[rstest]
    #[case::same_instant(Duration::zero(), 1)]
    #[case::a_few_hours(Duration::hours(5), 1)]
    #[case::just_under_two_days(Duration::hours(47), 1)]
    #[case::two_days(Duration::days(2), 2)]
    #[case::a_year(Duration::days(365), 365)]
    #[case::in_the_future(Duration::days(-3), 1)]
    fn test_days_until_today(#[case] age: Duration, #[case] expected: i64) {
        assert_eq!(days_until_today(today(), today() - age), expected);
    }

    #[test]
    fn test_per_day_without_start_date_is_zero() {
        assert_eq!(per_day(120, None, today()), 0.0);
    }

    #[test]
    fn test_per_day_divides_by_whole_days() {
        let from = today() - Duration::days(4);
        assert_eq!(per_day(10, Some(from), today()), 2.5);
        // Everything posted today still divides by one day
        assert_eq!(per_day(7, Some(today()), today()), 7.0);
    }
}
