//! Shared fixtures for repository integration tests

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use forum_store::{
    cache::QueryCache,
    config::{DatabaseConfig, ForumConfig},
    database::{
        Database,
        repositories::{
            ForumSeaOrmRepository, GroupSeaOrmRepository, PostSeaOrmRepository, Repository,
            TopicSeaOrmRepository, UserSeaOrmRepository,
        },
    },
    models::{
        Forum, ForumCreateRequest, Post, PostCreateRequest, Topic, TopicCreateRequest, TopicType,
    },
};

/// A migrated in-memory board with every repository sharing one cache
pub struct Board {
    pub database: Database,
    pub cache: QueryCache,
    pub forums: ForumSeaOrmRepository,
    pub topics: TopicSeaOrmRepository,
    pub posts: PostSeaOrmRepository,
    pub users: UserSeaOrmRepository,
    pub groups: GroupSeaOrmRepository,
}

impl Board {
    pub async fn new() -> Self {
        Self::with_forum_config(ForumConfig::default()).await
    }

    pub async fn with_forum_config(forum_config: ForumConfig) -> Self {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            ..DatabaseConfig::default()
        };
        let database = Database::new(&config).await.expect("connect in-memory sqlite");
        database.migrate().await.expect("run migrations");

        let cache = QueryCache::new(64);
        let connection = database.connection();
        Self {
            forums: ForumSeaOrmRepository::new(connection.clone())
                .with_cache(cache.clone())
                .with_config(forum_config),
            topics: TopicSeaOrmRepository::new(connection.clone()).with_cache(cache.clone()),
            posts: PostSeaOrmRepository::new(connection.clone()).with_cache(cache.clone()),
            users: UserSeaOrmRepository::new(connection.clone()),
            groups: GroupSeaOrmRepository::new(connection).with_cache(cache.clone()),
            cache,
            database,
        }
    }

    pub async fn forum(&self, name: &str) -> Forum {
        self.forums
            .add(ForumCreateRequest {
                name: name.to_string(),
                ..ForumCreateRequest::default()
            })
            .await
            .expect("create forum")
    }

    pub async fn empty_topic(&self, forum: &Forum, subject: &str, topic_type: TopicType) -> Topic {
        self.topics
            .add(TopicCreateRequest {
                forum_id: forum.id,
                subject: subject.to_string(),
                topic_type,
                user_id: None,
                pending_moderation: false,
            })
            .await
            .expect("create topic")
    }

    pub async fn post(&self, topic: &Topic, date: Option<DateTime<Utc>>, moderate: bool) -> Post {
        self.posts
            .add(PostCreateRequest {
                topic_id: topic.id,
                user_id: None,
                subject: format!("Re: {}", topic.subject),
                text: "body".to_string(),
                date,
                moderate,
            })
            .await
            .expect("create post")
    }

    /// A normal topic with `posts` approved posts, reloaded so post references are set
    pub async fn topic_with_posts(&self, forum: &Forum, subject: &str, posts: usize) -> Topic {
        let topic = self.empty_topic(forum, subject, TopicType::Normal).await;
        for _ in 0..posts {
            self.post(&topic, None, false).await;
        }
        self.reload_topic(topic.id).await
    }

    pub async fn reload_topic(&self, id: i32) -> Topic {
        self.topics
            .get(id)
            .await
            .expect("load topic")
            .expect("topic exists")
    }
}
