//! Forum repository behaviour against a migrated SQLite database

mod common;

use chrono::{Duration, TimeZone, Utc};
use common::Board;
use forum_store::{
    config::ForumConfig,
    database::repositories::Repository,
    entities::{prelude::Topics, topics},
    errors::RepositoryError,
    models::{
        ForumUpdateRequest, GroupCreateRequest, MODERATE_FORUM_ROLE, TopicType,
        TopicUpdateRequest, UserCreateRequest,
    },
};
use rstest::rstest;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, sea_query::Expr};

#[tokio::test]
async fn test_new_forums_append_to_display_order() {
    let board = Board::new().await;
    let general = board.forum("General").await;
    let help = board.forum("Help").await;
    let offtopic = board.forum("Off topic").await;

    assert_eq!(general.display_order, 1);
    assert_eq!(help.display_order, 2);
    assert_eq!(offtopic.display_order, 3);

    let names: Vec<String> = board
        .forums
        .find_all()
        .await
        .unwrap()
        .into_iter()
        .map(|forum| forum.name)
        .collect();
    assert_eq!(names, vec!["General", "Help", "Off topic"]);
}

#[tokio::test]
async fn test_display_order_continues_after_highest() {
    let board = Board::new().await;
    let first = board.forum("First").await;
    let second = board.forum("Second").await;
    board.forums.remove(first.id).await.unwrap();

    let third = board.forum("Third").await;
    assert_eq!(second.display_order, 2);
    assert_eq!(third.display_order, 3);
}

#[tokio::test]
async fn test_move_topics_reassigns_topics_and_posts() {
    let board = Board::new().await;
    let source = board.forum("Source").await;
    let target = board.forum("Target").await;
    let moving = board.topic_with_posts(&source, "Moving", 3).await;
    let staying = board.topic_with_posts(&source, "Staying", 1).await;

    // Prime the cached counters so the move has to evict them
    assert_eq!(board.forums.get_total_posts(&source).await.unwrap(), 4);
    assert_eq!(board.forums.get_total_posts(&target).await.unwrap(), 0);

    board
        .forums
        .move_topics(&target, &[moving.id])
        .await
        .unwrap();

    let moved = board.reload_topic(moving.id).await;
    assert_eq!(moved.forum_id, target.id);
    assert_eq!(moved.moved_id, Some(source.id));
    assert!(moved.is_moved());

    let untouched = board.reload_topic(staying.id).await;
    assert_eq!(untouched.forum_id, source.id);
    assert_eq!(untouched.moved_id, None);

    for post in board.posts.find_by_topic(moving.id).await.unwrap() {
        assert_eq!(post.forum_id, target.id);
    }
    assert_eq!(board.forums.get_total_posts(&source).await.unwrap(), 1);
    assert_eq!(board.forums.get_total_posts(&target).await.unwrap(), 3);
}

#[tokio::test]
async fn test_move_topics_with_no_ids_is_a_noop() {
    let board = Board::new().await;
    let forum = board.forum("General").await;
    let topic = board.topic_with_posts(&forum, "Hello", 1).await;

    board.forums.move_topics(&forum, &[]).await.unwrap();

    assert_eq!(board.reload_topic(topic.id).await, topic);
}

#[tokio::test]
async fn test_total_topics_skips_pending_and_moved() {
    let board = Board::new().await;
    let source = board.forum("Source").await;
    let target = board.forum("Target").await;
    board.topic_with_posts(&source, "Visible", 1).await;
    let pending = board.topic_with_posts(&source, "Pending", 1).await;
    let moving = board.topic_with_posts(&source, "Moving", 1).await;

    board
        .topics
        .update(
            pending.id,
            TopicUpdateRequest {
                subject: pending.subject.clone(),
                topic_type: pending.topic_type,
                status: pending.status,
                pending_moderation: true,
            },
        )
        .await
        .unwrap();
    board
        .forums
        .move_topics(&target, &[moving.id])
        .await
        .unwrap();

    assert_eq!(board.forums.get_total_topics(&source).await.unwrap(), 1);
    // Moved topics carry their trail and are not counted in the new forum either
    assert_eq!(board.forums.get_total_topics(&target).await.unwrap(), 0);
}

#[tokio::test]
async fn test_get_topics_orders_and_filters() {
    let board = Board::new().await;
    let forum = board.forum("General").await;

    let older = board.topic_with_posts(&forum, "Older", 1).await;
    let sticky = board.topic_with_posts(&forum, "Sticky", 1).await;
    board
        .topics
        .update(
            sticky.id,
            TopicUpdateRequest {
                subject: sticky.subject.clone(),
                topic_type: TopicType::Sticky,
                status: sticky.status,
                pending_moderation: false,
            },
        )
        .await
        .unwrap();
    let newer = board.topic_with_posts(&forum, "Newer", 2).await;
    let pending = board.topic_with_posts(&forum, "Pending", 1).await;
    board
        .topics
        .update(
            pending.id,
            TopicUpdateRequest {
                subject: pending.subject.clone(),
                topic_type: pending.topic_type,
                status: pending.status,
                pending_moderation: true,
            },
        )
        .await
        .unwrap();
    // Never received a post, so it has no first or last post
    board
        .empty_topic(&forum, "Empty", TopicType::Announce)
        .await;

    let listed: Vec<i32> = board
        .forums
        .get_topics(&forum, 0, 10)
        .await
        .unwrap()
        .into_iter()
        .map(|topic| topic.id)
        .collect();
    assert_eq!(listed, vec![sticky.id, newer.id, older.id]);

    let second_page: Vec<i32> = board
        .forums
        .get_topics(&forum, 1, 1)
        .await
        .unwrap()
        .into_iter()
        .map(|topic| topic.id)
        .collect();
    assert_eq!(second_page, vec![newer.id]);
}

#[rstest]
#[case::moved_topics_listed(false, 2)]
#[case::moved_topics_ignored(true, 1)]
#[tokio::test]
async fn test_get_topics_moved_topic_visibility(
    #[case] ignore_moved_topics: bool,
    #[case] expected: usize,
) {
    let board = Board::with_forum_config(ForumConfig {
        ignore_moved_topics,
        ..ForumConfig::default()
    })
    .await;
    let source = board.forum("Source").await;
    let target = board.forum("Target").await;
    board.topic_with_posts(&source, "Staying", 1).await;
    let moving = board.topic_with_posts(&source, "Moving", 1).await;

    board
        .forums
        .move_topics(&target, &[moving.id])
        .await
        .unwrap();

    let listed = board.forums.get_topics(&source, 0, 10).await.unwrap();
    assert_eq!(listed.len(), expected);
    // The destination always lists it
    assert_eq!(board.forums.get_topics(&target, 0, 10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_first_topic_page_is_cached_until_a_write() {
    let board = Board::new().await;
    let forum = board.forum("General").await;
    let first = board.topic_with_posts(&forum, "First", 1).await;
    board.topic_with_posts(&forum, "Second", 1).await;

    let cached = board.forums.get_topics(&forum, 0, 10).await.unwrap();
    assert_eq!(cached.len(), 2);

    // Change rows behind the repositories' back
    Topics::update_many()
        .col_expr(topics::Column::Subject, Expr::value("Renamed"))
        .filter(topics::Column::ForumId.eq(forum.id))
        .exec(&*board.database.connection())
        .await
        .unwrap();

    let first_page = board.forums.get_topics(&forum, 0, 10).await.unwrap();
    assert_eq!(first_page, cached);

    // Later pages always hit the database
    let later_page = board.forums.get_topics(&forum, 1, 10).await.unwrap();
    assert_eq!(later_page[0].subject, "Renamed");

    // A new post in the forum evicts the cached page
    board.post(&first, None, false).await;
    let refreshed = board.forums.get_topics(&forum, 0, 10).await.unwrap();
    assert!(refreshed.iter().all(|topic| topic.subject == "Renamed"));
}

#[tokio::test]
async fn test_moved_topic_update_evicts_listing_of_forum_it_left() {
    let board = Board::new().await;
    let source = board.forum("Source").await;
    let target = board.forum("Target").await;
    let topic = board.topic_with_posts(&source, "Travelling", 1).await;
    board
        .forums
        .move_topics(&target, &[topic.id])
        .await
        .unwrap();

    let listed = board.forums.get_topics(&source, 0, 10).await.unwrap();
    assert_eq!(listed.len(), 1);

    board
        .topics
        .update(
            topic.id,
            TopicUpdateRequest {
                subject: topic.subject.clone(),
                topic_type: topic.topic_type,
                status: topic.status,
                pending_moderation: true,
            },
        )
        .await
        .unwrap();

    assert!(board.forums.get_topics(&source, 0, 10).await.unwrap().is_empty());
    assert!(board.forums.get_topics(&target, 0, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_moved_topic_removal_evicts_listing_of_forum_it_left() {
    let board = Board::new().await;
    let source = board.forum("Source").await;
    let target = board.forum("Target").await;
    let topic = board.topic_with_posts(&source, "Travelling", 1).await;
    board
        .forums
        .move_topics(&target, &[topic.id])
        .await
        .unwrap();
    assert_eq!(board.forums.get_topics(&source, 0, 10).await.unwrap().len(), 1);

    board.topics.remove(topic.id).await.unwrap();

    assert!(board.forums.get_topics(&source, 0, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_post_in_moved_topic_evicts_listing_of_forum_it_left() {
    let board = Board::new().await;
    let source = board.forum("Source").await;
    let target = board.forum("Target").await;
    let topic = board.topic_with_posts(&source, "Travelling", 1).await;
    board
        .forums
        .move_topics(&target, &[topic.id])
        .await
        .unwrap();

    let before = board.forums.get_topics(&source, 0, 10).await.unwrap();
    assert_eq!(before[0].last_post_id, topic.last_post_id);

    let reply = board.post(&topic, None, false).await;

    let after = board.forums.get_topics(&source, 0, 10).await.unwrap();
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].last_post_id, Some(reply.id));
    assert_eq!(after[0].replies, 1);
}

#[tokio::test]
async fn test_second_move_evicts_listing_of_first_source() {
    let board = Board::new().await;
    let first = board.forum("First").await;
    let second = board.forum("Second").await;
    let third = board.forum("Third").await;
    let topic = board.topic_with_posts(&first, "Travelling", 1).await;

    board
        .forums
        .move_topics(&second, &[topic.id])
        .await
        .unwrap();
    assert_eq!(board.forums.get_topics(&first, 0, 10).await.unwrap().len(), 1);

    board
        .forums
        .move_topics(&third, &[topic.id])
        .await
        .unwrap();

    // The trail now points at the second forum only
    assert!(board.forums.get_topics(&first, 0, 10).await.unwrap().is_empty());
    assert_eq!(board.forums.get_topics(&second, 0, 10).await.unwrap().len(), 1);
    assert_eq!(board.forums.get_topics(&third, 0, 10).await.unwrap().len(), 1);
    assert_eq!(board.reload_topic(topic.id).await.moved_id, Some(second.id));
}

#[tokio::test]
async fn test_removing_forum_evicts_listing_its_moved_topics_came_from() {
    let board = Board::new().await;
    let source = board.forum("Source").await;
    let doomed = board.forum("Doomed").await;
    let topic = board.topic_with_posts(&source, "Travelling", 1).await;
    board
        .forums
        .move_topics(&doomed, &[topic.id])
        .await
        .unwrap();
    assert_eq!(board.forums.get_topics(&source, 0, 10).await.unwrap().len(), 1);

    board.forums.remove(doomed.id).await.unwrap();

    assert!(board.forums.get_topics(&source, 0, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_pending_moderation_lists_each_topic_once() {
    let board = Board::new().await;
    let forum = board.forum("General").await;
    let other = board.forum("Other").await;

    let flagged = board.topic_with_posts(&forum, "Flagged", 2).await;
    board
        .topics
        .update(
            flagged.id,
            TopicUpdateRequest {
                subject: flagged.subject.clone(),
                topic_type: flagged.topic_type,
                status: flagged.status,
                pending_moderation: true,
            },
        )
        .await
        .unwrap();

    let mixed = board.topic_with_posts(&forum, "Mixed", 1).await;
    let held_one = board.post(&mixed, None, true).await;
    let held_two = board.post(&mixed, None, true).await;

    board.topic_with_posts(&forum, "Clean", 2).await;

    // Posts awaiting approval elsewhere stay out of this forum's queue
    let elsewhere = board.topic_with_posts(&other, "Elsewhere", 1).await;
    board.post(&elsewhere, None, true).await;

    let queue = board
        .forums
        .get_topics_pending_moderation(&forum)
        .await
        .unwrap();

    assert_eq!(queue.len(), 2);
    assert_eq!(queue[0].topic.id, flagged.id);
    assert!(queue[0].posts.is_empty());
    assert_eq!(queue[1].topic.id, mixed.id);
    let held: Vec<i32> = queue[1].posts.iter().map(|post| post.id).collect();
    assert_eq!(held, vec![held_one.id, held_two.id]);
}

#[tokio::test]
async fn test_last_post_skips_posts_awaiting_moderation() {
    let board = Board::new().await;
    let forum = board.forum("General").await;
    assert!(board.forums.get_last_post(&forum).await.unwrap().is_none());

    let topic = board.topic_with_posts(&forum, "Hello", 0).await;
    let approved = board.post(&topic, None, false).await;
    board.post(&topic, None, true).await;

    let last = board.forums.get_last_post(&forum).await.unwrap().unwrap();
    assert_eq!(last.id, approved.id);
}

#[tokio::test]
async fn test_total_messages_spans_forums_and_is_evicted_by_posts() {
    let board = Board::new().await;
    let general = board.forum("General").await;
    let help = board.forum("Help").await;
    board.topic_with_posts(&general, "One", 2).await;
    let topic = board.topic_with_posts(&help, "Two", 1).await;

    assert_eq!(board.forums.get_total_messages().await.unwrap(), 3);

    board.post(&topic, None, false).await;
    assert_eq!(board.forums.get_total_messages().await.unwrap(), 4);
}

#[tokio::test]
async fn test_new_messages_are_paged_with_total() {
    let board = Board::new().await;
    let forum = board.forum("General").await;
    let now = Utc::now();

    let stale = board.empty_topic(&forum, "Stale", TopicType::Normal).await;
    board.post(&stale, Some(now - Duration::days(10)), false).await;
    let recent = board.empty_topic(&forum, "Recent", TopicType::Normal).await;
    board.post(&recent, Some(now - Duration::days(2)), false).await;
    let fresh = board.empty_topic(&forum, "Fresh", TopicType::Normal).await;
    board.post(&fresh, Some(now - Duration::hours(1)), false).await;

    let since = now - Duration::days(3);
    let page = board.forums.get_new_messages(since, 0, 1).await.unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.total_pages(1), 2);
    assert_eq!(page.results.len(), 1);
    assert_eq!(page.results[0].id, fresh.id);

    let next = board.forums.get_new_messages(since, 1, 1).await.unwrap();
    assert_eq!(next.results[0].id, recent.id);

    let beyond = board.forums.get_new_messages(since, 2, 1).await.unwrap();
    assert_eq!(beyond.total, 2);
    assert!(beyond.results.is_empty());
}

#[tokio::test]
async fn test_moderators_are_distinct_and_refreshed_on_grant() {
    let board = Board::new().await;
    let general = board.forum("General").await;
    let help = board.forum("Help").await;

    let staff = board
        .groups
        .add(GroupCreateRequest {
            name: "Staff".to_string(),
            description: None,
        })
        .await
        .unwrap();
    let helpers = board
        .groups
        .add(GroupCreateRequest {
            name: "Helpers".to_string(),
            description: Some("Answer questions".to_string()),
        })
        .await
        .unwrap();

    board
        .groups
        .grant_role(staff.id, MODERATE_FORUM_ROLE, &[general.id, help.id])
        .await
        .unwrap();
    // A second grant for the same forum must not duplicate the group
    board
        .groups
        .grant_role(staff.id, MODERATE_FORUM_ROLE, &[general.id])
        .await
        .unwrap();
    board
        .groups
        .grant_role(helpers.id, "post_announcement", &[general.id])
        .await
        .unwrap();

    assert_eq!(
        board.forums.get_moderators(&general).await.unwrap(),
        vec![staff.clone()]
    );

    board
        .groups
        .grant_role(helpers.id, MODERATE_FORUM_ROLE, &[general.id])
        .await
        .unwrap();
    assert_eq!(
        board.forums.get_moderators(&general).await.unwrap(),
        vec![staff, helpers]
    );
}

#[tokio::test]
async fn test_forum_stats_rates() {
    let board = Board::new().await;
    let today = Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap();
    let forum = board.forum("General").await;

    for (name, age) in [("alice", 10), ("bob", 5)] {
        board
            .users
            .add(UserCreateRequest {
                username: name.to_string(),
                email: format!("{name}@example.org"),
                registration_date: Some(today - Duration::days(age)),
            })
            .await
            .unwrap();
    }

    let first = board.empty_topic(&forum, "First", TopicType::Normal).await;
    let second = board.empty_topic(&forum, "Second", TopicType::Normal).await;
    for day in [4, 3, 2, 1] {
        board
            .post(&first, Some(today - Duration::days(day)), false)
            .await;
    }
    for day in [2, 1, 1, 0] {
        board
            .post(&second, Some(today - Duration::days(day)), false)
            .await;
    }

    let stats = board.forums.get_forum_stats_at(today).await.unwrap();
    assert_eq!(stats.posts, 8);
    assert_eq!(stats.total_topics, 2);
    assert_eq!(stats.total_users, 2);
    assert_eq!(stats.posts_per_day, 2.0);
    assert_eq!(stats.topics_per_day, 0.5);
    assert_eq!(stats.users_per_day, 0.2);
}

#[tokio::test]
async fn test_forum_stats_on_empty_board() {
    let board = Board::new().await;
    let stats = board.forums.get_forum_stats().await.unwrap();
    assert_eq!(stats, Default::default());
}

#[tokio::test]
async fn test_forum_stats_for_groups_counts_distinct_members() {
    let board = Board::new().await;
    let staff = board
        .groups
        .add(GroupCreateRequest {
            name: "Staff".to_string(),
            description: None,
        })
        .await
        .unwrap();
    let helpers = board
        .groups
        .add(GroupCreateRequest {
            name: "Helpers".to_string(),
            description: None,
        })
        .await
        .unwrap();

    let mut ids = Vec::new();
    for name in ["alice", "bob", "carol"] {
        let user = board
            .users
            .add(UserCreateRequest {
                username: name.to_string(),
                email: format!("{name}@example.org"),
                registration_date: None,
            })
            .await
            .unwrap();
        ids.push(user.id);
    }
    board.users.add_to_group(ids[0], staff.id).await.unwrap();
    board.users.add_to_group(ids[1], staff.id).await.unwrap();
    board.users.add_to_group(ids[1], helpers.id).await.unwrap();

    let stats = board
        .forums
        .get_forum_stats_for_groups(&[staff.clone(), helpers.clone()])
        .await
        .unwrap();
    assert_eq!(stats.total_users, 2);
    assert_eq!(stats.posts, 0);

    let helpers_only = board
        .forums
        .get_forum_stats_for_groups(&[helpers])
        .await
        .unwrap();
    assert_eq!(helpers_only.total_users, 1);

    let none = board.forums.get_forum_stats_for_groups(&[]).await.unwrap();
    assert_eq!(none, Default::default());
}

#[tokio::test]
async fn test_update_and_remove_missing_forum() {
    let board = Board::new().await;

    let err = board
        .forums
        .update(
            42,
            ForumUpdateRequest {
                name: "Nowhere".to_string(),
                description: None,
                is_moderated: false,
                allow_anonymous_posts: false,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));

    let err = board.forums.remove(42).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
}

#[tokio::test]
async fn test_blank_forum_name_is_rejected() {
    let board = Board::new().await;
    let err = board
        .forums
        .add(forum_store::models::ForumCreateRequest {
            name: "   ".to_string(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Validation { .. }));
    assert!(board.forums.find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_removing_forum_cascades_to_topics_and_posts() {
    let board = Board::new().await;
    let forum = board.forum("Doomed").await;
    let topic = board.topic_with_posts(&forum, "Gone", 2).await;

    board.forums.remove(forum.id).await.unwrap();

    assert!(board.topics.get(topic.id).await.unwrap().is_none());
    assert!(board.posts.find_by_topic(topic.id).await.unwrap().is_empty());
    assert_eq!(board.forums.get_total_messages().await.unwrap(), 0);
}
