use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::topics;

use super::Post;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicType {
    #[default]
    Normal,
    Sticky,
    Announce,
}

impl TopicType {
    pub fn as_i32(self) -> i32 {
        match self {
            TopicType::Normal => 0,
            TopicType::Sticky => 1,
            TopicType::Announce => 2,
        }
    }

    /// Unknown stored values fall back to a normal topic
    pub fn from_i32(value: i32) -> Self {
        match value {
            1 => TopicType::Sticky,
            2 => TopicType::Announce,
            _ => TopicType::Normal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicStatus {
    #[default]
    Unlocked,
    Locked,
}

impl TopicStatus {
    pub fn as_i32(self) -> i32 {
        match self {
            TopicStatus::Unlocked => 0,
            TopicStatus::Locked => 1,
        }
    }

    pub fn from_i32(value: i32) -> Self {
        if value == 1 {
            TopicStatus::Locked
        } else {
            TopicStatus::Unlocked
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: i32,
    pub forum_id: i32,
    pub subject: String,
    pub topic_type: TopicType,
    pub status: TopicStatus,
    pub views: i32,
    pub replies: i32,
    pub pending_moderation: bool,
    /// Forum this topic was moved away from
    pub moved_id: Option<i32>,
    pub first_post_id: Option<i32>,
    pub last_post_id: Option<i32>,
    pub user_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl Topic {
    pub fn is_moved(&self) -> bool {
        self.moved_id.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicCreateRequest {
    pub forum_id: i32,
    pub subject: String,
    #[serde(default)]
    pub topic_type: TopicType,
    pub user_id: Option<i32>,
    #[serde(default)]
    pub pending_moderation: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicUpdateRequest {
    pub subject: String,
    pub topic_type: TopicType,
    pub status: TopicStatus,
    pub pending_moderation: bool,
}

/// A topic waiting in the moderation queue with the posts that still need approval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingModerationTopic {
    pub topic: Topic,
    pub posts: Vec<Post>,
}

impl From<topics::Model> for Topic {
    fn from(model: topics::Model) -> Self {
        Self {
            id: model.id,
            forum_id: model.forum_id,
            subject: model.subject,
            topic_type: TopicType::from_i32(model.topic_type),
            status: TopicStatus::from_i32(model.status),
            views: model.views,
            replies: model.replies,
            pending_moderation: model.pending_moderation,
            moved_id: model.moved_id,
            first_post_id: model.first_post_id,
            last_post_id: model.last_post_id,
            user_id: model.user_id,
            created_at: model.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_type_codes() {
        for topic_type in [TopicType::Normal, TopicType::Sticky, TopicType::Announce] {
            assert_eq!(TopicType::from_i32(topic_type.as_i32()), topic_type);
        }
        assert_eq!(TopicType::from_i32(99), TopicType::Normal);
    }

    #[test]
    fn test_topic_status_codes() {
        assert_eq!(TopicStatus::from_i32(1), TopicStatus::Locked);
        assert_eq!(TopicStatus::from_i32(0), TopicStatus::Unlocked);
        assert_eq!(TopicStatus::Locked.as_i32(), 1);
    }
}
