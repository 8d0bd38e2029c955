use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::posts;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i32,
    pub topic_id: i32,
    pub forum_id: i32,
    pub user_id: Option<i32>,
    pub subject: String,
    pub text: String,
    pub date: DateTime<Utc>,
    /// Hidden from listings until a moderator approves it
    pub moderate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostCreateRequest {
    pub topic_id: i32,
    pub user_id: Option<i32>,
    pub subject: String,
    pub text: String,
    /// Defaults to now when absent
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub moderate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostUpdateRequest {
    pub subject: String,
    pub text: String,
    pub moderate: bool,
}

impl From<posts::Model> for Post {
    fn from(model: posts::Model) -> Self {
        Self {
            id: model.id,
            topic_id: model.topic_id,
            forum_id: model.forum_id,
            user_id: model.user_id,
            subject: model.subject,
            text: model.text,
            date: model.date,
            moderate: model.moderate,
        }
    }
}
