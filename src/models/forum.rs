use serde::{Deserialize, Serialize};

use crate::entities::forums;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forum {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    /// Rank among sibling forums, starting at 1
    pub display_order: i32,
    pub is_moderated: bool,
    pub allow_anonymous_posts: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForumCreateRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_moderated: bool,
    #[serde(default)]
    pub allow_anonymous_posts: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForumUpdateRequest {
    pub name: String,
    pub description: Option<String>,
    pub is_moderated: bool,
    pub allow_anonymous_posts: bool,
}

impl From<forums::Model> for Forum {
    fn from(model: forums::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            display_order: model.display_order,
            is_moderated: model.is_moderated,
            allow_anonymous_posts: model.allow_anonymous_posts,
        }
    }
}
