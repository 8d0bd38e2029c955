use serde::{Deserialize, Serialize};

use crate::entities::groups;

/// Role name granting moderation rights; its role values are forum ids
pub const MODERATE_FORUM_ROLE: &str = "moderate_forum";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupCreateRequest {
    pub name: String,
    pub description: Option<String>,
}

impl From<groups::Model> for Group {
    fn from(model: groups::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
        }
    }
}
