use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "topics")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub forum_id: i32,
    pub subject: String,
    /// 0 normal, 1 sticky, 2 announcement
    pub topic_type: i32,
    /// 0 unlocked, 1 locked
    pub status: i32,
    pub views: i32,
    pub replies: i32,
    pub pending_moderation: bool,
    /// Forum the topic was moved away from, if any
    pub moved_id: Option<i32>,
    pub first_post_id: Option<i32>,
    pub last_post_id: Option<i32>,
    pub user_id: Option<i32>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::forums::Entity",
        from = "Column::ForumId",
        to = "super::forums::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Forum,
    #[sea_orm(has_many = "super::posts::Entity")]
    Posts,
    #[sea_orm(
        belongs_to = "super::posts::Entity",
        from = "Column::FirstPostId",
        to = "super::posts::Column::Id"
    )]
    FirstPost,
    #[sea_orm(
        belongs_to = "super::posts::Entity",
        from = "Column::LastPostId",
        to = "super::posts::Column::Id"
    )]
    LastPost,
}

impl Related<super::forums::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Forum.def()
    }
}

impl Related<super::posts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Posts.def()
    }
}

impl Model {
    /// Forums whose topic listing can show this topic: its own and the one it was moved from
    pub fn listing_forum_ids(&self) -> Vec<i32> {
        std::iter::once(self.forum_id).chain(self.moved_id).collect()
    }
}

impl ActiveModelBehavior for ActiveModel {}
