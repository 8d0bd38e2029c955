use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create tables in order of dependencies
        self.create_forums_table(manager).await?;
        self.create_topics_table(manager).await?;
        self.create_posts_table(manager).await?;
        self.create_users_table(manager).await?;
        self.create_groups_table(manager).await?;
        self.create_user_groups_table(manager).await?;
        self.create_roles_table(manager).await?;
        self.create_role_values_table(manager).await?;

        self.create_indexes(manager).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order
        manager
            .drop_table(Table::drop().table(RoleValues::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Roles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserGroups::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Groups::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Posts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Topics::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Forums::Table).to_owned())
            .await?;

        Ok(())
    }
}

impl Migration {
    fn create_id_column(&self, column: impl IntoIden) -> ColumnDef {
        let mut col = ColumnDef::new(column);
        col.integer().not_null().auto_increment().primary_key();
        col
    }

    fn create_timestamp_column(&self, column: impl IntoIden) -> ColumnDef {
        let mut col = ColumnDef::new(column);
        col.timestamp_with_time_zone().not_null();
        col
    }

    async fn create_forums_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Forums::Table)
                    .if_not_exists()
                    .col(self.create_id_column(Forums::Id))
                    .col(ColumnDef::new(Forums::Name).string().not_null())
                    .col(ColumnDef::new(Forums::Description).string())
                    .col(
                        ColumnDef::new(Forums::DisplayOrder)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Forums::IsModerated)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Forums::AllowAnonymousPosts)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_topics_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Topics::Table)
                    .if_not_exists()
                    .col(self.create_id_column(Topics::Id))
                    .col(ColumnDef::new(Topics::ForumId).integer().not_null())
                    .col(ColumnDef::new(Topics::Subject).string().not_null())
                    .col(
                        ColumnDef::new(Topics::TopicType)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Topics::Status).integer().not_null().default(0))
                    .col(ColumnDef::new(Topics::Views).integer().not_null().default(0))
                    .col(ColumnDef::new(Topics::Replies).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Topics::PendingModeration)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Topics::MovedId).integer())
                    // First/last post are written after the posts exist, so no FK here
                    .col(ColumnDef::new(Topics::FirstPostId).integer())
                    .col(ColumnDef::new(Topics::LastPostId).integer())
                    .col(ColumnDef::new(Topics::UserId).integer())
                    .col(self.create_timestamp_column(Topics::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_topics_forum_id")
                            .from(Topics::Table, Topics::ForumId)
                            .to(Forums::Table, Forums::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_posts_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Posts::Table)
                    .if_not_exists()
                    .col(self.create_id_column(Posts::Id))
                    .col(ColumnDef::new(Posts::TopicId).integer().not_null())
                    .col(ColumnDef::new(Posts::ForumId).integer().not_null())
                    .col(ColumnDef::new(Posts::UserId).integer())
                    .col(ColumnDef::new(Posts::Subject).string().not_null())
                    .col(ColumnDef::new(Posts::Text).text().not_null())
                    .col(self.create_timestamp_column(Posts::Date))
                    .col(
                        ColumnDef::new(Posts::Moderate)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_posts_topic_id")
                            .from(Posts::Table, Posts::TopicId)
                            .to(Topics::Table, Topics::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_posts_forum_id")
                            .from(Posts::Table, Posts::ForumId)
                            .to(Forums::Table, Forums::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_users_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(self.create_id_column(Users::Id))
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::Email).string().not_null())
                    .col(self.create_timestamp_column(Users::RegistrationDate))
                    .to_owned(),
            )
            .await
    }

    async fn create_groups_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Groups::Table)
                    .if_not_exists()
                    .col(self.create_id_column(Groups::Id))
                    .col(ColumnDef::new(Groups::Name).string().not_null())
                    .col(ColumnDef::new(Groups::Description).string())
                    .to_owned(),
            )
            .await
    }

    async fn create_user_groups_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserGroups::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UserGroups::UserId).integer().not_null())
                    .col(ColumnDef::new(UserGroups::GroupId).integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(UserGroups::UserId)
                            .col(UserGroups::GroupId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_groups_user_id")
                            .from(UserGroups::Table, UserGroups::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_groups_group_id")
                            .from(UserGroups::Table, UserGroups::GroupId)
                            .to(Groups::Table, Groups::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_roles_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Roles::Table)
                    .if_not_exists()
                    .col(self.create_id_column(Roles::Id))
                    .col(ColumnDef::new(Roles::GroupId).integer().not_null())
                    .col(ColumnDef::new(Roles::Name).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_roles_group_id")
                            .from(Roles::Table, Roles::GroupId)
                            .to(Groups::Table, Groups::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_role_values_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RoleValues::Table)
                    .if_not_exists()
                    .col(self.create_id_column(RoleValues::Id))
                    .col(ColumnDef::new(RoleValues::RoleId).integer().not_null())
                    .col(ColumnDef::new(RoleValues::Value).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_role_values_role_id")
                            .from(RoleValues::Table, RoleValues::RoleId)
                            .to(Roles::Table, Roles::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_indexes(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_topics_forum_id")
                    .table(Topics::Table)
                    .col(Topics::ForumId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_topics_moved_id")
                    .table(Topics::Table)
                    .col(Topics::MovedId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_posts_topic_id")
                    .table(Posts::Table)
                    .col(Posts::TopicId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_posts_forum_id")
                    .table(Posts::Table)
                    .col(Posts::ForumId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_role_values_role_id")
                    .table(RoleValues::Table)
                    .col(RoleValues::RoleId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Forums {
    Table,
    Id,
    Name,
    Description,
    DisplayOrder,
    IsModerated,
    AllowAnonymousPosts,
}

#[derive(DeriveIden)]
enum Topics {
    Table,
    Id,
    ForumId,
    Subject,
    TopicType,
    Status,
    Views,
    Replies,
    PendingModeration,
    MovedId,
    FirstPostId,
    LastPostId,
    UserId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Posts {
    Table,
    Id,
    TopicId,
    ForumId,
    UserId,
    Subject,
    Text,
    Date,
    Moderate,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Email,
    RegistrationDate,
}

#[derive(DeriveIden)]
enum Groups {
    Table,
    Id,
    Name,
    Description,
}

#[derive(DeriveIden)]
enum UserGroups {
    Table,
    UserId,
    GroupId,
}

#[derive(DeriveIden)]
enum Roles {
    Table,
    Id,
    GroupId,
    Name,
}

#[derive(DeriveIden)]
enum RoleValues {
    Table,
    Id,
    RoleId,
    Value,
}
