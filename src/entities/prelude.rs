pub use super::forums::Entity as Forums;
pub use super::groups::Entity as Groups;
pub use super::posts::Entity as Posts;
pub use super::role_values::Entity as RoleValues;
pub use super::roles::Entity as Roles;
pub use super::topics::Entity as Topics;
pub use super::user_groups::Entity as UserGroups;
pub use super::users::Entity as Users;
