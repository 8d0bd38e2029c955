//! SeaORM repository implementations
//!
//! Repositories work across SQLite, PostgreSQL and MySQL. They share one
//! pooled connection and, where results are cached, one `QueryCache`.

pub mod forum;
pub mod group;
pub mod post;
pub mod topic;
pub mod traits;
pub mod user;

// Re-export for convenience
pub use forum::ForumSeaOrmRepository;
pub use group::GroupSeaOrmRepository;
pub use post::PostSeaOrmRepository;
pub use topic::TopicSeaOrmRepository;
pub use traits::Repository;
pub use user::UserSeaOrmRepository;
