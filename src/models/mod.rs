//! Domain models returned by the repositories
//!
//! Entities in `crate::entities` mirror the tables; these types are what
//! callers work with. Conversions from entity models live next to each type.

use serde::{Deserialize, Serialize};

pub mod forum;
pub mod group;
pub mod post;
pub mod stats;
pub mod topic;
pub mod user;

pub use forum::{Forum, ForumCreateRequest, ForumUpdateRequest};
pub use group::{Group, GroupCreateRequest, MODERATE_FORUM_ROLE};
pub use post::{Post, PostCreateRequest, PostUpdateRequest};
pub use stats::ForumStats;
pub use topic::{
    PendingModerationTopic, Topic, TopicCreateRequest, TopicStatus, TopicType, TopicUpdateRequest,
};
pub use user::{User, UserCreateRequest};

/// One page of results together with the total number of matching records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResult<T> {
    /// Records of the requested page
    pub results: Vec<T>,
    /// Total number of matching records (across all pages)
    pub total: u64,
}

impl<T> PaginatedResult<T> {
    pub fn new(results: Vec<T>, total: u64) -> Self {
        Self { results, total }
    }

    /// Number of pages needed to show `total` records `per_page` at a time
    pub fn total_pages(&self, per_page: u64) -> u64 {
        if per_page == 0 {
            return 1;
        }
        self.total.div_ceil(per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages() {
        let page = PaginatedResult::new(vec![1, 2, 3], 31);
        assert_eq!(page.total_pages(15), 3);
        assert_eq!(page.total_pages(31), 1);
        assert_eq!(page.total_pages(0), 1);

        let empty: PaginatedResult<i32> = PaginatedResult::new(Vec::new(), 0);
        assert_eq!(empty.total_pages(15), 0);
    }
}
