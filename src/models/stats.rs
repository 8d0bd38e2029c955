use serde::{Deserialize, Serialize};

/// Board-wide totals and daily rates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForumStats {
    pub posts: u64,
    pub total_users: u64,
    pub total_topics: u64,
    pub posts_per_day: f64,
    pub topics_per_day: f64,
    pub users_per_day: f64,
}
