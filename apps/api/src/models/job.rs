use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A job the user bookmarked, joined with the job's title and deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedJob {
    pub user_email: String,
    pub job_id: String,
    pub title: String,
    pub deadline: Option<DateTime<Utc>>,
}

impl SavedJob {
    /// A job without a deadline stays open indefinitely.
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.deadline.map_or(true, |deadline| deadline >= now)
    }
}
