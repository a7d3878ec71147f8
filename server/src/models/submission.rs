use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A run filed by an organization against a task.
///
/// `runtag`, `task_id` and `org_id` never change once the row exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Submission {
    pub id: Uuid,
    pub task_id: Uuid,
    pub runtag: String,
    pub submitted_by: Uuid,
    pub org_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSubmission {
    pub task_id: Uuid,
    pub runtag: String,
    pub submitted_by: Uuid,
    pub org_id: Uuid,
}
