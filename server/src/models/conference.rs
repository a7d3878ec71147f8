use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Conference {
    pub id: Uuid,
    pub shortname: String,
    pub longname: String,
    /// Set once the evaluation has closed. Complete conferences accept no changes.
    pub complete: bool,
    pub open_signup: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub conference_id: Uuid,
    pub shortname: String,
    pub longname: String,
    pub task_open: bool,
}
