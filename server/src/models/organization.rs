use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A group of users participating in one conference.
///
/// `members` is loaded separately from the membership table. The owner is
/// not required to appear in it; see [`crate::guards::primitives::is_member`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Organization {
    pub id: Uuid,
    pub shortname: String,
    pub longname: String,
    pub conference_id: Uuid,
    pub owner_id: Uuid,
    pub contact_person_id: Uuid,
    #[serde(skip_serializing)]
    pub passphrase: String,
    pub created_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(default)]
    pub members: Vec<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewOrganization {
    pub shortname: String,
    pub longname: String,
    pub conference_id: Uuid,
    pub owner_id: Uuid,
    pub contact_person_id: Uuid,
    pub passphrase: String,
}

/// Fields the owner may change after creation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateOrganization {
    pub longname: Option<String>,
    pub contact_person_id: Option<Uuid>,
}
