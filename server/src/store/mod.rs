//! Entity store: the relational state that guards and handlers read.
//!
//! Guards only ever call the lookup methods. The write methods exist for the
//! handlers that create organizations and submissions.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Conference, NewOrganization, NewSubmission, Organization, Submission, Task, UpdateOrganization,
    User,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgEntityStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error")]
    Database(#[from] sqlx::Error),

    /// A natural key that must be unique is already taken.
    #[error("{0}")]
    Conflict(String),

    #[error("{0} not found")]
    Missing(&'static str),
}

#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    async fn find_conference(&self, shortname: &str) -> StoreResult<Option<Conference>>;

    async fn find_task(&self, conference_id: Uuid, shortname: &str) -> StoreResult<Option<Task>>;

    /// Organization by its shortname within the named conference, members loaded.
    async fn find_organization(
        &self,
        conference: &str,
        shortname: &str,
    ) -> StoreResult<Option<Organization>>;

    async fn find_organization_by_id(&self, id: Uuid) -> StoreResult<Option<Organization>>;

    /// Organizations registered under `conference` that the user owns or belongs to.
    async fn organizations_for_user_in_conference(
        &self,
        conference: &str,
        user_id: Uuid,
    ) -> StoreResult<Vec<Organization>>;

    /// Submissions to tasks of `conference` filed on behalf of any of `org_ids`.
    async fn submissions_for_organizations(
        &self,
        conference: &str,
        org_ids: &[Uuid],
    ) -> StoreResult<Vec<Submission>>;

    /// Submission by runtag among the tasks of `conference`.
    async fn find_submission(
        &self,
        conference: &str,
        runtag: &str,
    ) -> StoreResult<Option<Submission>>;

    async fn open_signup_conferences(&self) -> StoreResult<Vec<Conference>>;

    /// Every organization the user owns or belongs to, across conferences.
    async fn organizations_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Organization>>;

    /// Organizations the user belongs to in conferences that are not complete.
    async fn active_organizations_for_user(&self, user_id: Uuid)
        -> StoreResult<Vec<Organization>>;

    async fn create_organization(&self, new: NewOrganization) -> StoreResult<Organization>;

    async fn update_organization(
        &self,
        id: Uuid,
        update: UpdateOrganization,
    ) -> StoreResult<Organization>;

    /// Adds `user_id` to the organization. Adding an existing member is a no-op.
    async fn add_member(&self, org_id: Uuid, user_id: Uuid) -> StoreResult<()>;

    async fn create_submission(&self, new: NewSubmission) -> StoreResult<Submission>;
}
