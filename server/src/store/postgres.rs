use async_trait::async_trait;
use sqlx::postgres::PgPool;
use uuid::Uuid;

use super::{EntityStore, StoreError, StoreResult};
use crate::models::{
    Conference, NewOrganization, NewSubmission, Organization, Submission, Task, UpdateOrganization,
    User,
};

const ORGANIZATION_SELECT_SQL: &str = "SELECT
    o.id,
    o.shortname,
    o.longname,
    o.conference_id,
    o.owner_id,
    o.contact_person_id,
    o.passphrase,
    o.created_at
FROM organizations o";

const SUBMISSION_SELECT_SQL: &str = "SELECT
    s.id,
    s.task_id,
    s.runtag,
    s.submitted_by,
    s.org_id,
    s.created_at
FROM submissions s
JOIN tasks t ON t.id = s.task_id
JOIN conferences c ON c.id = t.conference_id";

/// Postgres-backed store. Every lookup is a single read on the pool, so
/// callers only ever observe committed rows.
#[derive(Clone)]
pub struct PgEntityStore {
    pool: PgPool,
}

impl PgEntityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn attach_members(&self, orgs: &mut [Organization]) -> StoreResult<()> {
        if orgs.is_empty() {
            return Ok(());
        }
        let ids: Vec<Uuid> = orgs.iter().map(|org| org.id).collect();
        let rows: Vec<(Uuid, Uuid)> = sqlx::query_as(
            "SELECT organization_id, user_id FROM organization_members
             WHERE organization_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        for org in orgs.iter_mut() {
            org.members = rows
                .iter()
                .filter(|(org_id, _)| *org_id == org.id)
                .map(|(_, user_id)| *user_id)
                .collect();
        }
        Ok(())
    }

    async fn with_members(&self, org: Option<Organization>) -> StoreResult<Option<Organization>> {
        match org {
            Some(org) => {
                let mut orgs = [org];
                self.attach_members(&mut orgs).await?;
                let [org] = orgs;
                Ok(Some(org))
            }
            None => Ok(None),
        }
    }
}

fn conflict_or(err: sqlx::Error, message: impl Into<String>) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(message.into())
        }
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl EntityStore for PgEntityStore {
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT id, username FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_conference(&self, shortname: &str) -> StoreResult<Option<Conference>> {
        let conf = sqlx::query_as::<_, Conference>(
            "SELECT id, shortname, longname, complete, open_signup
             FROM conferences WHERE shortname = $1",
        )
        .bind(shortname)
        .fetch_optional(&self.pool)
        .await?;
        Ok(conf)
    }

    async fn find_task(&self, conference_id: Uuid, shortname: &str) -> StoreResult<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(
            "SELECT id, conference_id, shortname, longname, task_open
             FROM tasks WHERE conference_id = $1 AND shortname = $2",
        )
        .bind(conference_id)
        .bind(shortname)
        .fetch_optional(&self.pool)
        .await?;
        Ok(task)
    }

    async fn find_organization(
        &self,
        conference: &str,
        shortname: &str,
    ) -> StoreResult<Option<Organization>> {
        let sql = format!(
            "{ORGANIZATION_SELECT_SQL}
             JOIN conferences c ON c.id = o.conference_id
             WHERE c.shortname = $1 AND o.shortname = $2"
        );
        let org = sqlx::query_as::<_, Organization>(&sql)
            .bind(conference)
            .bind(shortname)
            .fetch_optional(&self.pool)
            .await?;
        self.with_members(org).await
    }

    async fn find_organization_by_id(&self, id: Uuid) -> StoreResult<Option<Organization>> {
        let sql = format!("{ORGANIZATION_SELECT_SQL} WHERE o.id = $1");
        let org = sqlx::query_as::<_, Organization>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        self.with_members(org).await
    }

    async fn organizations_for_user_in_conference(
        &self,
        conference: &str,
        user_id: Uuid,
    ) -> StoreResult<Vec<Organization>> {
        let sql = format!(
            "{ORGANIZATION_SELECT_SQL}
             JOIN conferences c ON c.id = o.conference_id
             WHERE c.shortname = $1
               AND (o.owner_id = $2 OR EXISTS (
                    SELECT 1 FROM organization_members m
                    WHERE m.organization_id = o.id AND m.user_id = $2))
             ORDER BY o.shortname"
        );
        let mut orgs = sqlx::query_as::<_, Organization>(&sql)
            .bind(conference)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        self.attach_members(&mut orgs).await?;
        Ok(orgs)
    }

    async fn submissions_for_organizations(
        &self,
        conference: &str,
        org_ids: &[Uuid],
    ) -> StoreResult<Vec<Submission>> {
        if org_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "{SUBMISSION_SELECT_SQL}
             WHERE c.shortname = $1 AND s.org_id = ANY($2)
             ORDER BY s.created_at"
        );
        let subs = sqlx::query_as::<_, Submission>(&sql)
            .bind(conference)
            .bind(org_ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(subs)
    }

    async fn find_submission(
        &self,
        conference: &str,
        runtag: &str,
    ) -> StoreResult<Option<Submission>> {
        let sql = format!("{SUBMISSION_SELECT_SQL} WHERE c.shortname = $1 AND s.runtag = $2");
        let sub = sqlx::query_as::<_, Submission>(&sql)
            .bind(conference)
            .bind(runtag)
            .fetch_optional(&self.pool)
            .await?;
        Ok(sub)
    }

    async fn open_signup_conferences(&self) -> StoreResult<Vec<Conference>> {
        let confs = sqlx::query_as::<_, Conference>(
            "SELECT id, shortname, longname, complete, open_signup
             FROM conferences WHERE open_signup ORDER BY shortname",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(confs)
    }

    async fn organizations_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Organization>> {
        let sql = format!(
            "{ORGANIZATION_SELECT_SQL}
             WHERE o.owner_id = $1 OR EXISTS (
                SELECT 1 FROM organization_members m
                WHERE m.organization_id = o.id AND m.user_id = $1)
             ORDER BY o.shortname"
        );
        let mut orgs = sqlx::query_as::<_, Organization>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        self.attach_members(&mut orgs).await?;
        Ok(orgs)
    }

    async fn active_organizations_for_user(
        &self,
        user_id: Uuid,
    ) -> StoreResult<Vec<Organization>> {
        let sql = format!(
            "{ORGANIZATION_SELECT_SQL}
             JOIN conferences c ON c.id = o.conference_id
             WHERE NOT c.complete
               AND EXISTS (
                SELECT 1 FROM organization_members m
                WHERE m.organization_id = o.id AND m.user_id = $1)
             ORDER BY o.shortname"
        );
        let mut orgs = sqlx::query_as::<_, Organization>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        self.attach_members(&mut orgs).await?;
        Ok(orgs)
    }

    async fn create_organization(&self, new: NewOrganization) -> StoreResult<Organization> {
        let mut tx = self.pool.begin().await?;
        let org = sqlx::query_as::<_, Organization>(
            "INSERT INTO organizations
                (id, shortname, longname, conference_id, owner_id, contact_person_id, passphrase)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING id, shortname, longname, conference_id, owner_id,
                       contact_person_id, passphrase, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&new.shortname)
        .bind(&new.longname)
        .bind(new.conference_id)
        .bind(new.owner_id)
        .bind(new.contact_person_id)
        .bind(&new.passphrase)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| {
            conflict_or(err, format!("Organization '{}' already exists", new.shortname))
        })?;

        sqlx::query("INSERT INTO organization_members (organization_id, user_id) VALUES ($1, $2)")
            .bind(org.id)
            .bind(new.owner_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        let mut orgs = [org];
        self.attach_members(&mut orgs).await?;
        let [org] = orgs;
        Ok(org)
    }

    async fn update_organization(
        &self,
        id: Uuid,
        update: UpdateOrganization,
    ) -> StoreResult<Organization> {
        let org = sqlx::query_as::<_, Organization>(
            "UPDATE organizations SET
                longname = COALESCE($2, longname),
                contact_person_id = COALESCE($3, contact_person_id)
             WHERE id = $1
             RETURNING id, shortname, longname, conference_id, owner_id,
                       contact_person_id, passphrase, created_at",
        )
        .bind(id)
        .bind(update.longname)
        .bind(update.contact_person_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::Missing("Organization"))?;
        self.with_members(Some(org))
            .await?
            .ok_or(StoreError::Missing("Organization"))
    }

    async fn add_member(&self, org_id: Uuid, user_id: Uuid) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO organization_members (organization_id, user_id) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(org_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn create_submission(&self, new: NewSubmission) -> StoreResult<Submission> {
        // conference_id is denormalized so runtags stay unique per conference.
        let sub = sqlx::query_as::<_, Submission>(
            "INSERT INTO submissions (id, task_id, conference_id, runtag, submitted_by, org_id)
             SELECT $1, t.id, t.conference_id, $3, $4, $5 FROM tasks t WHERE t.id = $2
             RETURNING id, task_id, runtag, submitted_by, org_id, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(new.task_id)
        .bind(&new.runtag)
        .bind(new.submitted_by)
        .bind(new.org_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| conflict_or(err, format!("Runtag '{}' is already in use", new.runtag)))?
        .ok_or(StoreError::Missing("Task"))?;
        Ok(sub)
    }
}
