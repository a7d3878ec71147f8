use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{EntityStore, StoreError, StoreResult};
use crate::models::{
    Conference, NewOrganization, NewSubmission, Organization, Submission, Task, UpdateOrganization,
    User,
};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    conferences: Vec<Conference>,
    tasks: Vec<Task>,
    organizations: Vec<Organization>,
    submissions: Vec<Submission>,
}

impl Tables {
    fn conference_by_shortname(&self, shortname: &str) -> Option<&Conference> {
        self.conferences.iter().find(|c| c.shortname == shortname)
    }

    fn conference_of_task(&self, task_id: Uuid) -> Option<Uuid> {
        self.tasks
            .iter()
            .find(|t| t.id == task_id)
            .map(|t| t.conference_id)
    }

    fn submissions_in_conference<'a>(
        &'a self,
        conference: &str,
    ) -> impl Iterator<Item = &'a Submission> + 'a {
        let conf_id = self.conference_by_shortname(conference).map(|c| c.id);
        self.submissions
            .iter()
            .filter(move |s| conf_id.is_some() && self.conference_of_task(s.task_id) == conf_id)
    }
}

fn belongs_to(org: &Organization, user_id: Uuid) -> bool {
    org.owner_id == user_id || org.members.contains(&user_id)
}

/// In-process [`EntityStore`] used by tests and local demos.
///
/// The `insert_*` and `set_*` methods seed state directly and bypass the
/// uniqueness checks the trait methods apply.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert_user(&self, username: &str) -> User {
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
        };
        self.write().users.push(user.clone());
        user
    }

    pub fn insert_conference(
        &self,
        shortname: &str,
        complete: bool,
        open_signup: bool,
    ) -> Conference {
        let conf = Conference {
            id: Uuid::new_v4(),
            shortname: shortname.to_string(),
            longname: shortname.to_uppercase(),
            complete,
            open_signup,
        };
        self.write().conferences.push(conf.clone());
        conf
    }

    pub fn set_conference_complete(&self, shortname: &str, complete: bool) {
        let mut tables = self.write();
        if let Some(conf) = tables
            .conferences
            .iter_mut()
            .find(|c| c.shortname == shortname)
        {
            conf.complete = complete;
        }
    }

    pub fn insert_task(&self, conference: &Conference, shortname: &str, task_open: bool) -> Task {
        let task = Task {
            id: Uuid::new_v4(),
            conference_id: conference.id,
            shortname: shortname.to_string(),
            longname: shortname.to_string(),
            task_open,
        };
        self.write().tasks.push(task.clone());
        task
    }

    pub fn set_task_open(&self, task_id: Uuid, task_open: bool) {
        let mut tables = self.write();
        if let Some(task) = tables.tasks.iter_mut().find(|t| t.id == task_id) {
            task.task_open = task_open;
        }
    }

    /// Seeds an organization whose member list holds exactly `members`.
    /// The owner is not added implicitly.
    pub fn insert_organization(
        &self,
        conference: &Conference,
        shortname: &str,
        owner: &User,
        members: &[&User],
    ) -> Organization {
        let org = Organization {
            id: Uuid::new_v4(),
            shortname: shortname.to_string(),
            longname: shortname.to_string(),
            conference_id: conference.id,
            owner_id: owner.id,
            contact_person_id: owner.id,
            passphrase: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            members: members.iter().map(|u| u.id).collect(),
        };
        self.write().organizations.push(org.clone());
        org
    }

    pub fn insert_submission(
        &self,
        task: &Task,
        runtag: &str,
        submitted_by: &User,
        org: &Organization,
    ) -> Submission {
        let sub = Submission {
            id: Uuid::new_v4(),
            task_id: task.id,
            runtag: runtag.to_string(),
            submitted_by: submitted_by.id,
            org_id: org.id,
            created_at: Utc::now(),
        };
        self.write().submissions.push(sub.clone());
        sub
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .read()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_conference(&self, shortname: &str) -> StoreResult<Option<Conference>> {
        Ok(self.read().conference_by_shortname(shortname).cloned())
    }

    async fn find_task(&self, conference_id: Uuid, shortname: &str) -> StoreResult<Option<Task>> {
        Ok(self
            .read()
            .tasks
            .iter()
            .find(|t| t.conference_id == conference_id && t.shortname == shortname)
            .cloned())
    }

    async fn find_organization(
        &self,
        conference: &str,
        shortname: &str,
    ) -> StoreResult<Option<Organization>> {
        let tables = self.read();
        let Some(conf) = tables.conference_by_shortname(conference) else {
            return Ok(None);
        };
        Ok(tables
            .organizations
            .iter()
            .find(|o| o.conference_id == conf.id && o.shortname == shortname)
            .cloned())
    }

    async fn find_organization_by_id(&self, id: Uuid) -> StoreResult<Option<Organization>> {
        Ok(self
            .read()
            .organizations
            .iter()
            .find(|o| o.id == id)
            .cloned())
    }

    async fn organizations_for_user_in_conference(
        &self,
        conference: &str,
        user_id: Uuid,
    ) -> StoreResult<Vec<Organization>> {
        let tables = self.read();
        let Some(conf) = tables.conference_by_shortname(conference) else {
            return Ok(Vec::new());
        };
        Ok(tables
            .organizations
            .iter()
            .filter(|o| o.conference_id == conf.id && belongs_to(o, user_id))
            .cloned()
            .collect())
    }

    async fn submissions_for_organizations(
        &self,
        conference: &str,
        org_ids: &[Uuid],
    ) -> StoreResult<Vec<Submission>> {
        let tables = self.read();
        Ok(tables
            .submissions_in_conference(conference)
            .filter(|s| org_ids.contains(&s.org_id))
            .cloned()
            .collect())
    }

    async fn find_submission(
        &self,
        conference: &str,
        runtag: &str,
    ) -> StoreResult<Option<Submission>> {
        let tables = self.read();
        let sub = tables
            .submissions_in_conference(conference)
            .find(|s| s.runtag == runtag)
            .cloned();
        Ok(sub)
    }

    async fn open_signup_conferences(&self) -> StoreResult<Vec<Conference>> {
        Ok(self
            .read()
            .conferences
            .iter()
            .filter(|c| c.open_signup)
            .cloned()
            .collect())
    }

    async fn organizations_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Organization>> {
        Ok(self
            .read()
            .organizations
            .iter()
            .filter(|o| belongs_to(o, user_id))
            .cloned()
            .collect())
    }

    async fn active_organizations_for_user(
        &self,
        user_id: Uuid,
    ) -> StoreResult<Vec<Organization>> {
        let tables = self.read();
        let open: Vec<Uuid> = tables
            .conferences
            .iter()
            .filter(|c| !c.complete)
            .map(|c| c.id)
            .collect();
        Ok(tables
            .organizations
            .iter()
            .filter(|o| open.contains(&o.conference_id) && o.members.contains(&user_id))
            .cloned()
            .collect())
    }

    async fn create_organization(&self, new: NewOrganization) -> StoreResult<Organization> {
        let mut tables = self.write();
        let taken = tables
            .organizations
            .iter()
            .any(|o| o.conference_id == new.conference_id && o.shortname == new.shortname);
        if taken {
            return Err(StoreError::Conflict(format!(
                "Organization '{}' already exists",
                new.shortname
            )));
        }
        let org = Organization {
            id: Uuid::new_v4(),
            shortname: new.shortname,
            longname: new.longname,
            conference_id: new.conference_id,
            owner_id: new.owner_id,
            contact_person_id: new.contact_person_id,
            passphrase: new.passphrase,
            created_at: Utc::now(),
            members: vec![new.owner_id],
        };
        tables.organizations.push(org.clone());
        Ok(org)
    }

    async fn update_organization(
        &self,
        id: Uuid,
        update: UpdateOrganization,
    ) -> StoreResult<Organization> {
        let mut tables = self.write();
        let org = tables
            .organizations
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(StoreError::Missing("Organization"))?;
        if let Some(longname) = update.longname {
            org.longname = longname;
        }
        if let Some(contact) = update.contact_person_id {
            org.contact_person_id = contact;
        }
        Ok(org.clone())
    }

    async fn add_member(&self, org_id: Uuid, user_id: Uuid) -> StoreResult<()> {
        let mut tables = self.write();
        let org = tables
            .organizations
            .iter_mut()
            .find(|o| o.id == org_id)
            .ok_or(StoreError::Missing("Organization"))?;
        if !org.members.contains(&user_id) {
            org.members.push(user_id);
        }
        Ok(())
    }

    async fn create_submission(&self, new: NewSubmission) -> StoreResult<Submission> {
        let mut tables = self.write();
        let conf_id = tables
            .conference_of_task(new.task_id)
            .ok_or(StoreError::Missing("Task"))?;
        let taken = tables
            .submissions
            .iter()
            .any(|s| {
                s.runtag == new.runtag && tables.conference_of_task(s.task_id) == Some(conf_id)
            });
        if taken {
            return Err(StoreError::Conflict(format!(
                "Runtag '{}' is already in use",
                new.runtag
            )));
        }
        let sub = Submission {
            id: Uuid::new_v4(),
            task_id: new.task_id,
            runtag: new.runtag,
            submitted_by: new.submitted_by,
            org_id: new.org_id,
            created_at: Utc::now(),
        };
        tables.submissions.push(sub.clone());
        Ok(sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_owner_counts_toward_conference_organizations() {
        let store = MemoryStore::new();
        let owner = store.insert_user("u1");
        let conf = store.insert_conference("trec2024", false, true);
        store.insert_organization(&conf, "acme", &owner, &[]);

        let orgs = store
            .organizations_for_user_in_conference("trec2024", owner.id)
            .await
            .unwrap();
        assert_eq!(orgs.len(), 1);
        assert!(store
            .organizations_for_user_in_conference("other", owner.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_runtag_unique_within_conference_only() {
        let store = MemoryStore::new();
        let user = store.insert_user("u1");
        let a = store.insert_conference("a", false, true);
        let b = store.insert_conference("b", false, true);
        let task_a = store.insert_task(&a, "t1", true);
        let task_b = store.insert_task(&b, "t1", true);
        let org = store.insert_organization(&a, "acme", &user, &[]);
        store.insert_submission(&task_a, "run42", &user, &org);

        let duplicate = store
            .create_submission(NewSubmission {
                task_id: task_a.id,
                runtag: "run42".to_string(),
                submitted_by: user.id,
                org_id: org.id,
            })
            .await;
        assert!(matches!(duplicate, Err(StoreError::Conflict(_))));

        let elsewhere = store
            .create_submission(NewSubmission {
                task_id: task_b.id,
                runtag: "run42".to_string(),
                submitted_by: user.id,
                org_id: org.id,
            })
            .await;
        assert!(elsewhere.is_ok());
    }

    #[tokio::test]
    async fn test_find_submission_scoped_to_conference() {
        let store = MemoryStore::new();
        let user = store.insert_user("u1");
        let conf = store.insert_conference("trec2024", false, true);
        let task = store.insert_task(&conf, "t1", true);
        let org = store.insert_organization(&conf, "acme", &user, &[]);
        store.insert_submission(&task, "run42", &user, &org);

        assert!(store.find_submission("trec2024", "run42").await.unwrap().is_some());
        assert!(store.find_submission("trec2023", "run42").await.unwrap().is_none());
    }
}
