//! Pure authorization predicates over already-resolved entities.
//!
//! Nothing here touches the store or fails. The guards in this module's
//! siblings resolve entities and then ask these functions for a verdict.

use uuid::Uuid;

use crate::models::{Conference, Organization, Submission, Task, User};

/// The owner counts as a member whether or not the membership table lists them.
pub fn is_member(user: &User, org: &Organization) -> bool {
    org.owner_id == user.id || org.members.contains(&user.id)
}

pub fn is_owner(user: &User, org: &Organization) -> bool {
    org.owner_id == user.id
}

/// Narrows `orgs` to those the user is a member of.
pub fn participating_orgs<'a>(
    user: &User,
    orgs: impl IntoIterator<Item = &'a Organization>,
) -> Vec<&'a Organization> {
    orgs.into_iter().filter(|org| is_member(user, org)).collect()
}

/// `orgs` is the user's organization set within one conference.
pub fn participates_in(orgs: &[Organization]) -> bool {
    !orgs.is_empty()
}

/// True when any of `subs` was filed on behalf of one of `orgs`.
/// Submissions from other organizations are ignored.
pub fn has_active_submission(orgs: &[Organization], subs: &[Submission]) -> bool {
    let org_ids: Vec<Uuid> = orgs.iter().map(|org| org.id).collect();
    subs.iter().any(|sub| org_ids.contains(&sub.org_id))
}

pub fn is_conference_open(conf: &Conference) -> bool {
    !conf.complete
}

pub fn is_task_open(task: &Task) -> bool {
    task.task_open
}

/// `org` must be the organization the submission was filed for.
pub fn may_edit_submission(user: &User, sub: &Submission, org: &Organization) -> bool {
    sub.submitted_by == user.id || org.owner_id == user.id
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(name: &str) -> User {
        User {
            id: Uuid::new_v4(),
            username: name.to_string(),
        }
    }

    fn org(owner: &User, members: &[&User]) -> Organization {
        Organization {
            id: Uuid::new_v4(),
            shortname: "acme".to_string(),
            longname: "Acme".to_string(),
            conference_id: Uuid::new_v4(),
            owner_id: owner.id,
            contact_person_id: owner.id,
            passphrase: "secret".to_string(),
            created_at: Utc::now(),
            members: members.iter().map(|u| u.id).collect(),
        }
    }

    fn submission(by: &User, org: &Organization) -> Submission {
        Submission {
            id: Uuid::new_v4(),
            task_id: Uuid::new_v4(),
            runtag: "run42".to_string(),
            submitted_by: by.id,
            org_id: org.id,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_owner_is_member_without_membership_row() {
        let owner = user("u1");
        let member = user("u2");
        let outsider = user("u4");
        let acme = org(&owner, &[&member]);

        assert!(is_member(&owner, &acme));
        assert!(is_member(&member, &acme));
        assert!(!is_member(&outsider, &acme));
    }

    #[test]
    fn test_membership_is_not_ownership() {
        let owner = user("u1");
        let member = user("u2");
        let acme = org(&owner, &[&member]);

        assert!(is_owner(&owner, &acme));
        assert!(!is_owner(&member, &acme));
    }

    #[test]
    fn test_participating_orgs_filters_by_membership() {
        let owner = user("u1");
        let member = user("u2");
        let acme = org(&owner, &[&member]);
        let other = org(&owner, &[]);
        let all = [acme.clone(), other];

        let mine = participating_orgs(&member, &all);
        assert_eq!(mine, vec![&acme]);
        assert_eq!(participating_orgs(&owner, &all).len(), 2);
    }

    #[test]
    fn test_participation_requires_an_org() {
        let owner = user("u1");
        assert!(!participates_in(&[]));
        assert!(participates_in(&[org(&owner, &[])]));
    }

    #[test]
    fn test_active_submission_must_belong_to_user_org() {
        let owner = user("u1");
        let acme = org(&owner, &[]);
        let rival = org(&user("u9"), &[]);

        assert!(!has_active_submission(&[acme.clone()], &[]));
        assert!(!has_active_submission(
            &[acme.clone()],
            &[submission(&owner, &rival)]
        ));
        assert!(has_active_submission(&[acme.clone()], &[submission(&owner, &acme)]));
    }

    #[test]
    fn test_lifecycle_flags() {
        let mut conf = Conference {
            id: Uuid::new_v4(),
            shortname: "trec2024".to_string(),
            longname: "TREC 2024".to_string(),
            complete: false,
            open_signup: true,
        };
        assert!(is_conference_open(&conf));
        conf.complete = true;
        assert!(!is_conference_open(&conf));

        let task = Task {
            id: Uuid::new_v4(),
            conference_id: conf.id,
            shortname: "t1".to_string(),
            longname: "Task one".to_string(),
            task_open: false,
        };
        assert!(!is_task_open(&task));
    }

    #[test]
    fn test_submitter_or_org_owner_may_edit() {
        let owner = user("u1");
        let member = user("u2");
        let submitter = user("u3");
        let acme = org(&owner, &[&member, &submitter]);
        let sub = submission(&submitter, &acme);

        assert!(may_edit_submission(&owner, &sub, &acme));
        assert!(may_edit_submission(&submitter, &sub, &acme));
        assert!(!may_edit_submission(&member, &sub, &acme));
    }
}
