use std::collections::HashMap;

use evalbase_server::guards::{
    ConferenceIsOpen, FailureKind, Guard, GuardChain, GuardContext, TaskIsOpen,
    UserIsActiveParticipant, UserIsMemberOfOrg, UserIsParticipant, UserMayEditSubmission,
    UserOwnsOrg,
};
use evalbase_server::models::{Conference, Organization, Task, User};
use evalbase_server::store::MemoryStore;

struct World {
    store: MemoryStore,
    conf: Conference,
    task: Task,
    acme: Organization,
    u1: User,
    u2: User,
    u3: User,
    u4: User,
}

/// Conference "trec2024" with task "t1"; org "acme" owned by u1 with members
/// u2 and u3; u3 filed "run42" for acme. u4 belongs to nothing.
fn world() -> World {
    let store = MemoryStore::new();
    let u1 = store.insert_user("u1");
    let u2 = store.insert_user("u2");
    let u3 = store.insert_user("u3");
    let u4 = store.insert_user("u4");
    let conf = store.insert_conference("trec2024", false, true);
    let task = store.insert_task(&conf, "t1", true);
    let acme = store.insert_organization(&conf, "acme", &u1, &[&u2, &u3]);
    store.insert_submission(&task, "run42", &u3, &acme);
    World {
        store,
        conf,
        task,
        acme,
        u1,
        u2,
        u3,
        u4,
    }
}

fn ctx(user: &User, params: &[(&str, &str)]) -> GuardContext {
    let params: HashMap<String, String> = params
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    GuardContext::new(user.clone(), params)
}

const ACME: [(&str, &str); 2] = [("org", "acme"), ("conf", "trec2024")];

#[tokio::test]
async fn member_passes_membership_but_not_ownership() {
    let w = world();

    let passed = UserIsMemberOfOrg
        .check(&w.store, ctx(&w.u2, &ACME))
        .await
        .expect("member passes");
    assert_eq!(passed.org().unwrap().shortname, "acme");

    let err = UserOwnsOrg
        .check(&w.store, ctx(&w.u2, &ACME))
        .await
        .expect_err("membership is not ownership");
    assert_eq!(err.kind(), FailureKind::Forbidden);
    assert_eq!(err.to_string(), "User is not org owner");
}

#[tokio::test]
async fn owner_outside_member_set_still_counts_as_member() {
    let w = world();
    assert!(!w.acme.members.contains(&w.u1.id));

    UserIsMemberOfOrg
        .check(&w.store, ctx(&w.u1, &ACME))
        .await
        .expect("owner is a member");
    UserOwnsOrg
        .check(&w.store, ctx(&w.u1, &ACME))
        .await
        .expect("owner owns");

    let err = UserIsMemberOfOrg
        .check(&w.store, ctx(&w.u4, &ACME))
        .await
        .expect_err("outsider");
    assert_eq!(err.to_string(), "User is not member of org");
}

#[tokio::test]
async fn conference_open_follows_complete_flag() {
    let w = world();
    let params = [("conf", "trec2024")];

    let passed = ConferenceIsOpen
        .check(&w.store, ctx(&w.u1, &params))
        .await
        .expect("open conference");
    assert_eq!(passed.conf().unwrap().id, w.conf.id);

    w.store.set_conference_complete("trec2024", true);
    let err = ConferenceIsOpen
        .check(&w.store, ctx(&w.u1, &params))
        .await
        .expect_err("complete conference");
    assert_eq!(err.kind(), FailureKind::Forbidden);
    assert_eq!(err.to_string(), "Conference is not open");
}

#[tokio::test]
async fn closed_task_is_forbidden() {
    let w = world();
    w.store.set_task_open(w.task.id, false);

    let err = TaskIsOpen
        .check(&w.store, ctx(&w.u1, &[("conf", "trec2024"), ("task", "t1")]))
        .await
        .expect_err("closed task");
    assert_eq!(err.kind(), FailureKind::Forbidden);
    assert_eq!(err.to_string(), "Task is not open");
}

#[tokio::test]
async fn submitter_and_owner_may_edit_but_other_members_may_not() {
    let w = world();
    let params = [("conf", "trec2024"), ("runtag", "run42")];

    for editor in [&w.u1, &w.u3] {
        let passed = UserMayEditSubmission
            .check(&w.store, ctx(editor, &params))
            .await
            .expect("editor passes");
        assert_eq!(passed.sub().unwrap().runtag, "run42");
    }

    let err = UserMayEditSubmission
        .check(&w.store, ctx(&w.u2, &params))
        .await
        .expect_err("other member");
    assert_eq!(err.to_string(), "User may not edit submission");
}

#[tokio::test]
async fn outsider_is_not_a_participant() {
    let w = world();

    let err = UserIsParticipant
        .check(&w.store, ctx(&w.u4, &[("conf", "trec2024")]))
        .await
        .expect_err("no org");
    assert_eq!(err.kind(), FailureKind::Forbidden);
    assert_eq!(
        err.to_string(),
        "User is not a member of a participating group"
    );
}

#[tokio::test]
async fn participation_does_not_need_submissions_but_activity_does() {
    let w = world();
    let lab = w.store.insert_organization(&w.conf, "lab", &w.u4, &[]);

    let passed = UserIsParticipant
        .check(&w.store, ctx(&w.u4, &[("conf", "trec2024")]))
        .await
        .expect("owner of lab participates");
    assert_eq!(passed.valid_orgs().unwrap()[0].id, lab.id);

    let err = UserIsActiveParticipant
        .check(&w.store, ctx(&w.u4, &[("conf", "trec2024")]))
        .await
        .expect_err("lab has no runs");
    assert_eq!(err.to_string(), "User is not active participant");

    let active = UserIsActiveParticipant
        .check(&w.store, ctx(&w.u2, &[("conf", "trec2024")]))
        .await
        .expect("acme has a run");
    assert_eq!(active.subs().unwrap().len(), 1);
}

#[tokio::test]
async fn missing_parameters_are_not_found_never_forbidden() {
    let w = world();
    let guards: Vec<Box<dyn Guard>> = vec![
        Box::new(UserIsMemberOfOrg),
        Box::new(UserOwnsOrg),
        Box::new(UserIsActiveParticipant),
        Box::new(UserIsParticipant),
        Box::new(UserMayEditSubmission),
        Box::new(ConferenceIsOpen),
        Box::new(TaskIsOpen),
    ];

    for guard in &guards {
        // u4 would be denied by every guard if parameters were present.
        let err = guard
            .check(&w.store, ctx(&w.u4, &[]))
            .await
            .expect_err("no params");
        assert_eq!(err.kind(), FailureKind::NotFound, "{}", guard.name());
    }
}

#[tokio::test]
async fn chain_accumulates_attachments_in_any_order() {
    let w = world();
    let params = [("conf", "trec2024"), ("task", "t1")];

    let forward = GuardChain::new()
        .then(ConferenceIsOpen)
        .then(TaskIsOpen)
        .then(UserIsParticipant);
    let backward = GuardChain::new()
        .then(UserIsParticipant)
        .then(TaskIsOpen)
        .then(ConferenceIsOpen);

    for chain in [forward, backward] {
        let out = chain
            .run(&w.store, ctx(&w.u2, &params))
            .await
            .expect("all guards pass");
        assert_eq!(out.conf().unwrap().id, w.conf.id);
        assert_eq!(out.task().unwrap().id, w.task.id);
        assert_eq!(out.valid_orgs().unwrap()[0].id, w.acme.id);
        assert_eq!(out.param("task"), Some("t1"));
    }
}

#[tokio::test]
async fn chain_stops_at_first_denial() {
    let w = world();
    w.store.set_conference_complete("trec2024", true);
    let chain = GuardChain::new()
        .then(ConferenceIsOpen)
        .then(UserIsParticipant);

    let err = chain
        .run(&w.store, ctx(&w.u4, &[("conf", "trec2024")]))
        .await
        .expect_err("conference closed");
    assert_eq!(err.to_string(), "Conference is not open");
}
