//! Guards over organization membership and conference participation.

use async_trait::async_trait;

use super::chain::Guard;
use super::context::GuardContext;
use super::error::{GuardError, GuardResult};
use super::primitives::{
    has_active_submission, is_member, is_owner, participates_in, participating_orgs,
};
use crate::models::Organization;
use crate::store::EntityStore;

async fn resolve_org(
    guard: &'static str,
    store: &dyn EntityStore,
    ctx: &GuardContext,
) -> GuardResult<Organization> {
    let [org, conf] = ctx.require(guard, ["org", "conf"], "No such org or conf")?;
    store
        .find_organization(conf, org)
        .await?
        .ok_or(GuardError::not_found(guard, "org"))
}

async fn resolve_participating_orgs(
    guard: &'static str,
    store: &dyn EntityStore,
    ctx: &GuardContext,
) -> GuardResult<Vec<Organization>> {
    let [conf] = ctx.require(guard, ["conf"], "No such conf")?;
    let user = ctx.principal();
    let candidates = store
        .organizations_for_user_in_conference(conf, user.id)
        .await?;
    Ok(participating_orgs(user, &candidates)
        .into_iter()
        .cloned()
        .collect())
}

/// Requires `org` and `conf`; attaches `_org` when the user owns or belongs to it.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserIsMemberOfOrg;

#[async_trait]
impl Guard for UserIsMemberOfOrg {
    fn name(&self) -> &'static str {
        "user_is_member_of_org"
    }

    async fn check(&self, store: &dyn EntityStore, ctx: GuardContext) -> GuardResult<GuardContext> {
        let org = resolve_org(self.name(), store, &ctx).await?;
        if !is_member(ctx.principal(), &org) {
            return Err(GuardError::denied(self.name(), "User is not member of org"));
        }
        Ok(ctx.attach_org(org))
    }
}

/// Like [`UserIsMemberOfOrg`] but only the owner passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserOwnsOrg;

#[async_trait]
impl Guard for UserOwnsOrg {
    fn name(&self) -> &'static str {
        "user_owns_org"
    }

    async fn check(&self, store: &dyn EntityStore, ctx: GuardContext) -> GuardResult<GuardContext> {
        let org = resolve_org(self.name(), store, &ctx).await?;
        if !is_owner(ctx.principal(), &org) {
            return Err(GuardError::denied(self.name(), "User is not org owner"));
        }
        Ok(ctx.attach_org(org))
    }
}

/// Requires `conf`; attaches `_valid_orgs`, the user's organizations there.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserIsParticipant;

#[async_trait]
impl Guard for UserIsParticipant {
    fn name(&self) -> &'static str {
        "user_is_participant"
    }

    async fn check(&self, store: &dyn EntityStore, ctx: GuardContext) -> GuardResult<GuardContext> {
        let orgs = resolve_participating_orgs(self.name(), store, &ctx).await?;
        if !participates_in(&orgs) {
            return Err(GuardError::denied(
                self.name(),
                "User is not a member of a participating group",
            ));
        }
        Ok(ctx.attach_valid_orgs(orgs))
    }
}

/// Requires `conf`; passes once one of the user's organizations there has
/// filed a submission. Attaches `_valid_orgs` and `_subs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserIsActiveParticipant;

#[async_trait]
impl Guard for UserIsActiveParticipant {
    fn name(&self) -> &'static str {
        "user_is_active_participant"
    }

    async fn check(&self, store: &dyn EntityStore, ctx: GuardContext) -> GuardResult<GuardContext> {
        let orgs = resolve_participating_orgs(self.name(), store, &ctx).await?;
        let [conf] = ctx.require(self.name(), ["conf"], "No such conf")?;
        let org_ids: Vec<_> = orgs.iter().map(|org| org.id).collect();
        let subs = store.submissions_for_organizations(conf, &org_ids).await?;
        if !has_active_submission(&orgs, &subs) {
            return Err(GuardError::denied(self.name(), "User is not active participant"));
        }
        Ok(ctx.attach_valid_orgs(orgs).attach_subs(subs))
    }
}
