use async_trait::async_trait;

use super::chain::Guard;
use super::context::GuardContext;
use super::error::{GuardError, GuardResult};
use super::primitives::may_edit_submission;
use crate::store::EntityStore;

/// Requires `conf` and `runtag`. The submitter and the owner of the filing
/// organization pass; other members of that organization do not.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserMayEditSubmission;

#[async_trait]
impl Guard for UserMayEditSubmission {
    fn name(&self) -> &'static str {
        "user_may_edit_submission"
    }

    async fn check(&self, store: &dyn EntityStore, ctx: GuardContext) -> GuardResult<GuardContext> {
        let [conf, runtag] = ctx.require(self.name(), ["conf", "runtag"], "No such conf or runtag")?;
        let sub = store
            .find_submission(conf, runtag)
            .await?
            .ok_or(GuardError::not_found(self.name(), "submission"))?;
        let org = store
            .find_organization_by_id(sub.org_id)
            .await?
            .ok_or(GuardError::not_found(self.name(), "org"))?;

        if !may_edit_submission(ctx.principal(), &sub, &org) {
            return Err(GuardError::denied(self.name(), "User may not edit submission"));
        }
        Ok(ctx.attach_sub(sub))
    }
}
