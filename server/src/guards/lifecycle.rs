//! Guards over conference and task lifecycle flags.

use async_trait::async_trait;

use super::chain::Guard;
use super::context::GuardContext;
use super::error::{GuardError, GuardResult};
use super::primitives::{is_conference_open, is_task_open};
use crate::store::EntityStore;

/// Requires `conf`; attaches `_conf` while the conference is not complete.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConferenceIsOpen;

#[async_trait]
impl Guard for ConferenceIsOpen {
    fn name(&self) -> &'static str {
        "conference_is_open"
    }

    async fn check(&self, store: &dyn EntityStore, ctx: GuardContext) -> GuardResult<GuardContext> {
        let [conf] = ctx.require(self.name(), ["conf"], "No such conf")?;
        let conf = store
            .find_conference(conf)
            .await?
            .ok_or(GuardError::not_found(self.name(), "conf"))?;
        if !is_conference_open(&conf) {
            return Err(GuardError::denied(self.name(), "Conference is not open"));
        }
        Ok(ctx.attach_conf(conf))
    }
}

/// Requires `conf` and `task`; attaches `_conf` and `_task` while the task
/// accepts submissions. The conference itself may be complete.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskIsOpen;

#[async_trait]
impl Guard for TaskIsOpen {
    fn name(&self) -> &'static str {
        "task_is_open"
    }

    async fn check(&self, store: &dyn EntityStore, ctx: GuardContext) -> GuardResult<GuardContext> {
        let [conf, task] = ctx.require(self.name(), ["conf", "task"], "No such conf or task")?;
        let conf = store
            .find_conference(conf)
            .await?
            .ok_or(GuardError::not_found(self.name(), "conf"))?;
        let task = store
            .find_task(conf.id, task)
            .await?
            .ok_or(GuardError::not_found(self.name(), "task"))?;
        if !is_task_open(&task) {
            return Err(GuardError::denied(self.name(), "Task is not open"));
        }
        Ok(ctx.attach_conf(conf).attach_task(task))
    }
}
