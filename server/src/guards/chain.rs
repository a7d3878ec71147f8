use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::context::GuardContext;
use super::error::GuardResult;
use crate::store::EntityStore;

/// One authorization stage.
///
/// A guard reads the route parameters it needs from the context, resolves
/// entities through the store, and either returns the context extended with
/// its attachments or fails. Guards never rely on another guard's
/// attachments, so any subset in any order forms a valid chain.
#[async_trait]
pub trait Guard: Send + Sync {
    fn name(&self) -> &'static str;

    async fn check(&self, store: &dyn EntityStore, ctx: GuardContext) -> GuardResult<GuardContext>;
}

/// Ordered list of guards run ahead of a handler.
#[derive(Clone, Default)]
pub struct GuardChain {
    guards: Vec<Arc<dyn Guard>>,
}

impl GuardChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then<G>(mut self, guard: G) -> Self
    where
        G: Guard + 'static,
    {
        self.guards.push(Arc::new(guard));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.guards.iter().map(|guard| guard.name()).collect()
    }

    /// Runs every guard in order. The first failure stops the chain.
    pub async fn run(
        &self,
        store: &dyn EntityStore,
        mut ctx: GuardContext,
    ) -> GuardResult<GuardContext> {
        for guard in &self.guards {
            let user = ctx.principal().username.clone();
            ctx = match guard.check(store, ctx).await {
                Ok(next) => {
                    debug!(guard = guard.name(), user = %user, "Guard passed");
                    next
                }
                // The HTTP error layer logs the rejection itself.
                Err(err) => {
                    debug!(guard = guard.name(), user = %user, kind = ?err.kind(), error = %err, "Guard stopped request");
                    return Err(err);
                }
            };
        }
        Ok(ctx)
    }
}

impl fmt::Debug for GuardChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guards::error::{FailureKind, GuardError};
    use crate::models::User;
    use crate::store::MemoryStore;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    struct Counting {
        calls: Arc<AtomicUsize>,
        allow: bool,
    }

    #[async_trait]
    impl Guard for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn check(
            &self,
            _store: &dyn EntityStore,
            ctx: GuardContext,
        ) -> GuardResult<GuardContext> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.allow {
                Ok(ctx)
            } else {
                Err(GuardError::denied("counting", "nope"))
            }
        }
    }

    fn context() -> GuardContext {
        let user = User {
            id: Uuid::new_v4(),
            username: "u1".to_string(),
        };
        GuardContext::new(user, HashMap::new())
    }

    #[tokio::test]
    async fn test_empty_chain_passes_context_through() {
        let store = MemoryStore::new();
        let ctx = GuardChain::new().run(&store, context()).await.unwrap();
        assert!(ctx.params().is_empty());
    }

    #[tokio::test]
    async fn test_first_failure_short_circuits() {
        let store = MemoryStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = GuardChain::new()
            .then(Counting {
                calls: calls.clone(),
                allow: true,
            })
            .then(Counting {
                calls: calls.clone(),
                allow: false,
            })
            .then(Counting {
                calls: calls.clone(),
                allow: true,
            });
        assert_eq!(chain.names(), ["counting"; 3]);

        let err = chain.run(&store, context()).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Forbidden);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
