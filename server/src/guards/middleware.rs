use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::MethodRouter;

use super::chain::GuardChain;
use super::context::GuardContext;
use crate::auth::Principal;
use crate::state::AppState;
use crate::store::EntityStore;
use crate::utils::error::AppError;

/// State handed to [`enforce`]: the chain for one route plus the store it reads.
#[derive(Clone)]
pub struct ChainState {
    store: Arc<dyn EntityStore>,
    chain: GuardChain,
}

impl ChainState {
    pub fn new(store: Arc<dyn EntityStore>, chain: GuardChain) -> Self {
        Self { store, chain }
    }
}

/// Runs the route's guard chain and hands the resulting [`GuardContext`] to
/// the handler through request extensions.
///
/// `Principal` is extracted first so unauthenticated requests are rejected
/// before any guard runs. Routes without path parameters see an empty map.
pub async fn enforce(
    State(state): State<ChainState>,
    Principal(user): Principal,
    params: Option<Path<HashMap<String, String>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let params = params.map(|Path(params)| params).unwrap_or_default();
    let ctx = state
        .chain
        .run(state.store.as_ref(), GuardContext::new(user, params))
        .await?;
    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}

/// Wraps a method router so `chain` runs ahead of its handlers.
pub fn guarded(
    route: MethodRouter<AppState>,
    state: &AppState,
    chain: GuardChain,
) -> MethodRouter<AppState> {
    route.route_layer(middleware::from_fn_with_state(
        ChainState::new(state.store.clone(), chain),
        enforce,
    ))
}
