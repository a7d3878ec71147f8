use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::auth::Principal;
use crate::models::{Conference, Organization};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

#[derive(Serialize)]
struct HomePayload {
    open_conferences: Vec<Conference>,
    my_orgs: Vec<Organization>,
}

/// Conferences accepting sign-ups, and the user's organizations in
/// conferences that are still running.
pub async fn home(
    State(state): State<AppState>,
    Principal(user): Principal,
) -> Result<Response, AppError> {
    let payload = HomePayload {
        open_conferences: state.store.open_signup_conferences().await?,
        my_orgs: state.store.active_organizations_for_user(user.id).await?,
    };
    Ok(success(payload, "Home").into_response())
}
