use axum::middleware;
use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::resolve_identity;
use crate::config::{create_cors_layer, create_security_headers_layer};
use crate::guards::{
    guarded, ConferenceIsOpen, GuardChain, TaskIsOpen, UserIsActiveParticipant, UserIsMemberOfOrg,
    UserIsParticipant, UserMayEditSubmission, UserOwnsOrg,
};
use crate::handlers::{health_check, home, orgs, submissions};
use crate::state::AppState;

pub fn create_routes(state: AppState) -> Router {
    let org_routes = Router::new()
        .route(
            "/",
            guarded(
                post(orgs::create_org),
                &state,
                GuardChain::new().then(ConferenceIsOpen),
            ),
        )
        .route(
            "/:org",
            guarded(
                get(orgs::org_detail),
                &state,
                GuardChain::new().then(UserIsMemberOfOrg),
            )
            .merge(guarded(
                patch(orgs::edit_org),
                &state,
                GuardChain::new().then(UserOwnsOrg),
            )),
        )
        .route(
            "/:org/join",
            guarded(
                post(orgs::join_org),
                &state,
                GuardChain::new().then(ConferenceIsOpen),
            ),
        );

    let submission_routes = Router::new()
        .route(
            "/submissions",
            guarded(
                get(submissions::my_submissions),
                &state,
                GuardChain::new().then(UserIsActiveParticipant),
            ),
        )
        .route(
            "/submissions/:runtag",
            guarded(
                get(submissions::submission_detail),
                &state,
                GuardChain::new().then(UserMayEditSubmission),
            ),
        )
        .route(
            "/tasks/:task/submissions",
            guarded(
                post(submissions::submit_run),
                &state,
                GuardChain::new()
                    .then(ConferenceIsOpen)
                    .then(TaskIsOpen)
                    .then(UserIsParticipant),
            ),
        );

    let conference_routes = Router::new()
        .nest("/orgs", org_routes)
        .route(
            "/participation",
            guarded(
                get(orgs::participation),
                &state,
                GuardChain::new().then(UserIsParticipant),
            ),
        )
        .merge(submission_routes);

    Router::new()
        .route("/health", get(health_check))
        .route("/home", get(home::home))
        .route("/orgs", get(orgs::list_orgs))
        .nest("/conferences/:conf", conference_routes)
        .layer(middleware::from_fn_with_state(state.clone(), resolve_identity))
        .layer(TraceLayer::new_for_http())
        .layer(create_security_headers_layer(&state.config))
        .layer(create_cors_layer(&state.config))
        .with_state(state)
}
