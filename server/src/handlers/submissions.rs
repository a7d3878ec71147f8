use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::guards::GuardContext;
use crate::models::{NewSubmission, Organization, Submission};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

#[derive(Debug, Deserialize)]
pub struct SubmitRunRequest {
    /// Shortname of the organization the run is filed for.
    pub org: String,
    pub runtag: String,
}

#[derive(Serialize)]
struct SubmissionsPayload<'a> {
    orgs: &'a [Organization],
    submissions: &'a [Submission],
}

/// Behind `user_is_active_participant`.
pub async fn my_submissions(ctx: GuardContext) -> Result<Response, AppError> {
    let payload = SubmissionsPayload {
        orgs: ctx.valid_orgs()?,
        submissions: ctx.subs()?,
    };
    let response = success(payload, "Submissions").into_response();
    Ok(response)
}

/// Behind `conference_is_open`, `task_is_open` and `user_is_participant`.
/// The run is filed for one of the user's participating organizations.
pub async fn submit_run(
    State(state): State<AppState>,
    ctx: GuardContext,
    Json(body): Json<SubmitRunRequest>,
) -> Result<Response, AppError> {
    let runtag = body.runtag.trim();
    if runtag.is_empty() || runtag.chars().any(char::is_whitespace) {
        return Err(AppError::ValidationError(
            "Runtag must be non-empty and contain no whitespace".to_string(),
        ));
    }

    let task = ctx.task()?;
    let org = ctx
        .valid_orgs()?
        .iter()
        .find(|org| org.shortname == body.org)
        .ok_or_else(|| AppError::Forbidden("User is not member of org".to_string()))?;
    let user = ctx.principal();

    let sub = state
        .store
        .create_submission(NewSubmission {
            task_id: task.id,
            runtag: runtag.to_string(),
            submitted_by: user.id,
            org_id: org.id,
        })
        .await?;
    tracing::info!(runtag = %sub.runtag, task = %task.shortname, org = %org.shortname, "Run submitted");

    Ok(created(sub, "Submission received").into_response())
}

/// Behind `user_may_edit_submission`.
pub async fn submission_detail(ctx: GuardContext) -> Result<Response, AppError> {
    Ok(success(ctx.sub()?.clone(), "Submission").into_response())
}
