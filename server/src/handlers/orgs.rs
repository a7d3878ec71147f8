use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Principal;
use crate::guards::primitives::is_owner;
use crate::guards::GuardContext;
use crate::models::{NewOrganization, Organization, UpdateOrganization};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

#[derive(Debug, Deserialize)]
pub struct CreateOrganizationRequest {
    pub shortname: String,
    pub longname: String,
}

#[derive(Debug, Deserialize)]
pub struct JoinOrganizationRequest {
    pub passphrase: String,
}

/// Organization as shown to its members. Only the owner sees the passphrase.
#[derive(Serialize)]
pub struct OrganizationView {
    #[serde(flatten)]
    pub org: Organization,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passphrase: Option<String>,
}

impl OrganizationView {
    fn for_viewer(org: Organization, viewer_is_owner: bool) -> Self {
        let passphrase = viewer_is_owner.then(|| org.passphrase.clone());
        Self { org, passphrase }
    }
}

fn validate_shortname(shortname: &str) -> Result<(), AppError> {
    let valid = !shortname.is_empty()
        && shortname
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(AppError::ValidationError(
            "Shortname must be non-empty and use only letters, digits, '-' or '_'".to_string(),
        ))
    }
}

/// Organizations the user owns or belongs to, in any conference.
pub async fn list_orgs(
    State(state): State<AppState>,
    Principal(user): Principal,
) -> Result<Response, AppError> {
    let orgs = state.store.organizations_for_user(user.id).await?;
    Ok(success(orgs, "Organizations").into_response())
}

/// Behind `conference_is_open`. The creator becomes owner and contact person.
pub async fn create_org(
    State(state): State<AppState>,
    ctx: GuardContext,
    Json(body): Json<CreateOrganizationRequest>,
) -> Result<Response, AppError> {
    let shortname = body.shortname.trim().to_string();
    validate_shortname(&shortname)?;
    let conf = ctx.conf()?;
    let user = ctx.principal();

    let org = state
        .store
        .create_organization(NewOrganization {
            shortname,
            longname: body.longname.trim().to_string(),
            conference_id: conf.id,
            owner_id: user.id,
            contact_person_id: user.id,
            passphrase: Uuid::new_v4().to_string(),
        })
        .await?;
    tracing::info!(org = %org.shortname, conf = %conf.shortname, owner = %user.username, "Organization created");

    Ok(created(OrganizationView::for_viewer(org, true), "Organization created").into_response())
}

/// Behind `user_is_member_of_org`.
pub async fn org_detail(ctx: GuardContext) -> Result<Response, AppError> {
    let org = ctx.org()?.clone();
    let owner = is_owner(ctx.principal(), &org);
    Ok(success(OrganizationView::for_viewer(org, owner), "Organization").into_response())
}

/// Behind `user_owns_org`. A new contact person must already be a member.
pub async fn edit_org(
    State(state): State<AppState>,
    ctx: GuardContext,
    Json(update): Json<UpdateOrganization>,
) -> Result<Response, AppError> {
    let org = ctx.org()?;
    if let Some(contact) = update.contact_person_id {
        if contact != org.owner_id && !org.members.contains(&contact) {
            return Err(AppError::ValidationError(
                "Contact person must be a member of the organization".to_string(),
            ));
        }
    }

    let org = state.store.update_organization(org.id, update).await?;
    Ok(success(OrganizationView::for_viewer(org, true), "Organization updated").into_response())
}

/// Behind `conference_is_open`. Joining requires the organization's passphrase;
/// joining twice is harmless.
pub async fn join_org(
    State(state): State<AppState>,
    ctx: GuardContext,
    Json(body): Json<JoinOrganizationRequest>,
) -> Result<Response, AppError> {
    let conf = ctx.conf()?;
    let user = ctx.principal();
    let shortname = ctx
        .param("org")
        .ok_or_else(|| AppError::NotFound("No such org".to_string()))?;
    let org = state
        .store
        .find_organization(&conf.shortname, shortname)
        .await?
        .ok_or_else(|| AppError::NotFound("No such org".to_string()))?;

    if org.passphrase != body.passphrase.trim() {
        tracing::info!(org = %org.shortname, user = %user.username, "Join refused: wrong passphrase");
        return Err(AppError::Forbidden("Incorrect passphrase".to_string()));
    }

    state.store.add_member(org.id, user.id).await?;
    tracing::info!(org = %org.shortname, user = %user.username, "User joined organization");

    let owner = is_owner(user, &org);
    Ok(success(OrganizationView::for_viewer(org, owner), "Joined organization").into_response())
}

/// Behind `user_is_participant`.
pub async fn participation(ctx: GuardContext) -> Result<Response, AppError> {
    let orgs = ctx.valid_orgs()?.to_vec();
    Ok(success(orgs, "Participating organizations").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortname_validation() {
        assert!(validate_shortname("acme-labs_2").is_ok());
        assert!(validate_shortname("").is_err());
        assert!(validate_shortname("acme labs").is_err());
        assert!(validate_shortname("acme/labs").is_err());
    }
}
