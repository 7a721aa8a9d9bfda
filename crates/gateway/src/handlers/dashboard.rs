//! Dashboard entry handlers
//!
//! `/dashboard` resolves to the role home; the menu endpoint exposes
//! the role's capability set for client rendering.

use axum::{
    extract::State,
    response::Redirect,
    Json,
};
use samit_common::{
    auth::Actor,
    db::{ProfileChanges, Repository},
    errors::{AppError, Result},
    policy::{self, Capability},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::handlers::page_guard;
use crate::AppState;

/// `/dashboard`: bounce to the role's canonical landing route
pub async fn home(actor: Actor) -> Redirect {
    Redirect::to(policy::home_route(actor.role))
}

#[derive(Serialize)]
pub struct MenuResponse {
    pub role: String,
    pub home: &'static str,
    pub capabilities: &'static [Capability],
}

/// The role's menu/capability set
pub async fn menu(actor: Actor) -> Json<MenuResponse> {
    Json(MenuResponse {
        role: actor.role.to_string(),
        home: policy::home_route(actor.role),
        capabilities: policy::capabilities(actor.role),
    })
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub role: String,
    pub website: Option<String>,
    pub linkedin: Option<String>,
    pub default_cv_id: Option<String>,
}

/// Own profile page data
pub async fn profile(State(state): State<AppState>, actor: Actor) -> Result<Json<ProfileResponse>> {
    page_guard(&actor, "/dashboard/profile")?;

    let repo = Repository::new(state.db.clone());
    let profile = repo
        .find_profile(actor.id)
        .await?
        .ok_or_else(|| AppError::ProfileNotFound {
            id: actor.id.to_string(),
        })?;

    Ok(Json(ProfileResponse {
        id: profile.id.to_string(),
        email: profile.email,
        full_name: profile.full_name,
        phone: profile.phone,
        bio: profile.bio,
        role: profile.role.to_string(),
        website: profile.website,
        linkedin: profile.linkedin,
        default_cv_id: profile.default_cv_id.map(|id| id.to_string()),
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 120))]
    pub full_name: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
    #[validate(length(max = 200))]
    pub website: Option<String>,
    #[validate(length(max = 200))]
    pub linkedin: Option<String>,
}

/// Update own profile fields. The role is not touchable here.
pub async fn update_profile(
    State(state): State<AppState>,
    actor: Actor,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>> {
    page_guard(&actor, "/dashboard/profile")?;

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let repo = Repository::new(state.db.clone());
    let profile = repo
        .update_profile(
            actor.id,
            ProfileChanges {
                full_name: request.full_name,
                phone: request.phone.map(Some),
                bio: request.bio.map(Some),
                website: request.website.map(Some),
                linkedin: request.linkedin.map(Some),
            },
        )
        .await?;

    Ok(Json(ProfileResponse {
        id: profile.id.to_string(),
        email: profile.email,
        full_name: profile.full_name,
        phone: profile.phone,
        bio: profile.bio,
        role: profile.role.to_string(),
        website: profile.website,
        linkedin: profile.linkedin,
        default_cv_id: profile.default_cv_id.map(|id| id.to_string()),
    }))
}
