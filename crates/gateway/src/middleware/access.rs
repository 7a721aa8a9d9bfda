//! Edge access-policy middleware
//!
//! Evaluates the route policy for every request before it reaches a
//! handler. This check fails OPEN when session infrastructure itself
//! errors (e.g. misconfiguration): the request proceeds unauthenticated
//! and the page-level guard inside each handler fails closed instead.
//! Misconfiguration therefore degrades to "protected pages redirect to
//! login", never to exposed data.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use samit_common::{
    auth::{self, ActorState},
    db::models::Role,
    db::Repository,
    errors::AppError,
    policy::{self, PolicyDecision},
};
use uuid::Uuid;

use crate::AppState;

/// Evaluate the access policy at the edge
pub async fn access_policy(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    let role = match resolve_role(&state, request.headers()).await {
        Ok(role) => role,
        Err(err) => {
            tracing::error!(
                error = %err,
                path = %path,
                "session resolution failed at the edge, failing open"
            );
            return next.run(request).await;
        }
    };

    match policy::evaluate(&path, role) {
        PolicyDecision::Allow => next.run(request).await,
        decision => {
            let location = decision
                .location()
                .unwrap_or_else(|| policy::DASHBOARD_ROUTE.to_string());
            tracing::debug!(path = %path, location = %location, "edge policy redirect");
            Redirect::to(&location).into_response()
        }
    }
}

/// Resolve the session role, if any. A missing or invalid token reads
/// as unauthenticated; only infrastructure failures are errors.
async fn resolve_role(state: &AppState, headers: &HeaderMap) -> Result<Option<Role>, AppError> {
    let Some(token) = auth::session_token_from_headers(headers, state.cookie_name()) else {
        return Ok(None);
    };

    let claims = match state.tokens().validate(&token) {
        Ok(claims) => claims,
        Err(_) => return Ok(None),
    };

    let Ok(user_id) = Uuid::parse_str(&claims.sub) else {
        return Ok(None);
    };

    let repo = Repository::new(state.db().clone());
    Ok(repo.find_profile(user_id).await?.map(|profile| profile.role))
}
