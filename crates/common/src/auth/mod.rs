//! Authentication context
//!
//! The identity provider is external: it signs users in and mints the
//! session token. This module only validates that token (shared secret)
//! and resolves the acting profile. The role is always read from the
//! profile row, never trusted from the token.

use crate::db::models::Role;
use crate::db::{DbPool, Repository};
use crate::errors::{AppError, Result};
use crate::policy;
use axum::{extract::FromRequestParts, http::request::Parts, http::HeaderMap};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default name of the session cookie
pub const SESSION_COOKIE: &str = "samit_session";

/// Session token claims minted by the identity provider
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user ID)
    pub sub: String,

    /// Account email
    pub email: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// Session token validator (and issuer, for tests and local tooling)
pub struct SessionTokens {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: i64,
}

impl SessionTokens {
    /// Create a new manager with the given shared secret
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs: ttl_secs as i64,
        }
    }

    /// Issue a session token
    pub fn issue(&self, user_id: Uuid, email: &str) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.ttl_secs);

        let claims = SessionClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| AppError::Internal {
            message: format!("Failed to issue session token: {}", e),
        })
    }

    /// Validate and decode a session token
    pub fn validate(&self, token: &str) -> Result<SessionClaims> {
        decode::<SessionClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::ExpiredToken,
                _ => AppError::InvalidToken,
            })
    }
}

/// Extract the session token from an Authorization bearer header or the
/// session cookie.
pub fn session_token_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        if let Some(token) = auth.strip_prefix("Bearer ") {
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }

    let cookies = headers.get("cookie").and_then(|v| v.to_str().ok())?;
    for pair in cookies.split(';') {
        let (name, value) = pair.trim().split_once('=')?;
        if name == cookie_name && !value.is_empty() {
            return Some(value.to_string());
        }
    }

    None
}

/// The acting account, resolved per request. Workflow operations take
/// this explicitly: `operate(actor, input)`, so every authorization
/// precondition is a visible parameter.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl Actor {
    pub fn new(id: Uuid, email: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            email: email.into(),
            role,
        }
    }

    /// Require the admin role
    pub fn require_admin(&self) -> Result<()> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(AppError::RoleMismatch {
                required: "admin".to_string(),
            })
        }
    }

    /// Require an organization-side role (lembaga or admin)
    pub fn require_organization(&self) -> Result<()> {
        if self.role.is_organization() {
            Ok(())
        } else {
            Err(AppError::RoleMismatch {
                required: "lembaga".to_string(),
            })
        }
    }

    /// Require the job-seeker role
    pub fn require_user(&self) -> Result<()> {
        if self.role == Role::User {
            Ok(())
        } else {
            Err(AppError::RoleMismatch {
                required: "user".to_string(),
            })
        }
    }
}

/// State capabilities the Actor extractor needs
pub trait ActorState {
    fn db(&self) -> &DbPool;
    fn tokens(&self) -> &SessionTokens;
    fn cookie_name(&self) -> &str {
        SESSION_COOKIE
    }
}

/// Page-level guard: every handler that extracts an Actor re-fetches the
/// session and profile itself and fails CLOSED. A broken session
/// infrastructure degrades to a login redirect, never to exposed data.
impl<S> FromRequestParts<S> for Actor
where
    S: ActorState + Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let path = parts.uri.path().to_string();
        let login = policy::login_redirect(&path);

        let token = session_token_from_headers(&parts.headers, state.cookie_name())
            .ok_or_else(|| AppError::AuthRedirect {
                location: login.clone(),
            })?;

        let claims = state.tokens().validate(&token).map_err(|_| AppError::AuthRedirect {
            location: login.clone(),
        })?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::AuthRedirect {
            location: login.clone(),
        })?;

        let repo = Repository::new(state.db().clone());
        let profile = match repo.find_profile(user_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                tracing::warn!(user_id = %user_id, "session subject has no profile");
                return Err(AppError::AuthRedirect { location: login });
            }
            Err(err) => {
                tracing::error!(error = %err, "profile lookup failed, failing closed");
                return Err(AppError::AuthRedirect { location: login });
            }
        };

        Ok(Actor {
            id: profile.id,
            email: profile.email,
            role: profile.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_token_roundtrip() {
        let tokens = SessionTokens::new("test_secret", 3600);

        let user_id = Uuid::new_v4();
        let token = tokens.issue(user_id, "seeker@example.com").unwrap();
        let claims = tokens.validate(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "seeker@example.com");
    }

    #[test]
    fn test_invalid_token_rejected() {
        let tokens = SessionTokens::new("test_secret", 3600);
        assert!(matches!(
            tokens.validate("not-a-token"),
            Err(AppError::InvalidToken)
        ));

        let other = SessionTokens::new("other_secret", 3600);
        let token = other.issue(Uuid::new_v4(), "x@example.com").unwrap();
        assert!(tokens.validate(&token).is_err());
    }

    #[test]
    fn test_token_from_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer abc123".parse().unwrap());
        assert_eq!(
            session_token_from_headers(&headers, SESSION_COOKIE),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn test_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "cookie",
            "theme=dark; samit_session=tok-1; lang=id".parse().unwrap(),
        );
        assert_eq!(
            session_token_from_headers(&headers, SESSION_COOKIE),
            Some("tok-1".to_string())
        );
    }

    #[test]
    fn test_missing_token() {
        let headers = HeaderMap::new();
        assert_eq!(session_token_from_headers(&headers, SESSION_COOKIE), None);
    }

    #[test]
    fn test_role_requirements() {
        let admin = Actor::new(Uuid::new_v4(), "a@samit.id", Role::Admin);
        let lembaga = Actor::new(Uuid::new_v4(), "o@samit.id", Role::Lembaga);
        let seeker = Actor::new(Uuid::new_v4(), "u@samit.id", Role::User);

        assert!(admin.require_admin().is_ok());
        assert!(lembaga.require_admin().is_err());

        assert!(admin.require_organization().is_ok());
        assert!(lembaga.require_organization().is_ok());
        assert!(seeker.require_organization().is_err());

        assert!(seeker.require_user().is_ok());
        assert!(admin.require_user().is_err());
    }
}
