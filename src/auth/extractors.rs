use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use crate::auth::jwt::{JwtKeys, TokenKind};
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::repo::User;

/// The identity behind a request. Every permission and validation check takes
/// this explicitly; there is no ambient "current user".
#[derive(Debug, Clone)]
pub enum Actor {
    Anonymous,
    User(User),
}

impl Actor {
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Anonymous => None,
            Self::User(user) => Some(user),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }

    pub fn id(&self) -> Option<Uuid> {
        self.user().map(|u| u.id)
    }
}

/// Resolves the actor from the `Authorization` header. No header means an
/// anonymous actor; a present but invalid or expired token is rejected with
/// 401 so a broken client is distinguishable from an unauthenticated one.
#[async_trait]
impl FromRequestParts<AppState> for Actor {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(auth_header) = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
        else {
            return Ok(Self::Anonymous);
        };

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or_else(|| ApiError::Unauthorized("invalid auth scheme".into()))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|_| {
            warn!("invalid or expired token");
            ApiError::Unauthorized("invalid or expired token".into())
        })?;

        if claims.kind != TokenKind::Access {
            return Err(ApiError::Unauthorized("access token required".into()));
        }

        let user = User::find_by_id(&state.db, claims.sub)
            .await
            .map_err(ApiError::internal)?
            .ok_or_else(|| ApiError::Unauthorized("unknown user".into()))?;

        Ok(Self::User(user))
    }
}
