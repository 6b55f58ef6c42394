use axum::{
    extract::{FromRef, State},
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{RefreshRequest, TokenPair, TokenRequest},
        jwt::JwtKeys,
        password::verify_password,
    },
    error::ApiError,
    state::AppState,
    users::repo::User,
};

pub fn token_routes() -> Router<AppState> {
    Router::new()
        .route("/token", post(token))
        .route("/token/refresh", post(token_refresh))
}

#[instrument(skip(state, payload))]
pub async fn token(
    State(state): State<AppState>,
    Json(payload): Json<TokenRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let user = User::find_by_username(&state.db, &payload.username)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| {
            warn!(username = %payload.username, "token request for unknown username");
            ApiError::Unauthorized("invalid credentials".into())
        })?;

    let ok = verify_password(&payload.password, &user.password_hash)
        .map_err(ApiError::internal)?;
    if !ok {
        warn!(user_id = %user.id, "token request with invalid password");
        return Err(ApiError::Unauthorized("invalid credentials".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let access = keys.sign_access(user.id).map_err(ApiError::internal)?;
    let refresh = keys.sign_refresh(user.id).map_err(ApiError::internal)?;

    info!(user_id = %user.id, "token pair issued");
    Ok(Json(TokenPair { access, refresh }))
}

#[instrument(skip(state, payload))]
pub async fn token_refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh)
        .map_err(|_| ApiError::Unauthorized("invalid refresh token".into()))?;

    // The user may have been deleted since the token was issued
    User::find_by_id(&state.db, claims.sub)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::Unauthorized("unknown user".into()))?;

    let access = keys.sign_access(claims.sub).map_err(ApiError::internal)?;
    let refresh = keys.sign_refresh(claims.sub).map_err(ApiError::internal)?;

    info!(user_id = %claims.sub, "token pair refreshed");
    Ok(Json(TokenPair { access, refresh }))
}
