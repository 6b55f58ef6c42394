use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{extractors::Actor, password::hash_password},
    error::ApiError,
    pagination::Pagination,
    permissions::{self, Action},
    state::AppState,
    users::{
        dto::{PatchUserRequest, RegisterRequest, UpdateUserRequest, UserOut},
        repo::{NewUser, User, UserChanges},
    },
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(register))
        .route(
            "/users/:id",
            get(get_user)
                .put(update_user)
                .patch(patch_user)
                .delete(delete_user),
        )
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserOut>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    payload.validate()?;

    if User::find_by_username(&state.db, &payload.username)
        .await
        .map_err(ApiError::internal)?
        .is_some()
    {
        return Err(ApiError::Conflict("username already taken".into()));
    }
    if User::find_by_email(&state.db, &payload.email)
        .await
        .map_err(ApiError::internal)?
        .is_some()
    {
        return Err(ApiError::Conflict("email already registered".into()));
    }

    let hash = hash_password(&payload.password).map_err(ApiError::internal)?;
    let user = User::create(
        &state.db,
        NewUser {
            username: &payload.username,
            email: &payload.email,
            password_hash: &hash,
            phone: &payload.phone,
            birth_date: payload.birth_date,
        },
    )
    .await
    .map_err(ApiError::internal)?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, actor))]
pub async fn list_users(
    State(state): State<AppState>,
    actor: Actor,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<UserOut>>, ApiError> {
    if !permissions::self_or_admin(&actor, Action::List) {
        return Err(ApiError::permission_denied(
            "authentication required to list users",
        ));
    }
    let users = User::list(&state.db, p.limit, p.offset)
        .await
        .map_err(ApiError::internal)?;
    Ok(Json(users.into_iter().map(UserOut::from).collect()))
}

#[instrument(skip(state, actor))]
pub async fn get_user(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<UserOut>, ApiError> {
    if !permissions::self_or_admin(&actor, Action::Retrieve) {
        return Err(ApiError::permission_denied("authentication required"));
    }
    let target = User::find_by_id(&state.db, id)
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::NotFound("user"))?;
    if !permissions::self_or_admin_object(&actor, Action::Retrieve, &target) {
        return Err(ApiError::permission_denied(
            "you do not have permission to view this user",
        ));
    }
    Ok(Json(target.into()))
}

#[instrument(skip(state, actor, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<UpdateUserRequest>,
) -> Result<Json<UserOut>, ApiError> {
    if !permissions::self_or_admin(&actor, Action::Update) {
        return Err(ApiError::permission_denied("authentication required"));
    }
    let target = User::find_by_id(&state.db, id)
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::NotFound("user"))?;
    if !permissions::self_or_admin_object(&actor, Action::Update, &target) {
        return Err(ApiError::permission_denied(
            "you do not have permission to modify this user",
        ));
    }

    payload.email = payload.email.trim().to_lowercase();
    payload.validate()?;
    ensure_unique(
        &state,
        &target,
        Some(payload.username.as_str()),
        Some(payload.email.as_str()),
    )
    .await?;

    let password_hash = match &payload.password {
        Some(password) => Some(hash_password(password).map_err(ApiError::internal)?),
        None => None,
    };

    let updated = User::update(
        &state.db,
        id,
        UserChanges {
            username: Some(payload.username),
            email: Some(payload.email),
            password_hash,
            phone: Some(payload.phone),
            birth_date: Some(payload.birth_date),
        },
    )
    .await
    .map_err(ApiError::internal)?
    .ok_or(ApiError::NotFound("user"))?;

    info!(user_id = %updated.id, "user updated");
    Ok(Json(updated.into()))
}

#[instrument(skip(state, actor, payload))]
pub async fn patch_user(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<PatchUserRequest>,
) -> Result<Json<UserOut>, ApiError> {
    if !permissions::self_or_admin(&actor, Action::PartialUpdate) {
        return Err(ApiError::permission_denied("authentication required"));
    }
    let target = User::find_by_id(&state.db, id)
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::NotFound("user"))?;
    if !permissions::self_or_admin_object(&actor, Action::PartialUpdate, &target) {
        return Err(ApiError::permission_denied(
            "you do not have permission to modify this user",
        ));
    }

    if let Some(email) = &mut payload.email {
        *email = email.trim().to_lowercase();
    }
    payload.validate()?;
    ensure_unique(
        &state,
        &target,
        payload.username.as_deref(),
        payload.email.as_deref(),
    )
    .await?;

    let password_hash = match &payload.password {
        Some(password) => Some(hash_password(password).map_err(ApiError::internal)?),
        None => None,
    };

    let updated = User::update(
        &state.db,
        id,
        UserChanges {
            username: payload.username,
            email: payload.email,
            password_hash,
            phone: payload.phone,
            birth_date: payload.birth_date,
        },
    )
    .await
    .map_err(ApiError::internal)?
    .ok_or(ApiError::NotFound("user"))?;

    info!(user_id = %updated.id, "user updated");
    Ok(Json(updated.into()))
}

#[instrument(skip(state, actor))]
pub async fn delete_user(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !permissions::self_or_admin(&actor, Action::Delete) {
        return Err(ApiError::permission_denied("authentication required"));
    }
    let target = User::find_by_id(&state.db, id)
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::NotFound("user"))?;
    if !permissions::self_or_admin_object(&actor, Action::Delete, &target) {
        return Err(ApiError::permission_denied(
            "only administrators can delete users",
        ));
    }

    User::delete(&state.db, id).await.map_err(ApiError::internal)?;
    info!(user_id = %id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Rejects a username or email already held by a different user.
async fn ensure_unique(
    state: &AppState,
    target: &User,
    username: Option<&str>,
    email: Option<&str>,
) -> Result<(), ApiError> {
    if let Some(username) = username {
        if username != target.username {
            if let Some(existing) = User::find_by_username(&state.db, username)
                .await
                .map_err(ApiError::internal)?
            {
                if existing.id != target.id {
                    return Err(ApiError::Conflict("username already taken".into()));
                }
            }
        }
    }
    if let Some(email) = email {
        if email != target.email {
            if let Some(existing) = User::find_by_email(&state.db, email)
                .await
                .map_err(ApiError::internal)?
            {
                if existing.id != target.id {
                    return Err(ApiError::Conflict("email already registered".into()));
                }
            }
        }
    }
    Ok(())
}
