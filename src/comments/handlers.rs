use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::extractors::Actor,
    comments::{
        dto::{CommentOut, CreateCommentRequest, UpdateCommentRequest},
        repo::Comment,
    },
    error::ApiError,
    pagination::Pagination,
    permissions::{self, Action},
    posts::repo::Post,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/comments", get(list_comments).post(create_comment))
        .route(
            "/comments/:id",
            get(get_comment)
                .put(update_comment)
                .patch(update_comment)
                .delete(delete_comment),
        )
}

#[instrument(skip(state))]
pub async fn list_comments(
    State(state): State<AppState>,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<CommentOut>>, ApiError> {
    let comments = Comment::list(&state.db, p.limit, p.offset)
        .await
        .map_err(ApiError::internal)?;
    Ok(Json(comments.into_iter().map(CommentOut::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_comment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CommentOut>, ApiError> {
    let comment = Comment::find_by_id(&state.db, id)
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::NotFound("comment"))?;
    Ok(Json(comment.into()))
}

#[instrument(skip(state, actor, payload))]
pub async fn create_comment(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentOut>), ApiError> {
    let author = payload.validate(&actor)?;

    // the parent must exist; a dangling reference is a field error, not a 404
    if Post::find_by_id(&state.db, payload.post)
        .await
        .map_err(ApiError::internal)?
        .is_none()
    {
        return Err(ApiError::validation("post", "unknown post"));
    }

    let comment = Comment::create(&state.db, author.id, payload.post, &payload.text)
        .await
        .map_err(ApiError::internal)?;

    info!(comment_id = %comment.id, post_id = %payload.post, author_id = %author.id, "comment created");
    Ok((StatusCode::CREATED, Json(comment.into())))
}

/// Shared by PUT and PATCH: a comment has a single writable field.
#[instrument(skip(state, actor, payload))]
pub async fn update_comment(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCommentRequest>,
) -> Result<Json<CommentOut>, ApiError> {
    let comment = Comment::find_by_id(&state.db, id)
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::NotFound("comment"))?;
    if !permissions::author_or_admin_object(&actor, Action::Update, comment.author_id) {
        return Err(ApiError::permission_denied(
            "you do not have permission to modify this comment",
        ));
    }
    payload.validate()?;

    let updated = Comment::update_text(&state.db, id, &payload.text)
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::NotFound("comment"))?;

    info!(comment_id = %id, "comment updated");
    Ok(Json(updated.into()))
}

#[instrument(skip(state, actor))]
pub async fn delete_comment(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let comment = Comment::find_by_id(&state.db, id)
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::NotFound("comment"))?;
    if !permissions::author_or_admin_object(&actor, Action::Delete, comment.author_id) {
        return Err(ApiError::permission_denied(
            "you do not have permission to delete this comment",
        ));
    }

    Comment::delete(&state.db, id)
        .await
        .map_err(ApiError::internal)?;
    info!(comment_id = %id, "comment deleted");
    Ok(StatusCode::NO_CONTENT)
}
