use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::extractors::Actor;
use crate::comments::repo::Comment;
use crate::error::ApiError;
use crate::users::repo::User;

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub post: Uuid,
    pub text: String,
}

impl CreateCommentRequest {
    /// Creation gate: authenticated non-administrator actor, non-empty text.
    /// Returns the author; the author field is never client-supplied.
    pub fn validate<'a>(&self, actor: &'a Actor) -> Result<&'a User, ApiError> {
        let Some(user) = actor.user() else {
            return Err(ApiError::permission_denied(
                "unauthenticated actor cannot create comments",
            ));
        };
        if user.is_staff {
            return Err(ApiError::permission_denied(
                "administrator cannot create comments",
            ));
        }
        if self.text.trim().is_empty() {
            return Err(ApiError::validation("text", "text must not be blank"));
        }
        Ok(user)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub text: String,
}

impl UpdateCommentRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.text.trim().is_empty() {
            return Err(ApiError::validation("text", "text must not be blank"));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct CommentOut {
    pub id: Uuid,
    pub text: String,
    pub author: Uuid,
    pub post: Uuid,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<Comment> for CommentOut {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            text: comment.text,
            author: comment.author_id,
            post: comment.post_id,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    fn make_user(is_staff: bool) -> User {
        User {
            id: Uuid::new_v4(),
            username: "reader".into(),
            email: "reader@mail.ru".into(),
            password_hash: "x".into(),
            phone: "5550001".into(),
            birth_date: date!(1990 - 01 - 01),
            is_staff,
            created_at: datetime!(2024-01-01 0:00 UTC),
            updated_at: datetime!(2024-01-01 0:00 UTC),
        }
    }

    fn request() -> CreateCommentRequest {
        CreateCommentRequest {
            post: Uuid::new_v4(),
            text: "Nice one".into(),
        }
    }

    #[test]
    fn authenticated_user_passes() {
        let actor = Actor::User(make_user(false));
        let author = request().validate(&actor).expect("should pass");
        assert_eq!(Some(author.id), actor.id());
    }

    #[test]
    fn anonymous_actor_is_denied() {
        let err = request().validate(&Actor::Anonymous).unwrap_err();
        assert!(matches!(err, ApiError::PermissionDenied(_)));
    }

    #[test]
    fn administrator_is_denied() {
        let actor = Actor::User(make_user(true));
        let err = request().validate(&actor).unwrap_err();
        assert!(matches!(err, ApiError::PermissionDenied(_)));
    }

    #[test]
    fn empty_text_fails_validation() {
        let actor = Actor::User(make_user(false));
        let req = CreateCommentRequest {
            post: Uuid::new_v4(),
            text: "   ".into(),
        };
        let err = req.validate(&actor).unwrap_err();
        assert!(matches!(err, ApiError::Validation { field: "text", .. }));
    }

    #[test]
    fn no_age_check_on_comments() {
        let mut user = make_user(false);
        user.birth_date = date!(2020 - 01 - 01);
        let actor = Actor::User(user);
        assert!(request().validate(&actor).is_ok());
    }
}
