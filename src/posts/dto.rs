use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::extractors::Actor;
use crate::error::ApiError;
use crate::posts::repo::Post;
use crate::users::repo::User;
use crate::validators::{validate_post_title, validate_user_age};

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub text: String,
}

impl CreatePostRequest {
    /// Creation gate, checked in order with short-circuit on first failure:
    /// the actor must be authenticated, must not be an administrator, must be
    /// an adult, and the title must pass the banned-word filter. Returns the
    /// author; the author field is never client-supplied.
    pub fn validate<'a>(&self, actor: &'a Actor) -> Result<&'a User, ApiError> {
        let Some(user) = actor.user() else {
            return Err(ApiError::permission_denied(
                "unauthenticated actor cannot create posts",
            ));
        };
        if user.is_staff {
            return Err(ApiError::permission_denied(
                "administrator cannot create posts",
            ));
        }
        validate_user_age(user.birth_date)?;
        if self.title.trim().is_empty() {
            return Err(ApiError::validation("title", "title must not be blank"));
        }
        validate_post_title(&self.title)?;
        if self.text.trim().is_empty() {
            return Err(ApiError::validation("text", "text must not be blank"));
        }
        Ok(user)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub title: String,
    pub text: String,
}

impl UpdatePostRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.title.trim().is_empty() {
            return Err(ApiError::validation("title", "title must not be blank"));
        }
        validate_post_title(&self.title)?;
        if self.text.trim().is_empty() {
            return Err(ApiError::validation("text", "text must not be blank"));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct PatchPostRequest {
    pub title: Option<String>,
    pub text: Option<String>,
}

impl PatchPostRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(ApiError::validation("title", "title must not be blank"));
            }
            validate_post_title(title)?;
        }
        if let Some(text) = &self.text {
            if text.trim().is_empty() {
                return Err(ApiError::validation("text", "text must not be blank"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct PostOut {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub image: Option<String>,
    pub author: Uuid,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<Post> for PostOut {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            text: post.text,
            image: post.image_key,
            author: post.author_id,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    fn make_user(is_staff: bool, birth_year: i32) -> User {
        User {
            id: Uuid::new_v4(),
            username: "writer".into(),
            email: "writer@mail.ru".into(),
            password_hash: "x".into(),
            phone: "5550001".into(),
            birth_date: date!(1990 - 01 - 01).replace_year(birth_year).unwrap(),
            is_staff,
            created_at: datetime!(2024-01-01 0:00 UTC),
            updated_at: datetime!(2024-01-01 0:00 UTC),
        }
    }

    fn request() -> CreatePostRequest {
        CreatePostRequest {
            title: "Morning notes".into(),
            text: "Some words".into(),
        }
    }

    #[test]
    fn adult_author_passes() {
        let actor = Actor::User(make_user(false, 1990));
        let author = request().validate(&actor).expect("should pass");
        assert_eq!(Some(author.id), actor.id());
    }

    #[test]
    fn anonymous_actor_is_denied() {
        let err = request().validate(&Actor::Anonymous).unwrap_err();
        assert!(matches!(err, ApiError::PermissionDenied(_)));
    }

    #[test]
    fn administrator_is_denied_even_with_valid_fields() {
        let actor = Actor::User(make_user(true, 1980));
        let err = request().validate(&actor).unwrap_err();
        assert!(matches!(err, ApiError::PermissionDenied(_)));
    }

    #[test]
    fn underage_author_fails_validation() {
        let actor = Actor::User(make_user(false, 2020));
        let err = request().validate(&actor).unwrap_err();
        assert!(matches!(
            err,
            ApiError::Validation { field: "birth_date", .. }
        ));
    }

    #[test]
    fn banned_title_word_fails_validation() {
        let actor = Actor::User(make_user(false, 1990));
        let req = CreatePostRequest {
            title: "Free spam inside".into(),
            text: "Some words".into(),
        };
        let err = req.validate(&actor).unwrap_err();
        assert!(matches!(err, ApiError::Validation { field: "title", .. }));
    }

    #[test]
    fn permission_checks_run_before_field_validation() {
        // an admin with a banned title gets the permission error, not the
        // validation one
        let actor = Actor::User(make_user(true, 1980));
        let req = CreatePostRequest {
            title: "Free spam inside".into(),
            text: "Some words".into(),
        };
        let err = req.validate(&actor).unwrap_err();
        assert!(matches!(err, ApiError::PermissionDenied(_)));
    }

    #[test]
    fn patch_validates_only_present_fields() {
        assert!(PatchPostRequest {
            title: None,
            text: Some("edited".into()),
        }
        .validate()
        .is_ok());

        assert!(PatchPostRequest {
            title: Some("casino wins".into()),
            text: None,
        }
        .validate()
        .is_err());
    }
}
