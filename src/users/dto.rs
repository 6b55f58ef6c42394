use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::error::ApiError;
use crate::users::repo::User;
use crate::validators::{validate_email, validate_password};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: String,
    pub birth_date: Date,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.username.trim().is_empty() {
            return Err(ApiError::validation("username", "username must not be blank"));
        }
        validate_password(&self.password)?;
        validate_email(&self.email)?;
        Ok(())
    }
}

/// Full replacement; the password is the one field that may be omitted.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: String,
    pub email: String,
    pub password: Option<String>,
    #[serde(default)]
    pub phone: String,
    pub birth_date: Date,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.username.trim().is_empty() {
            return Err(ApiError::validation("username", "username must not be blank"));
        }
        if let Some(password) = &self.password {
            validate_password(password)?;
        }
        validate_email(&self.email)?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct PatchUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<Date>,
}

impl PatchUserRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(username) = &self.username {
            if username.trim().is_empty() {
                return Err(ApiError::validation("username", "username must not be blank"));
            }
        }
        if let Some(password) = &self.password {
            validate_password(password)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        Ok(())
    }
}

/// Public shape of a user. The password hash never leaves the repo layer.
#[derive(Debug, Serialize)]
pub struct UserOut {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub birth_date: Date,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<User> for UserOut {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            phone: user.phone,
            birth_date: user.birth_date,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    fn valid_registration() -> RegisterRequest {
        RegisterRequest {
            username: "reader".into(),
            email: "reader@mail.ru".into(),
            password: "abc12345".into(),
            phone: "5550001".into(),
            birth_date: date!(1995 - 03 - 20),
        }
    }

    #[test]
    fn valid_registration_passes() {
        assert!(valid_registration().validate().is_ok());
    }

    #[test]
    fn weak_password_is_rejected() {
        let mut req = valid_registration();
        req.password = "abcdefgh".into();
        assert!(matches!(
            req.validate(),
            Err(ApiError::Validation { field: "password", .. })
        ));
    }

    #[test]
    fn disallowed_email_domain_is_rejected() {
        let mut req = valid_registration();
        req.email = "reader@gmail.com".into();
        assert!(matches!(
            req.validate(),
            Err(ApiError::Validation { field: "email", .. })
        ));
    }

    #[test]
    fn blank_username_is_rejected() {
        let mut req = valid_registration();
        req.username = "  ".into();
        assert!(matches!(
            req.validate(),
            Err(ApiError::Validation { field: "username", .. })
        ));
    }

    #[test]
    fn patch_only_validates_present_fields() {
        let req = PatchUserRequest {
            username: None,
            email: None,
            password: None,
            phone: Some("5550002".into()),
            birth_date: None,
        };
        assert!(req.validate().is_ok());

        let req = PatchUserRequest {
            username: None,
            email: Some("reader@gmail.com".into()),
            password: None,
            phone: None,
            birth_date: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn serialized_user_never_contains_password() {
        let user = User {
            id: Uuid::new_v4(),
            username: "reader".into(),
            email: "reader@mail.ru".into(),
            password_hash: "argon2-hash".into(),
            phone: "5550001".into(),
            birth_date: date!(1995 - 03 - 20),
            is_staff: false,
            created_at: datetime!(2024-01-01 0:00 UTC),
            updated_at: datetime!(2024-01-01 0:00 UTC),
        };

        let out = serde_json::to_value(UserOut::from(user.clone())).unwrap();
        assert_eq!(out["username"], "reader");
        assert_eq!(out["email"], "reader@mail.ru");
        assert_eq!(out["phone"], "5550001");
        assert!(out.get("password").is_none());
        assert!(out.get("password_hash").is_none());

        // the repo record itself also skips the hash when serialized
        let raw = serde_json::to_value(&user).unwrap();
        assert!(raw.get("password_hash").is_none());
    }
}
