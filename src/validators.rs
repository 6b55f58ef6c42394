use lazy_static::lazy_static;
use regex::Regex;
use time::{Date, OffsetDateTime};

use crate::error::ApiError;

/// Registration only accepts addresses on these domains.
pub const ALLOWED_EMAIL_DOMAINS: &[&str] = &["mail.ru", "yandex.ru"];

/// Words rejected in post titles, matched whole-word and case-insensitively.
pub const BANNED_TITLE_WORDS: &[&str] = &["spam", "casino", "viagra"];

/// Minimum length 8 and at least one digit.
pub fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < 8 {
        return Err(ApiError::validation(
            "password",
            "password must be at least 8 characters long",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ApiError::validation(
            "password",
            "password must contain at least one digit",
        ));
    }
    Ok(())
}

/// The domain part (everything after the last `@`) must be on the allow-list.
pub fn validate_email(email: &str) -> Result<(), ApiError> {
    let domain = email.rsplit('@').next().unwrap_or(email);
    if !ALLOWED_EMAIL_DOMAINS.contains(&domain) {
        return Err(ApiError::validation(
            "email",
            format!("email domain is not allowed: {domain}"),
        ));
    }
    Ok(())
}

/// Whole-year age at day precision: the year difference, minus one if the
/// calendar birthday has not yet occurred this year.
pub(crate) fn age_in_years(birth_date: Date, today: Date) -> i32 {
    let mut age = today.year() - birth_date.year();
    if (today.month() as u8, today.day()) < (birth_date.month() as u8, birth_date.day()) {
        age -= 1;
    }
    age
}

/// Authors must be at least 18 years old today. The only time-dependent
/// validator; everything else is a pure function of its input.
pub fn validate_user_age(birth_date: Date) -> Result<(), ApiError> {
    let today = OffsetDateTime::now_utc().date();
    if age_in_years(birth_date, today) < 18 {
        return Err(ApiError::validation(
            "birth_date",
            "author must be at least 18 years old",
        ));
    }
    Ok(())
}

lazy_static! {
    static ref BANNED_WORD_PATTERNS: Vec<(&'static str, Regex)> = BANNED_TITLE_WORDS
        .iter()
        .map(|word| {
            let pattern = format!(r"(?i)\b{}\b", regex::escape(word));
            (*word, Regex::new(&pattern).unwrap())
        })
        .collect();
}

/// Rejects the title on the first banned word found, naming the word.
pub fn validate_post_title(title: &str) -> Result<(), ApiError> {
    for (word, pattern) in BANNED_WORD_PATTERNS.iter() {
        if pattern.is_match(title) {
            return Err(ApiError::validation(
                "title",
                format!("title contains a banned word: \"{word}\""),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn password_valid() {
        assert!(validate_password("abc12345").is_ok());
    }

    #[test]
    fn password_too_short() {
        assert!(validate_password("abc12").is_err());
    }

    #[test]
    fn password_without_digit() {
        assert!(validate_password("abcdefgh").is_err());
    }

    #[test]
    fn email_on_allowed_domains() {
        assert!(validate_email("user@mail.ru").is_ok());
        assert!(validate_email("user@yandex.ru").is_ok());
    }

    #[test]
    fn email_on_other_domain() {
        assert!(validate_email("user@gmail.com").is_err());
    }

    #[test]
    fn email_without_at_sign() {
        assert!(validate_email("mail.ru").is_err());
    }

    #[test]
    fn email_domain_is_taken_after_last_at() {
        assert!(validate_email("weird@gmail.com@mail.ru").is_ok());
    }

    #[test]
    fn age_counts_whole_years_at_day_precision() {
        let birth = date!(2000 - 06 - 15);
        assert_eq!(age_in_years(birth, date!(2018 - 06 - 14)), 17);
        assert_eq!(age_in_years(birth, date!(2018 - 06 - 15)), 18);
        assert_eq!(age_in_years(birth, date!(2018 - 06 - 16)), 18);
    }

    #[test]
    fn adult_birth_date_passes() {
        assert!(validate_user_age(date!(1990 - 01 - 01)).is_ok());
    }

    #[test]
    fn underage_birth_date_fails() {
        assert!(validate_user_age(date!(2020 - 01 - 01)).is_err());
    }

    #[test]
    fn clean_title_passes() {
        assert!(validate_post_title("A perfectly ordinary headline").is_ok());
    }

    #[test]
    fn banned_word_is_rejected_and_named() {
        let err = validate_post_title("Great casino tips").unwrap_err();
        match err {
            ApiError::Validation { field, message } => {
                assert_eq!(field, "title");
                assert!(message.contains("casino"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn banned_word_match_is_case_insensitive() {
        assert!(validate_post_title("CaSiNo night").is_err());
    }

    #[test]
    fn banned_word_must_match_whole_word() {
        assert!(validate_post_title("spamming is a verb").is_ok());
    }
}
