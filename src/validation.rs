use once_cell::sync::Lazy;
use regex::Regex;
use rocket::serde::json::Json;
use validator::{Validate, ValidationError};

use crate::error::AppError;

pub static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_.]{3,32}$").expect("username pattern is valid"));

/// Unwraps a JSON body after running its `validator` rules.
pub trait JsonValidateExt<T> {
    fn validated(self) -> Result<T, AppError>;
}

impl<T: Validate> JsonValidateExt<T> for Json<T> {
    fn validated(self) -> Result<T, AppError> {
        let inner = self.into_inner();
        inner.validate()?;
        Ok(inner)
    }
}

pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("Must not be blank".into());
        return Err(error);
    }
    Ok(())
}

pub fn tags_not_blank(tags: &[String]) -> Result<(), ValidationError> {
    if tags.iter().any(|tag| tag.trim().is_empty()) {
        let mut error = ValidationError::new("blank_tag");
        error.message = Some("Tags must not be blank".into());
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_pattern() {
        assert!(USERNAME_RE.is_match("calm_river.22"));
        assert!(!USERNAME_RE.is_match("no"));
        assert!(!USERNAME_RE.is_match("has space"));
    }

    #[test]
    fn blank_values_are_rejected() {
        assert!(not_blank("   ").is_err());
        assert!(not_blank("hello").is_ok());
        assert!(tags_not_blank(&["ok".to_string(), " ".to_string()]).is_err());
    }
}
