use chrono::{DateTime, NaiveDateTime, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::Serialize;

use super::{Permission, Role};
use crate::error::AppError;
use crate::models::to_utc;

const TOKEN_LENGTH: usize = 48;

/// The identity resolved from a session. Also used as the request guard.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub username: Option<String>,
    pub profile_pic_url: Option<String>,
    pub expertise: Option<String>,
    pub role: Role,
    pub onboarding_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbUser {
    pub id: i64,
    pub email: String,
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub profile_pic_url: Option<String>,
    pub expertise: Option<String>,
    pub role: Option<String>,
    pub onboarding_completed: Option<bool>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl From<DbUser> for User {
    fn from(user: DbUser) -> Self {
        let role = user.role.unwrap_or_default();
        let role = Role::from_str(&role).unwrap_or_else(|e| {
            tracing::warn!(user_id = user.id, error = %e, "Falling back to member role");
            Role::Member
        });

        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name.unwrap_or_default(),
            username: user.username,
            profile_pic_url: user.profile_pic_url,
            expertise: user.expertise,
            role,
            onboarding_completed: user.onboarding_completed.unwrap_or_default(),
            created_at: to_utc(user.created_at),
            updated_at: to_utc(user.updated_at),
        }
    }
}

impl User {
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.role.has_permission(permission)
    }

    pub fn require_permission(&self, permission: Permission) -> Result<(), AppError> {
        if self.role.has_permission(permission) {
            Ok(())
        } else {
            tracing::warn!(
                user_id = self.id,
                role = %self.role.as_str(),
                permission = ?permission,
                "Permission denied"
            );
            Err(AppError::Authorization(format!(
                "The {} role may not perform this action",
                self.role
            )))
        }
    }

    /// Passes when the caller is `owner_id` or holds `override_permission`.
    pub fn require_owner_or(
        &self,
        owner_id: i64,
        override_permission: Permission,
        message: &str,
    ) -> Result<(), AppError> {
        if self.id == owner_id || self.has_permission(override_permission) {
            Ok(())
        } else {
            tracing::warn!(
                user_id = self.id,
                owner_id = owner_id,
                permission = ?override_permission,
                "Ownership check failed"
            );
            Err(AppError::Authorization(message.to_string()))
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserSession {
    pub id: i64,
    pub user_id: i64,
    pub token: String,
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

#[derive(sqlx::FromRow)]
pub struct DbUserSession {
    pub id: i64,
    pub user_id: i64,
    pub token: String,
    pub created_at: Option<NaiveDateTime>,
    pub expires_at: NaiveDateTime,
}

impl From<DbUserSession> for UserSession {
    fn from(session: DbUserSession) -> Self {
        Self {
            id: session.id,
            user_id: session.user_id,
            token: session.token,
            created_at: session
                .created_at
                .unwrap_or_else(|| Utc::now().naive_utc()),
            expires_at: session.expires_at,
        }
    }
}

impl UserSession {
    pub fn generate_token() -> String {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LENGTH)
            .map(char::from)
            .collect()
    }

    pub fn is_valid(&self) -> bool {
        self.expires_at > Utc::now().naive_utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_random_and_alphanumeric() {
        let a = UserSession::generate_token();
        let b = UserSession::generate_token();

        assert_eq!(a.len(), TOKEN_LENGTH);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn expired_sessions_are_invalid() {
        let now = Utc::now().naive_utc();
        let mut session = UserSession {
            id: 1,
            user_id: 1,
            token: "t".to_string(),
            created_at: now,
            expires_at: now - chrono::Duration::minutes(1),
        };
        assert!(!session.is_valid());

        session.expires_at = now + chrono::Duration::minutes(1);
        assert!(session.is_valid());
    }
}
