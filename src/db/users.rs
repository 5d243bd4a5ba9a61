use chrono::Utc;
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::auth::{DbUser, Role, User};
use crate::error::AppError;
use crate::models::{RoleRecord, UserChanges};

const USER_SELECT: &str = "SELECT u.id, u.email, u.full_name, u.username, u.profile_pic_url,
        u.expertise, r.name AS role, u.onboarding_completed, u.created_at, u.updated_at
     FROM users u
     JOIN roles r ON r.id = u.role_id";

const HASH_COST: u32 = if cfg!(test) { 4 } else { bcrypt::DEFAULT_COST };

#[instrument(skip(pool))]
pub async fn get_user(pool: &Pool<Sqlite>, id: i64) -> Result<User, AppError> {
    info!("Fetching user by ID");
    let row = sqlx::query_as::<_, DbUser>(&format!("{USER_SELECT} WHERE u.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(user) => Ok(User::from(user)),
        _ => Err(AppError::NotFound(format!("User {} not found", id))),
    }
}

#[instrument(skip(pool))]
pub async fn find_user_by_email(pool: &Pool<Sqlite>, email: &str) -> Result<Option<User>, AppError> {
    info!("Finding user by email");
    let row = sqlx::query_as::<_, DbUser>(&format!("{USER_SELECT} WHERE u.email = ?"))
        .bind(email.trim().to_lowercase())
        .fetch_optional(pool)
        .await?;

    Ok(row.map(User::from))
}

#[instrument(skip(pool, password))]
pub async fn create_user(
    pool: &Pool<Sqlite>,
    email: &str,
    password: &str,
    full_name: &str,
    role: Role,
) -> Result<i64, AppError> {
    info!("Creating new user");

    let hashed_password = bcrypt::hash(password, HASH_COST)?;

    let res = sqlx::query(
        "INSERT INTO users (email, password_hash, full_name, role_id)
         VALUES (?, ?, ?, (SELECT id FROM roles WHERE name = ?))",
    )
    .bind(email.trim().to_lowercase())
    .bind(hashed_password)
    .bind(full_name.trim())
    .bind(role.as_str())
    .execute(pool)
    .await
    .map_err(|e| AppError::from_unique_violation(e, "An account with this email already exists"))?;

    Ok(res.last_insert_rowid())
}

/// Returns the user when the password matches the stored bcrypt hash.
#[instrument(skip_all, fields(email))]
pub async fn authenticate_user(
    pool: &Pool<Sqlite>,
    email: &str,
    password: &str,
) -> Result<Option<User>, AppError> {
    info!("Authenticating user");
    let row: Option<(i64, String)> =
        sqlx::query_as("SELECT id, password_hash FROM users WHERE email = ?")
            .bind(email.trim().to_lowercase())
            .fetch_optional(pool)
            .await?;

    match row {
        Some((id, hash)) => match bcrypt::verify(password, &hash) {
            Ok(true) => Ok(Some(get_user(pool, id).await?)),
            _ => Ok(None),
        },
        _ => Ok(None),
    }
}

/// Merges the provided fields into the row and bumps `updated_at`.
#[instrument(skip(pool))]
pub async fn update_user(
    pool: &Pool<Sqlite>,
    user_id: i64,
    changes: &UserChanges,
) -> Result<User, AppError> {
    info!("Updating user");
    let now = Utc::now().naive_utc();

    let result = sqlx::query(
        "UPDATE users
         SET full_name = COALESCE(?, full_name),
             username = COALESCE(?, username),
             profile_pic_url = COALESCE(?, profile_pic_url),
             expertise = COALESCE(?, expertise),
             onboarding_completed = COALESCE(?, onboarding_completed),
             updated_at = ?
         WHERE id = ?",
    )
    .bind(changes.full_name.as_deref())
    .bind(changes.username.as_deref())
    .bind(changes.profile_pic_url.as_deref())
    .bind(changes.expertise.as_deref())
    .bind(changes.onboarding_completed)
    .bind(now)
    .bind(user_id)
    .execute(pool)
    .await
    .map_err(|e| AppError::from_unique_violation(e, "Username is already taken"))?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("User {} not found", user_id)));
    }

    get_user(pool, user_id).await
}

#[instrument(skip(pool))]
pub async fn update_user_role(pool: &Pool<Sqlite>, user_id: i64, role: Role) -> Result<(), AppError> {
    info!(role = %role, "Updating user role");
    let now = Utc::now().naive_utc();

    let result = sqlx::query(
        "UPDATE users SET role_id = (SELECT id FROM roles WHERE name = ?), updated_at = ? WHERE id = ?",
    )
    .bind(role.as_str())
    .bind(now)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("User {} not found", user_id)));
    }

    Ok(())
}

/// Makes sure `email` belongs to an admin: an existing account is promoted,
/// a missing one is created with `password`. Returns the admin's id.
#[instrument(skip(pool, password))]
pub async fn ensure_admin(pool: &Pool<Sqlite>, email: &str, password: Option<&str>) -> Result<i64, AppError> {
    match find_user_by_email(pool, email).await? {
        Some(user) if user.role == Role::Admin => Ok(user.id),
        Some(user) => {
            update_user_role(pool, user.id, Role::Admin).await?;
            Ok(user.id)
        }
        None => {
            let password = password.filter(|p| !p.is_empty()).ok_or_else(|| {
                AppError::Validation(format!("A password is required to create admin {}", email))
            })?;
            create_user(pool, email, password, "Administrator", Role::Admin).await
        }
    }
}

#[instrument(skip(pool))]
pub async fn get_onboarding_status(pool: &Pool<Sqlite>, user_id: i64) -> Result<bool, AppError> {
    info!("Fetching onboarding status");
    let completed: Option<bool> =
        sqlx::query_scalar("SELECT onboarding_completed FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

    completed.ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
}

#[instrument(skip(pool))]
pub async fn get_roles(pool: &Pool<Sqlite>) -> Result<Vec<RoleRecord>, AppError> {
    info!("Fetching roles");
    let roles = sqlx::query_as::<_, RoleRecord>("SELECT id, name FROM roles ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(roles)
}
