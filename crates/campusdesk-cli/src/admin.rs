use anyhow::{Context, Result, bail};
use sqlx::PgPool;

use campusdesk_auth::Role;
use campusdesk_core::hash_password;
use campusdesk_models::{Email, UserId};

pub const MIN_PASSWORD_LEN: usize = 8;

pub struct NewAdmin {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// Inserts an Administrator account. Fails if the email is taken.
pub async fn create_admin(db: &PgPool, admin: NewAdmin) -> Result<UserId> {
    let email = Email::new(&admin.email)?;
    if admin.first_name.trim().is_empty() || admin.last_name.trim().is_empty() {
        bail!("First and last name are required");
    }
    if admin.password.len() < MIN_PASSWORD_LEN {
        bail!("Password must be at least {MIN_PASSWORD_LEN} characters");
    }

    let hashed = hash_password(&admin.password).map_err(|e| e.error)?;

    let id = sqlx::query_scalar::<_, UserId>(
        r#"INSERT INTO users (first_name, last_name, email, password, role)
           VALUES ($1, $2, $3, $4, $5)
           ON CONFLICT (email) DO NOTHING
           RETURNING id"#,
    )
    .bind(admin.first_name.trim())
    .bind(admin.last_name.trim())
    .bind(&email)
    .bind(&hashed)
    .bind(Role::Administrator)
    .fetch_optional(db)
    .await
    .context("Failed to insert administrator")?;

    match id {
        Some(id) => Ok(id),
        None => bail!("A user with email {email} already exists"),
    }
}
