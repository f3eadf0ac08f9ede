//! Admin account creation

use anyhow::{bail, Context, Result};
use tracing::info;

use fintrack_core::auth::{derive_username, hash_password, validate_password};
use fintrack_core::db::Database;
use fintrack_core::models::{NewUser, Role};

/// Create an admin user, returning its id
pub fn cmd_create_admin(
    db: &Database,
    email: &str,
    password: &str,
    full_name: Option<&str>,
) -> Result<i64> {
    let email = email.trim().to_lowercase();
    if !email.contains('@') {
        bail!("'{}' is not a valid email address", email);
    }
    validate_password(password)?;

    if db.get_user_by_email(&email)?.is_some() {
        bail!("A user with email {} already exists", email);
    }

    let username = derive_username(db, &email)?;
    let id = db
        .create_user(&NewUser {
            email: email.clone(),
            username: username.clone(),
            password_hash: hash_password(password)?,
            full_name: full_name.map(str::to_string),
            phone_no: None,
            role: Role::Admin,
        })
        .context("Failed to create admin user")?;

    info!(user_id = id, username = %username, "Admin created");
    println!("✅ Created admin '{}' ({})", username, email);

    Ok(id)
}
