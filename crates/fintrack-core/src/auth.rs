//! Password hashing and username derivation

use argon2::{
    password_hash::{Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::Rng;

use crate::db::Database;
use crate::error::{Error, Result};

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 8;

/// Hash a password into an Argon2id PHC string with a random salt
pub fn hash_password(password: &str) -> Result<String> {
    let salt_bytes: [u8; 16] = rand::thread_rng().gen();
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| Error::Auth(format!("Failed to create salt: {}", e)))?;

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| Error::Auth(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

/// Check a candidate password against a stored PHC string
///
/// A wrong password is `Ok(false)`; a malformed stored hash is an error.
pub fn verify_password(candidate: &str, stored: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| Error::Auth(format!("Invalid stored password hash: {}", e)))?;

    match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(PasswordHashError::Password) => Ok(false),
        Err(e) => Err(Error::Auth(format!("Password verification failed: {}", e))),
    }
}

/// Reject passwords that are too short
pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::InvalidData(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Username base from an email address: the local part, lowercased, alphanumerics only
pub fn username_base(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default();
    let base: String = local
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '.')
        .collect::<String>()
        .to_lowercase();
    if base.is_empty() {
        "user".to_string()
    } else {
        base
    }
}

/// Derive a free username from an email (`name`, then `name1`, `name2`, ...)
pub fn derive_username(db: &Database, email: &str) -> Result<String> {
    let base = username_base(email);
    if !db.username_exists(&base)? {
        return Ok(base);
    }

    let mut counter = 1u32;
    loop {
        let candidate = format!("{}{}", base, counter);
        if !db.username_exists(&candidate)? {
            return Ok(candidate);
        }
        counter += 1;
    }
}
