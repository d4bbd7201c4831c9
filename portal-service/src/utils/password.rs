use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use service_core::error::AppError;
use std::{fmt, sync::OnceLock};

/// Plain-text password. `Debug` is redacted so it never reaches a log line.
#[derive(Clone)]
pub struct Password(String);

impl Password {
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// PHC-format Argon2id hash as stored on the user row.
#[derive(Debug, Clone)]
pub struct PasswordHashString(String);

impl PasswordHashString {
    pub fn new(hash: String) -> Self {
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Hash with Argon2id default parameters and a fresh salt.
pub fn hash_password(password: &Password) -> Result<PasswordHashString, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_str().as_bytes(), &salt)
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to hash password: {}", e)))?;

    Ok(PasswordHashString::new(hash.to_string()))
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
pub fn verify_password(
    password: &Password,
    password_hash: &PasswordHashString,
) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(password_hash.as_str()).map_err(|e| {
        AppError::InternalError(anyhow::anyhow!("Invalid password hash format: {}", e))
    })?;

    Ok(Argon2::default()
        .verify_password(password.as_str().as_bytes(), &parsed)
        .is_ok())
}

static DUMMY_HASH: OnceLock<Option<PasswordHashString>> = OnceLock::new();

/// Runs one verification against a throwaway hash, so a sign-in for an
/// unknown email costs as much as one with a wrong password.
pub fn verify_dummy_password(password: &Password) {
    let dummy = DUMMY_HASH.get_or_init(|| {
        hash_password(&Password::new("dummy-password-for-unknown-users")).ok()
    });
    if let Some(hash) = dummy {
        let _ = verify_password(password, hash);
    }
}
