//! Password rules and argon2 hashing.

use anyhow::anyhow;
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;

use crate::error::{AppError, AppResult};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Checks a new password against its confirmation, then the length rule.
pub fn check_new_password(password: &str, confirm: &str) -> AppResult<()> {
    if password != confirm {
        return Err(AppError::validation("Passwords do not match."));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password should be at least {} characters.",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// PHC string for a new password, salted per call.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| anyhow!("hash password: {e}"))
}

/// `Ok(false)` on a wrong password; `Err` only when the stored hash is unreadable.
pub fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| anyhow!("stored password hash: {e}"))?;
    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow!("verify password: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_is_reported_before_length() {
        let err = check_new_password("abc", "abd").unwrap_err();
        assert_eq!(err.to_string(), "Passwords do not match.");
    }

    #[test]
    fn length_counts_characters() {
        assert!(check_new_password("abcde", "abcde").is_err());
        assert!(check_new_password("abcdef", "abcdef").is_ok());
        // six characters, more than six bytes
        assert!(check_new_password("ééééé", "ééééé").is_err());
        assert!(check_new_password("éééééé", "éééééé").is_ok());
    }

    #[test]
    fn salts_differ_and_both_verify() {
        let a = hash_password("cobol-rules").unwrap();
        let b = hash_password("cobol-rules").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("cobol-rules", &a).unwrap());
        assert!(verify_password("cobol-rules", &b).unwrap());
        assert!(!verify_password("fortran-rules", &a).unwrap());
    }

    #[test]
    fn unreadable_hash_is_an_error() {
        assert!(verify_password("anything", "plaintext-in-db").is_err());
    }
}
