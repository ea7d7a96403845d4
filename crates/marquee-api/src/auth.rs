//! Password hashing and verification.
//!
//! argon2 is CPU-bound, so both operations run on the blocking pool.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use rand_core::OsRng;

use crate::error::ApiError;

/// Hash `password` into an argon2 PHC string.
pub async fn hash_password(password: String) -> Result<String, ApiError> {
  tokio::task::spawn_blocking(move || {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map(|hash| hash.to_string())
      .map_err(|e| ApiError::Internal(format!("argon2 error: {e}")))
  })
  .await
  .map_err(|e| ApiError::Internal(format!("hashing task failed: {e}")))?
}

/// `true` if `password` matches the stored PHC string. A malformed hash never
/// matches.
pub async fn verify_password(password: String, phc: String) -> Result<bool, ApiError> {
  tokio::task::spawn_blocking(move || {
    let Ok(parsed) = PasswordHash::new(&phc) else {
      return false;
    };
    Argon2::default()
      .verify_password(password.as_bytes(), &parsed)
      .is_ok()
  })
  .await
  .map_err(|e| ApiError::Internal(format!("verification task failed: {e}")))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn hash_then_verify() {
    let hash = hash_password("secret123".into()).await.unwrap();
    assert!(hash.starts_with("$argon2"));
    assert!(verify_password("secret123".into(), hash.clone()).await.unwrap());
    assert!(!verify_password("wrong".into(), hash).await.unwrap());
  }

  #[tokio::test]
  async fn malformed_hash_never_matches() {
    assert!(!verify_password("secret123".into(), "not-a-hash".into()).await.unwrap());
  }
}
