//! Admin authentication service.
//!
//! This deployment has exactly one operator account, configured via
//! environment variables rather than a users table. The plaintext
//! `ADMIN_PASSWORD` (when used) is hashed with Argon2id once at startup so
//! login attempts always go through a constant-cost hash verification,
//! regardless of how the credential was supplied.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use secrecy::ExposeSecret;

use harborlight_core::Email;

use crate::config::AdminConfig;
use crate::models::CurrentAdmin;

/// Admin authentication service.
pub struct AdminAuthService {
    email: Email,
    password_hash: String,
}

impl AdminAuthService {
    /// Build the service from configuration, hashing the plaintext password
    /// if no precomputed hash was supplied.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingCredentials` if neither credential form is
    /// configured, `AuthError::InvalidStoredHash` if `ADMIN_PASSWORD_HASH`
    /// is not a valid PHC string.
    pub fn from_config(config: &AdminConfig) -> Result<Self, AuthError> {
        let password_hash = match (&config.password_hash, &config.password) {
            (Some(hash), _) => {
                let hash = hash.expose_secret().to_owned();
                // Fail at startup, not at first login
                PasswordHash::new(&hash).map_err(|_| AuthError::InvalidStoredHash)?;
                hash
            }
            (None, Some(password)) => hash_password(password.expose_secret())?,
            (None, None) => return Err(AuthError::MissingCredentials),
        };

        Ok(Self {
            email: config.email.clone(),
            password_hash,
        })
    }

    /// Verify a login attempt.
    ///
    /// The password is always verified, even when the email does not match,
    /// so response timing does not reveal which field was wrong.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` on any mismatch.
    pub fn login(&self, email: &str, password: &str) -> Result<CurrentAdmin, AuthError> {
        let email_matches = Email::parse(email)
            .map(|parsed| parsed == self.email)
            .unwrap_or(false);

        let password_matches = verify_password(password, &self.password_hash).is_ok();

        if email_matches && password_matches {
            Ok(CurrentAdmin {
                email: self.email.clone(),
            })
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn config(password: &str) -> AdminConfig {
        AdminConfig {
            email: Email::parse("ops@harborlight.org").unwrap(),
            password: Some(SecretString::from(password)),
            password_hash: None,
        }
    }

    #[test]
    fn test_login_success() {
        let service = AdminAuthService::from_config(&config("kR8#vQ2$wN5@pL1!")).unwrap();
        let admin = service
            .login("ops@harborlight.org", "kR8#vQ2$wN5@pL1!")
            .unwrap();
        assert_eq!(admin.email.as_str(), "ops@harborlight.org");
    }

    #[test]
    fn test_login_normalizes_email_case() {
        let service = AdminAuthService::from_config(&config("kR8#vQ2$wN5@pL1!")).unwrap();
        assert!(service.login("OPS@Harborlight.org", "kR8#vQ2$wN5@pL1!").is_ok());
    }

    #[test]
    fn test_login_wrong_password() {
        let service = AdminAuthService::from_config(&config("kR8#vQ2$wN5@pL1!")).unwrap();
        let err = service
            .login("ops@harborlight.org", "wrong-password")
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[test]
    fn test_login_wrong_email() {
        let service = AdminAuthService::from_config(&config("kR8#vQ2$wN5@pL1!")).unwrap();
        let err = service
            .login("intruder@example.com", "kR8#vQ2$wN5@pL1!")
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[test]
    fn test_login_unparseable_email() {
        let service = AdminAuthService::from_config(&config("kR8#vQ2$wN5@pL1!")).unwrap();
        assert!(service.login("not-an-email", "kR8#vQ2$wN5@pL1!").is_err());
    }

    #[test]
    fn test_precomputed_hash_accepted() {
        let hash = hash_password("kR8#vQ2$wN5@pL1!").unwrap();
        let config = AdminConfig {
            email: Email::parse("ops@harborlight.org").unwrap(),
            password: None,
            password_hash: Some(SecretString::from(hash)),
        };

        let service = AdminAuthService::from_config(&config).unwrap();
        assert!(service.login("ops@harborlight.org", "kR8#vQ2$wN5@pL1!").is_ok());
    }

    #[test]
    fn test_invalid_stored_hash_fails_at_startup() {
        let config = AdminConfig {
            email: Email::parse("ops@harborlight.org").unwrap(),
            password: None,
            password_hash: Some(SecretString::from("not-a-phc-string")),
        };

        assert!(matches!(
            AdminAuthService::from_config(&config),
            Err(AuthError::InvalidStoredHash)
        ));
    }

    #[test]
    fn test_missing_credentials() {
        let config = AdminConfig {
            email: Email::parse("ops@harborlight.org").unwrap(),
            password: None,
            password_hash: None,
        };

        assert!(matches!(
            AdminAuthService::from_config(&config),
            Err(AuthError::MissingCredentials)
        ));
    }
}
