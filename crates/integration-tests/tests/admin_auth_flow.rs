//! Integration tests for the operator login flow.
//!
//! Builds the auth service from config the same way the API does at startup,
//! covering both credential sources (`ADMIN_PASSWORD` and
//! `ADMIN_PASSWORD_HASH`).

#![allow(clippy::unwrap_used)]

use secrecy::SecretString;

use harborlight_api::config::AdminConfig;
use harborlight_api::services::auth::{self, AdminAuthService};
use harborlight_core::Email;

const ADMIN_EMAIL: &str = "director@example.org";
const PASSWORD: &str = "correct horse battery staple";

fn config_with_plaintext() -> AdminConfig {
    AdminConfig {
        email: Email::parse(ADMIN_EMAIL).unwrap(),
        password: Some(SecretString::from(PASSWORD)),
        password_hash: None,
    }
}

#[test]
fn test_login_with_plaintext_configured_password() {
    let service = AdminAuthService::from_config(&config_with_plaintext()).unwrap();

    let admin = service.login(ADMIN_EMAIL, PASSWORD).unwrap();
    assert_eq!(admin.email.as_str(), ADMIN_EMAIL);
}

#[test]
fn test_login_with_precomputed_hash() {
    let hash = auth::hash_password(PASSWORD).unwrap();
    let config = AdminConfig {
        email: Email::parse(ADMIN_EMAIL).unwrap(),
        password: None,
        password_hash: Some(SecretString::from(hash)),
    };
    let service = AdminAuthService::from_config(&config).unwrap();

    assert!(service.login(ADMIN_EMAIL, PASSWORD).is_ok());
    assert!(service.login(ADMIN_EMAIL, "wrong").is_err());
}

#[test]
fn test_login_rejects_wrong_password() {
    let service = AdminAuthService::from_config(&config_with_plaintext()).unwrap();
    assert!(service.login(ADMIN_EMAIL, "not the password").is_err());
}

#[test]
fn test_login_rejects_wrong_email() {
    let service = AdminAuthService::from_config(&config_with_plaintext()).unwrap();
    assert!(service.login("intruder@example.org", PASSWORD).is_err());
}

#[test]
fn test_email_comparison_ignores_case() {
    let service = AdminAuthService::from_config(&config_with_plaintext()).unwrap();
    assert!(service.login("Director@Example.org", PASSWORD).is_ok());
}
