//! Admin account management commands.
//!
//! The API has exactly one operator account, configured through environment
//! variables. `hash-password` produces the Argon2 PHC string to put in
//! `ADMIN_PASSWORD_HASH` so the plaintext never has to live in the
//! environment.

use std::io::{BufRead, Write as _};

use thiserror::Error;

use harborlight_api::services::auth;

/// Errors that can occur during admin commands.
#[derive(Debug, Error)]
pub enum AdminError {
    /// No password was supplied on the flag or stdin.
    #[error("No password provided")]
    EmptyPassword,

    /// Reading the password from stdin failed.
    #[error("Failed to read password: {0}")]
    Io(#[from] std::io::Error),

    /// Hashing failed.
    #[error("Failed to hash password: {0}")]
    Hash(#[from] auth::AuthError),
}

/// Hash a password and print the PHC string to stdout.
///
/// Reads the password from stdin when the `--password` flag is omitted, so
/// it does not end up in shell history.
///
/// # Errors
///
/// Returns [`AdminError`] if no password is provided or hashing fails.
pub fn hash_password(password: Option<String>) -> Result<(), AdminError> {
    let password = match password {
        Some(p) => p,
        None => prompt_password()?,
    };
    if password.is_empty() {
        return Err(AdminError::EmptyPassword);
    }

    let hash = auth::hash_password(&password)?;

    #[allow(clippy::print_stdout)]
    {
        println!("{hash}");
    }
    Ok(())
}

fn prompt_password() -> Result<String, AdminError> {
    let mut stderr = std::io::stderr();
    write!(stderr, "Password: ")?;
    stderr.flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}
