//! Admin account commands.
//!
//! The local identity provider checks one account configured by
//! `ADMIN_EMAIL` and `ADMIN_PASSWORD_HASH`. This command produces the hash.
//!
//! ```bash
//! printf '%s' 'the password' | th-cli admin hash-password
//! ```

use std::io::{BufRead, Write};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use thread_hanger_storefront::identity::{IdentityError, hash_password as argon2_hash};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Could not read password: {0}")]
    Io(#[from] std::io::Error),

    #[error("Password must not be empty")]
    EmptyPassword,

    #[error("{0}")]
    Hash(#[from] IdentityError),
}

/// Read a password from the first line of stdin and print its PHC hash.
///
/// # Errors
///
/// Returns `AdminError` if stdin cannot be read, the password is empty, or
/// hashing fails.
pub fn hash_password() -> Result<(), AdminError> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let password = read_password(line)?;

    let hash = argon2_hash(password.expose_secret())?;

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{hash}")?;
    tracing::info!("Set ADMIN_PASSWORD_HASH to the value above");
    Ok(())
}

fn read_password(line: String) -> Result<SecretString, AdminError> {
    let trimmed = line.trim_end_matches(['\r', '\n']);
    if trimmed.is_empty() {
        return Err(AdminError::EmptyPassword);
    }
    Ok(SecretString::from(trimmed.to_owned()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_read_password_strips_newline_only() {
        let password = read_password(" hanger pass \n".to_owned()).unwrap();
        assert_eq!(password.expose_secret(), " hanger pass ");
    }

    #[test]
    fn test_read_password_rejects_empty() {
        assert!(matches!(
            read_password("\n".to_owned()),
            Err(AdminError::EmptyPassword)
        ));
    }
}
