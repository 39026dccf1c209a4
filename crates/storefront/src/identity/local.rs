//! Single-admin provider backed by an argon2 hash from configuration.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use thread_hanger_core::Email;

use super::{AdminIdentity, IdentityError, IdentityProvider};

const LOCAL_ADMIN_UID: &str = "local-admin";

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `IdentityError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, IdentityError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| IdentityError::PasswordHash)
}

/// Verify a password against a PHC hash.
///
/// # Errors
///
/// Returns `IdentityError::InvalidCredentials` on mismatch or a malformed hash.
pub fn verify_password(password: &str, hash: &str) -> Result<(), IdentityError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| IdentityError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| IdentityError::InvalidCredentials)
}

/// The one admin account this deployment accepts.
pub struct LocalIdentity {
    email: Email,
    password_hash: SecretString,
}

impl LocalIdentity {
    #[must_use]
    pub const fn new(email: Email, password_hash: SecretString) -> Self {
        Self {
            email,
            password_hash,
        }
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentity {
    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AdminIdentity, IdentityError> {
        let email_matches = self.email.matches(email);
        let password = password.expose_secret().to_owned();
        let hash = self.password_hash.expose_secret().to_owned();

        // Verify even on an email mismatch so timing does not reveal the address.
        let verified = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| IdentityError::Provider(e.to_string()))?;

        match (email_matches, verified) {
            (true, Ok(())) => Ok(AdminIdentity {
                uid: LOCAL_ADMIN_UID.to_owned(),
                email: self.email.clone(),
            }),
            _ => Err(IdentityError::InvalidCredentials),
        }
    }

    async fn sign_out(&self, _identity: &AdminIdentity) -> Result<(), IdentityError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn provider(password: &str) -> LocalIdentity {
        LocalIdentity::new(
            Email::parse("owner@threadandhanger.pk").unwrap(),
            SecretString::from(hash_password(password).unwrap()),
        )
    }

    #[tokio::test]
    async fn test_sign_in_with_correct_password() {
        let identity = provider("lawn-season-2026")
            .sign_in(
                &Email::parse("Owner@ThreadAndHanger.pk").unwrap(),
                &SecretString::from("lawn-season-2026"),
            )
            .await
            .unwrap();
        assert_eq!(identity.uid, LOCAL_ADMIN_UID);
        assert_eq!(identity.email.as_str(), "owner@threadandhanger.pk");
    }

    #[tokio::test]
    async fn test_wrong_password_or_email_is_invalid_credentials() {
        let provider = provider("lawn-season-2026");
        let wrong_password = provider
            .sign_in(
                &Email::parse("owner@threadandhanger.pk").unwrap(),
                &SecretString::from("guess"),
            )
            .await;
        assert!(matches!(wrong_password, Err(IdentityError::InvalidCredentials)));

        let wrong_email = provider
            .sign_in(
                &Email::parse("someone@else.pk").unwrap(),
                &SecretString::from("lawn-season-2026"),
            )
            .await;
        assert!(matches!(wrong_email, Err(IdentityError::InvalidCredentials)));
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(matches!(
            verify_password("pw", "not-a-hash"),
            Err(IdentityError::InvalidCredentials)
        ));
    }
}
