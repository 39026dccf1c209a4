//! Identity Toolkit password sign-in.
//!
//! `POST {endpoint}/v1/accounts:signInWithPassword?key={api_key}` with the
//! email and password. ID tokens are not kept server-side, so sign-out only
//! ends the local session.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use thread_hanger_core::Email;

use super::{AdminIdentity, IdentityError, IdentityProvider};

/// Provider error codes that mean "wrong email or password".
const CREDENTIAL_ERRORS: &[&str] = &[
    "EMAIL_NOT_FOUND",
    "INVALID_PASSWORD",
    "INVALID_LOGIN_CREDENTIALS",
    "INVALID_EMAIL",
    "USER_DISABLED",
    "MISSING_PASSWORD",
];

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    email: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Client for the Identity Toolkit REST API.
pub struct PasswordSignInClient {
    client: reqwest::Client,
    endpoint: Url,
    api_key: SecretString,
}

impl PasswordSignInClient {
    /// # Errors
    ///
    /// Returns `IdentityError::Http` if the HTTP client cannot be constructed.
    pub fn new(endpoint: Url, api_key: SecretString) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    fn sign_in_url(&self) -> String {
        format!(
            "{}/v1/accounts:signInWithPassword",
            self.endpoint.as_str().trim_end_matches('/')
        )
    }
}

#[async_trait]
impl IdentityProvider for PasswordSignInClient {
    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AdminIdentity, IdentityError> {
        let response = self
            .client
            .post(self.sign_in_url())
            .query(&[("key", self.api_key.expose_secret())])
            .json(&SignInRequest {
                email: email.as_str(),
                password: password.expose_secret(),
                return_secure_token: true,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let code = response
                .json::<ErrorEnvelope>()
                .await
                .map(|e| e.error.message)
                .unwrap_or_else(|_| status.to_string());
            // Codes may carry a suffix, e.g. "INVALID_PASSWORD : ...".
            let bare = code.split([' ', ':']).next().unwrap_or_default();
            if CREDENTIAL_ERRORS.contains(&bare) {
                return Err(IdentityError::InvalidCredentials);
            }
            return Err(IdentityError::Provider(code));
        }

        let body: SignInResponse = response.json().await?;
        let email = Email::parse(&body.email)
            .map_err(|e| IdentityError::Provider(format!("provider returned bad email: {e}")))?;

        Ok(AdminIdentity {
            uid: body.local_id,
            email,
        })
    }

    async fn sign_out(&self, identity: &AdminIdentity) -> Result<(), IdentityError> {
        tracing::debug!(uid = %identity.uid, "Dropping provider tokens");
        Ok(())
    }
}
