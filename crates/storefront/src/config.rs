//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//!
//! ## Store backend (`STOREFRONT_BACKEND` = `rest` | `postgres` | `memory`, default `rest`)
//! - rest: `STORE_URL`, `STORE_SERVICE_KEY` (high entropy), `STORE_BUCKET`
//!   (default: product-images), `STORE_TIMEOUT_SECS` (default: 30)
//! - postgres: `STOREFRONT_DATABASE_URL` (falls back to `DATABASE_URL`),
//!   `UPLOAD_DIR` (default: uploads)
//! - memory: `UPLOAD_DIR` (default: uploads)
//!
//! ## Identity provider (`IDENTITY_PROVIDER` = `rest` | `local`, default `rest`)
//! - rest: `IDENTITY_API_KEY`, `IDENTITY_ENDPOINT`
//!   (default: <https://identitytoolkit.googleapis.com>)
//! - local: `ADMIN_EMAIL`, `ADMIN_PASSWORD_HASH` (argon2 PHC string, see
//!   `th-cli admin hash-password`)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `CATALOG_CACHE_TTL_SECS` - How long a last-good catalog listing is kept (default: 300)
//! - `SESSION_DB_PATH` - `SQLite` session file for the rest and memory backends
//!   (default: sessions.db)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use thread_hanger_core::Email;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const DEFAULT_IDENTITY_ENDPOINT: &str = "https://identitytoolkit.googleapis.com";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Which store adapters to run against
    pub backend: BackendConfig,
    /// Which identity provider signs admins in
    pub identity: IdentityConfig,
    /// Lifetime of the last-good catalog listing per category
    pub catalog_cache_ttl: Duration,
    /// `SQLite` file holding sessions when the backend has no database
    pub session_db: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// Store backend selection.
#[derive(Debug, Clone)]
pub enum BackendConfig {
    /// Hosted PostgREST tables plus object storage.
    Rest(RestStoreConfig),
    /// Direct `PostgreSQL`; images written to a local directory.
    Postgres {
        database_url: SecretString,
        upload_dir: PathBuf,
    },
    /// Process memory; images written to a local directory.
    Memory { upload_dir: PathBuf },
}

/// Hosted store configuration.
///
/// Implements `Debug` manually to redact the service key.
#[derive(Clone)]
pub struct RestStoreConfig {
    /// Project URL, e.g. `https://abc.supabase.co`
    pub url: Url,
    /// Service key sent as `apikey` and bearer token
    pub service_key: SecretString,
    /// Object storage bucket for product images
    pub bucket: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for RestStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestStoreConfig")
            .field("url", &self.url.as_str())
            .field("service_key", &"[REDACTED]")
            .field("bucket", &self.bucket)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Identity provider selection.
#[derive(Clone)]
pub enum IdentityConfig {
    /// Identity Toolkit password sign-in.
    Rest { api_key: SecretString, endpoint: Url },
    /// Single admin account checked against an argon2 hash.
    Local {
        email: Email,
        password_hash: SecretString,
    },
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rest { endpoint, .. } => f
                .debug_struct("Rest")
                .field("api_key", &"[REDACTED]")
                .field("endpoint", &endpoint.as_str())
                .finish(),
            Self::Local { email, .. } => f
                .debug_struct("Local")
                .field("email", email)
                .field("password_hash", &"[REDACTED]")
                .finish(),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
        })?;

        let backend = BackendConfig::from_env()?;
        let identity = IdentityConfig::from_env()?;
        let catalog_cache_ttl = Duration::from_secs(parse_env("CATALOG_CACHE_TTL_SECS", "300")?);
        let session_db = PathBuf::from(get_env_or_default("SESSION_DB_PATH", "sessions.db"));
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(Self {
            host,
            port,
            base_url: base_url.trim_end_matches('/').to_owned(),
            backend,
            identity,
            catalog_cache_ttl,
            session_db,
            sentry_dsn,
            sentry_environment,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl BackendConfig {
    /// Load the store backend section.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the selected backend is missing settings.
    pub fn from_env() -> Result<Self, ConfigError> {
        let upload_dir = || PathBuf::from(get_env_or_default("UPLOAD_DIR", "uploads"));

        match get_env_or_default("STOREFRONT_BACKEND", "rest").as_str() {
            "rest" => Ok(Self::Rest(RestStoreConfig::from_env()?)),
            "postgres" => Ok(Self::Postgres {
                database_url: get_database_url("STOREFRONT_DATABASE_URL")?,
                upload_dir: upload_dir(),
            }),
            "memory" => Ok(Self::Memory {
                upload_dir: upload_dir(),
            }),
            other => Err(ConfigError::InvalidEnvVar(
                "STOREFRONT_BACKEND".to_string(),
                format!("expected rest, postgres, or memory (got {other})"),
            )),
        }
    }

    /// Database URL when the backend is postgres.
    #[must_use]
    pub const fn database_url(&self) -> Option<&SecretString> {
        match self {
            Self::Postgres { database_url, .. } => Some(database_url),
            Self::Rest(_) | Self::Memory { .. } => None,
        }
    }
}

impl RestStoreConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let url = get_required_env("STORE_URL")?;
        let url = Url::parse(&url)
            .map_err(|e| ConfigError::InvalidEnvVar("STORE_URL".to_string(), e.to_string()))?;

        Ok(Self {
            url,
            service_key: get_validated_secret("STORE_SERVICE_KEY")?,
            bucket: get_env_or_default("STORE_BUCKET", "product-images"),
            timeout: Duration::from_secs(parse_env("STORE_TIMEOUT_SECS", "30")?),
        })
    }
}

impl IdentityConfig {
    fn from_env() -> Result<Self, ConfigError> {
        match get_env_or_default("IDENTITY_PROVIDER", "rest").as_str() {
            "rest" => {
                let endpoint = get_env_or_default("IDENTITY_ENDPOINT", DEFAULT_IDENTITY_ENDPOINT);
                let endpoint = Url::parse(&endpoint).map_err(|e| {
                    ConfigError::InvalidEnvVar("IDENTITY_ENDPOINT".to_string(), e.to_string())
                })?;
                Ok(Self::Rest {
                    api_key: get_required_secret("IDENTITY_API_KEY")?,
                    endpoint,
                })
            }
            "local" => {
                let email = Email::parse(&get_required_env("ADMIN_EMAIL")?).map_err(|e| {
                    ConfigError::InvalidEnvVar("ADMIN_EMAIL".to_string(), e.to_string())
                })?;
                let password_hash = get_required_env("ADMIN_PASSWORD_HASH")?;
                if !password_hash.starts_with("$argon2") {
                    return Err(ConfigError::InvalidEnvVar(
                        "ADMIN_PASSWORD_HASH".to_string(),
                        "expected an argon2 PHC string (run `th-cli admin hash-password`)"
                            .to_string(),
                    ));
                }
                Ok(Self::Local {
                    email,
                    password_hash: SecretString::from(password_hash),
                })
            }
            other => Err(ConfigError::InvalidEnvVar(
                "IDENTITY_PROVIDER".to_string(),
                format!("expected rest or local (got {other})"),
            )),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` naming `primary_key` if neither is set.
pub fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the key issued by the store."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
