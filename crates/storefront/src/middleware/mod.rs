//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Security headers (CSP, frame and isolation policies)
//! 4. Session layer (tower-sessions, `PostgreSQL` or `SQLite` store)
//! 5. Request context (request id, admin identity for Sentry)
//! 6. Rate limiting on `POST /login` only (governor)

pub mod auth;
pub mod rate_limit;
pub mod request_context;
pub mod security_headers;
pub mod session;

pub use auth::{RequireAdmin, clear_current_admin, current_admin, set_current_admin};
pub use rate_limit::login_rate_limiter;
pub use request_context::request_context_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{SessionBackend, create_session_layer, set_flash, take_flash, visitor_id};
