//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transactions)
//! 2. CORS
//! 3. `TraceLayer` (request span with method, uri, status, latency)
//! 4. Request ID (recorded on the span, echoed in the response)
//! 5. Rate limiting on `/api/users/login`
//!
//! Authentication is not a layer: protected handlers take the
//! [`AuthUser`] or [`AdminUser`] extractor.

pub mod auth;
pub mod rate_limit;
pub mod request_id;

pub use auth::{AdminUser, AuthUser};
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
