//! HTTP middleware for request processing and protection.
//!
//! - [`auth`] - Bearer token check for the management API
//! - [`rate_limit`] - Per-client-IP token bucket
//! - [`tracing`] - Request/response spans

pub mod auth;
pub mod rate_limit;
pub mod tracing;
