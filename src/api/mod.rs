//! REST API layer for HTTP request/response handling.
//!
//! Translates HTTP requests into calls on the application services and
//! formats their results as JSON.
//!
//! # Modules
//!
//! - [`dto`] - Request/response serialization types
//! - [`handlers`] - Redirect, link management and health handlers
//! - [`middleware`] - Authentication, rate limiting and request tracing
//! - [`routes`] - Management API route table

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
