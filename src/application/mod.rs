//! Application layer services implementing business logic.
//!
//! Services consume repository traits and provide the operations HTTP handlers
//! and the admin CLI call into.
//!
//! # Available Services
//!
//! - [`services::link_builder::LinkBuilder`] - Validated short link construction
//! - [`services::key_allocator::KeyAllocator`] - Collision-checked key generation
//! - [`services::visit_resolver::VisitResolver`] - Visit eligibility, recording and redirect target
//! - [`services::link_service::LinkService`] - Link creation entry point and lookups
//! - [`services::auth_service::AuthService`] - API token authentication

pub mod services;
