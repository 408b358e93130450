//! Business logic services for the application layer.

pub mod auth_service;
pub mod key_allocator;
pub mod link_builder;
pub mod link_service;
pub mod visit_resolver;

pub use auth_service::AuthService;
pub use key_allocator::KeyAllocator;
pub use link_builder::{LinkBuilder, TrackingOverrides};
pub use link_service::LinkService;
pub use visit_resolver::{Resolution, VisitResolver};
