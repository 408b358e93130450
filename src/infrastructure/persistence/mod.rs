//! Repository implementations.
//!
//! # Repositories
//!
//! - [`PgShortLinkRepository`] - PostgreSQL short link storage
//! - [`PgVisitRepository`] - PostgreSQL visit records
//! - [`InMemoryShortLinkRepository`] / [`InMemoryVisitRepository`] - `DashMap`
//!   stores with the same contracts, for tests and embedding

pub mod memory;
pub mod pg_short_link_repository;
pub mod pg_visit_repository;

pub use memory::{InMemoryShortLinkRepository, InMemoryVisitRepository};
pub use pg_short_link_repository::PgShortLinkRepository;
pub use pg_visit_repository::PgVisitRepository;
