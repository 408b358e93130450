//! Repository trait definitions for the domain layer.
//!
//! Traits define the data-access contract; implementations live in
//! `crate::infrastructure::persistence`. Mock implementations are generated via
//! `mockall` for unit tests.
//!
//! - [`ShortLinkRepository`] - short link storage and key lookups
//! - [`VisitRepository`] - visit recording and session lookups

pub mod short_link_repository;
pub mod visit_repository;

pub use short_link_repository::ShortLinkRepository;
pub use visit_repository::VisitRepository;

#[cfg(test)]
pub use short_link_repository::MockShortLinkRepository;
#[cfg(test)]
pub use visit_repository::MockVisitRepository;
