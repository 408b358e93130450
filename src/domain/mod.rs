//! Domain layer containing business entities and contracts.
//!
//! The domain layer has no dependencies on infrastructure or presentation
//! layers; repository traits here are implemented by
//! `crate::infrastructure::persistence`.
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`visit_context`] - Per-request input to visit resolution
//! - [`visit_event`] - Notification published when a visit is recorded
//! - [`visit_worker`] - Background subscriber logging visit notifications
//!
//! # Visit Flow
//!
//! 1. The redirect handler builds a [`visit_context::VisitContext`]
//! 2. [`crate::application::services::VisitResolver`] checks the link window,
//!    records the visit, and publishes a [`visit_event::VisitedEvent`]
//! 3. Subscribers such as [`visit_worker::run_visit_logger`] consume the event

pub mod entities;
pub mod repositories;
pub mod visit_context;
pub mod visit_event;
pub mod visit_worker;
