//! Core domain entities.
//!
//! Entities are plain data structures. Creation inputs live next to them as
//! separate `New*` structs:
//!
//! - [`ShortLink`] / [`NewShortLink`] - a key-to-destination mapping
//! - [`Visit`] / [`NewVisit`] - one recorded visit to a link
//! - [`TrackingFields`] - the per-attribute capture mask of a link

pub mod short_link;
pub mod visit;

pub use short_link::{LinkState, NewShortLink, ShortLink, TrackingFields};
pub use visit::{DeviceType, NewVisit, Visit, VisitorAttributes};
