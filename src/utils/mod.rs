//! Request inspection helpers.
//!
//! - [`client_ip`] - Visitor IP resolution, proxy-aware
//! - [`user_agent`] - Browser, OS and device classification

pub mod client_ip;
pub mod user_agent;
