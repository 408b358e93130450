//! Notification emitted after a visit has been recorded.

use super::entities::{ShortLink, Visit};

/// Announces that `visit` was recorded against `short_link`.
///
/// Published on a `tokio::sync::broadcast` channel so any number of
/// subscribers (loggers, live dashboards) can observe visits without the
/// redirect path waiting on them.
#[derive(Debug, Clone)]
pub struct VisitedEvent {
    pub short_link: ShortLink,
    pub visit: Visit,
}
