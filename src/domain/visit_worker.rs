//! Background subscriber that logs visit notifications.

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn};

use super::visit_event::VisitedEvent;

/// Consumes [`VisitedEvent`]s until every sender is dropped.
///
/// A lagging receiver skips the missed events and keeps going.
pub async fn run_visit_logger(mut rx: broadcast::Receiver<VisitedEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                info!(
                    url_key = %event.short_link.url_key,
                    visit_id = event.visit.id,
                    device_type = ?event.visit.attributes.device_type,
                    "Short link visited"
                );
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!("Visit logger lagged, skipped {} events", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }
}
