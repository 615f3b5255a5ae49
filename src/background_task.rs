use actix_web::web;
use tokio::time::{interval, Duration};

use crate::AppState;

/// Periodically compacts the ledgers and drops abandoned form sessions.
pub async fn start_purge_task(state: web::Data<AppState>, every: Duration) {
    let mut interval = interval(every);

    loop {
        interval.tick().await;

        match state.contact_handler.limiter.purge_expired().await {
            Ok(count) => tracing::info!("Purged {} expired submission ledgers", count),
            Err(e) => tracing::error!("Ledger purge failed: {}", e)
        }

        let now = state.contact_handler.clock().now();
        let evicted = state.sessions.evict_idle(state.session_ttl, now);
        if evicted > 0 {
            tracing::info!("Evicted {} idle contact form sessions", evicted);
        }
    }
}
