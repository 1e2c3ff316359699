use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, info_span, Instrument};
use crate::state::AppState;

/// Periodically drops revocation records whose tokens have expired on their own.
pub async fn start_background_worker(state: Arc<AppState>) {
    let interval = Duration::from_secs(state.config.revocation_sweep_secs.max(1));
    info!("Starting revocation sweep every {:?}", interval);

    loop {
        sweep_revocations(&state)
            .instrument(info_span!("revocation_sweep"))
            .await;
        sleep(interval).await;
    }
}

pub async fn sweep_revocations(state: &AppState) {
    match state.auth_service.purge_expired_revocations().await {
        Ok(0) => debug!("No expired revocations to purge"),
        Ok(purged) => info!("Purged {} expired token revocations", purged),
        Err(e) => error!("Failed to purge expired revocations: {:?}", e),
    }
}
