//! Low-frequency sweep that ends overdue rounds for events nobody is polling.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{services::timer_service, state::SharedState};

/// Run the sweep loop until `cancel` is triggered.
pub async fn run(state: SharedState, every: Duration, cancel: CancellationToken) {
    info!(interval_secs = every.as_secs(), "expiry sweep started");

    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("expiry sweep stopping");
                break;
            }
            _ = interval.tick() => {
                let expired = timer_service::sweep_expired(&state).await;
                if expired > 0 {
                    info!(expired, "expiry sweep ended overdue rounds");
                } else {
                    debug!("expiry sweep found nothing to do");
                }
            }
        }
    }
}
