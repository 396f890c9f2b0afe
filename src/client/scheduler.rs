//! Background poll loop of an observer.

use std::{sync::Arc, time::Duration};

use tokio::{sync::Notify, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{api::TimerApi, observer::ObserverCore};

/// Poll the authority every `every` (first poll immediately) and whenever `refresh` fires,
/// until `cancel` is triggered. Failed polls keep the current view.
pub(crate) async fn run(
    api: Arc<dyn TimerApi>,
    core: Arc<ObserverCore>,
    every: Duration,
    refresh: Arc<Notify>,
    cancel: CancellationToken,
) {
    let event_id = core.event_id();
    debug!(%event_id, interval_secs = every.as_secs(), "timer sync started");

    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = refresh.notified() => {
                poll(api.as_ref(), &core, &cancel).await;
                interval.reset();
            }
            _ = interval.tick() => poll(api.as_ref(), &core, &cancel).await,
        }
    }

    debug!(%event_id, "timer sync stopped");
}

async fn poll(api: &dyn TimerApi, core: &Arc<ObserverCore>, cancel: &CancellationToken) {
    let event_id = core.event_id();
    let result = tokio::select! {
        _ = cancel.cancelled() => return,
        result = api.fetch(event_id) => result,
    };

    match result {
        Ok(snapshot) => core.apply_snapshot(&snapshot).await,
        Err(err) => warn!(%event_id, error = %err, "timer poll failed; keeping current view"),
    }
}
