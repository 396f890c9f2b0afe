use std::{sync::Arc, time::Duration};

use tokio::time::{Instant, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::observer::ObserverCore;

const TICK: Duration = Duration::from_secs(1);

/// Owns the single local decrement loop of an observer.
///
/// Every restart cancels the previous loop before spawning the next one, and each loop is bound
/// to a machine generation, so a loop that outlives its cancellation still cannot decrement.
pub(crate) struct LocalCountdownTicker {
    parent: CancellationToken,
    running: Option<CancellationToken>,
}

impl LocalCountdownTicker {
    pub(crate) fn new(parent: CancellationToken) -> Self {
        Self {
            parent,
            running: None,
        }
    }

    pub(crate) fn restart(&mut self, generation: u64, core: Arc<ObserverCore>) {
        self.stop();
        let cancel = self.parent.child_token();
        self.running = Some(cancel.clone());
        debug!(generation, "countdown ticker started");
        tokio::spawn(run(core, generation, cancel));
    }

    pub(crate) fn stop(&mut self) {
        if let Some(cancel) = self.running.take() {
            cancel.cancel();
        }
    }
}

impl Drop for LocalCountdownTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run(core: Arc<ObserverCore>, generation: u64, cancel: CancellationToken) {
    let mut interval = interval_at(Instant::now() + TICK, TICK);
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                if !core.tick(generation).await {
                    break;
                }
            }
        }
    }
    debug!(generation, "countdown ticker stopped");
}
