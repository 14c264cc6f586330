use crate::core::schedule::job_scheduler::JobScheduler;
use std::time::Duration;
use tokio::select;
use tokio::sync::oneshot;
use tokio::time::sleep;

/// Fires the scheduler tick every `interval` until shut down.
pub struct ScheduleTimer {
    scheduler: JobScheduler,
    interval: Duration,
    shutdown_rx: oneshot::Receiver<()>,
}

impl ScheduleTimer {
    pub fn new(
        scheduler: JobScheduler,
        interval: Duration,
        shutdown_rx: oneshot::Receiver<()>,
    ) -> Self {
        ScheduleTimer {
            scheduler,
            interval,
            shutdown_rx,
        }
    }

    pub async fn run(self) {
        let ScheduleTimer {
            scheduler,
            interval,
            mut shutdown_rx,
        } = self;
        loop {
            select! {
                biased;
                _ = &mut shutdown_rx => { break; }
                _ = sleep(interval) => {}
            }
            // Dispatched runs are detached, the tick never waits for them.
            let dispatched = scheduler.tick().await;
            if !dispatched.is_empty() {
                tracing::debug!(count = dispatched.len(), "Dispatched due jobs");
            }
        }
    }
}
