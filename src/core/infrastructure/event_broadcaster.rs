use crate::model::core::schedule::event::SchedulerEvent;
use tokio::sync::broadcast;

/// Best-effort fan-out of scheduler notifications. Publishing never blocks;
/// with no subscriber the event is dropped, a lagging subscriber loses the oldest ones.
pub struct EventBroadcaster {
    sender: broadcast::Sender<SchedulerEvent>,
}

impl EventBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SchedulerEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: SchedulerEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("No subscriber for scheduler event");
        }
    }
}
