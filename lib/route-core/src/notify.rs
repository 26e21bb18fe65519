//! "Routes changed" notifications for the gateway

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

/// Signal that the route table changed and should be reloaded
#[derive(Clone, Debug, PartialEq)]
pub struct RoutesChanged {
    /// Route whose change triggered the signal
    pub route_id: String,
    pub changed_at: DateTime<Utc>,
}

impl RoutesChanged {
    pub fn new(route_id: impl Into<String>) -> Self {
        Self {
            route_id: route_id.into(),
            changed_at: Utc::now(),
        }
    }
}

/// Publishes refresh signals. Implementations must not block.
pub trait RefreshPublisher: Send + Sync {
    fn publish_refresh(&self, event: RoutesChanged);
}

impl<P: RefreshPublisher + ?Sized> RefreshPublisher for Arc<P> {
    fn publish_refresh(&self, event: RoutesChanged) {
        (**self).publish_refresh(event)
    }
}

/// Fans refresh signals out to any number of subscribers.
///
/// Slow subscribers lag and lose the oldest signals; the sender never waits.
#[derive(Clone)]
pub struct BroadcastRefreshPublisher {
    sender: broadcast::Sender<RoutesChanged>,
}

impl BroadcastRefreshPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RoutesChanged> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastRefreshPublisher {
    fn default() -> Self {
        Self::new(64)
    }
}

impl RefreshPublisher for BroadcastRefreshPublisher {
    fn publish_refresh(&self, event: RoutesChanged) {
        let route_id = event.route_id.clone();
        if self.sender.send(event).is_err() {
            debug!("No subscribers for route refresh ({})", route_id);
        }
    }
}
