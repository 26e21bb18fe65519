//! Reload listener standing in for the gateway's route cache

use route_core::{RouteDefinitionLocator, RoutesChanged};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

/// Reload the route set on every refresh signal until the channel closes.
/// Returns the number of reloads performed.
pub async fn run<L>(mut receiver: broadcast::Receiver<RoutesChanged>, locator: Arc<L>) -> usize
where
    L: RouteDefinitionLocator + ?Sized,
{
    let mut reloads = 0;

    loop {
        match receiver.recv().await {
            Ok(event) => {
                let routes = locator.route_definitions();
                reloads += 1;
                info!(
                    "Reloaded {} gateway routes after change to {}",
                    routes.len(),
                    event.route_id
                );
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!("Route reload lagged, skipped {} refresh signals", skipped);
                let routes = locator.route_definitions();
                reloads += 1;
                info!("Reloaded {} gateway routes", routes.len());
            }
            Err(RecvError::Closed) => {
                debug!("Route refresh channel closed");
                return reloads;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use route_api::RouteDefinition;
    use route_core::{BroadcastRefreshPublisher, RefreshPublisher, RouteTable};

    #[tokio::test]
    async fn test_reloads_once_per_signal() {
        let table = Arc::new(RouteTable::new());
        let publisher = BroadcastRefreshPublisher::new(8);
        let listener = tokio::spawn(run(publisher.subscribe(), table.clone()));

        table.upsert_route(RouteDefinition {
            id: "ns1/app".to_string(),
            ..Default::default()
        });
        publisher.publish_refresh(RoutesChanged::new("ns1/app"));
        publisher.publish_refresh(RoutesChanged::new("ns1/app"));
        drop(publisher);

        assert_eq!(listener.await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_lagged_listener_reloads_once() {
        let table = Arc::new(RouteTable::new());
        let publisher = BroadcastRefreshPublisher::new(1);
        let receiver = publisher.subscribe();

        for i in 0..3 {
            publisher.publish_refresh(RoutesChanged::new(format!("ns/{}", i)));
        }
        drop(publisher);

        // one reload for the lag, one for the retained signal
        assert_eq!(run(receiver, table).await, 2);
    }
}
