//! Route synchronizer translating Ingress lifecycle events into route table updates

use crate::{CoreError, RefreshPublisher, Result, RouteTable, RoutesChanged, SyncConfig};
use futures::{Stream, StreamExt};
use route_api::{
    ResourceEvent, ResourceSnapshot, RouteDefinition, RouteUri, INGRESS_CLASS_ANNOTATION,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What a single event did to the route table
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Route inserted or replaced
    Upserted(String),
    /// Route removed; `existed` is false when nothing was stored for the id
    Removed { id: String, existed: bool },
    /// Resource is not routable and no route was stored for it
    Ignored { id: String, reason: IgnoreReason },
    /// Watch connection closed
    Closed,
}

/// Why a resource does not produce a route
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Class annotation absent or naming another class
    NotOptedIn,
    /// Routes annotation absent
    MissingRoutes,
    /// No default backend declared
    MissingBackend,
    /// No explicit uri and the default backend has no usable service name
    UnroutableBackend,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            IgnoreReason::NotOptedIn => "not of the gateway ingress class",
            IgnoreReason::MissingRoutes => "no routes annotation",
            IgnoreReason::MissingBackend => "no default backend",
            IgnoreReason::UnroutableBackend => "default backend has no routable service",
        };
        f.write_str(text)
    }
}

/// RouteSynchronizer keeps a [`RouteTable`] in line with watched Ingresses.
///
/// Events must be handled one at a time in delivery order. Every table
/// mutation is followed by exactly one refresh signal.
pub struct RouteSynchronizer<P> {
    table: Arc<RouteTable>,
    publisher: P,
    config: SyncConfig,
}

impl<P: RefreshPublisher> RouteSynchronizer<P> {
    pub fn new(table: Arc<RouteTable>, publisher: P, config: SyncConfig) -> Self {
        Self {
            table,
            publisher,
            config,
        }
    }

    /// Get the route table
    pub fn table(&self) -> &Arc<RouteTable> {
        &self.table
    }

    /// Apply one lifecycle event.
    ///
    /// Only a malformed routes annotation is an error; the table is left
    /// untouched in that case.
    pub fn handle(&self, event: ResourceEvent) -> Result<SyncOutcome> {
        match event {
            ResourceEvent::Added(snapshot) | ResourceEvent::Modified(snapshot) => {
                self.apply(&snapshot)
            }
            ResourceEvent::Deleted(snapshot) => Ok(self.delete(&snapshot)),
            ResourceEvent::ConnectionClosed(Some(error)) => {
                warn!("Ingress watch closed: {}", error);
                Ok(SyncOutcome::Closed)
            }
            ResourceEvent::ConnectionClosed(None) => {
                info!("Ingress watch closed");
                Ok(SyncOutcome::Closed)
            }
        }
    }

    /// Handle events until the stream ends or an event fails
    pub async fn run<S>(&self, events: S) -> Result<()>
    where
        S: Stream<Item = ResourceEvent>,
    {
        futures::pin_mut!(events);

        info!(
            "Synchronizing routes for ingress class {}",
            self.config.ingress_class()
        );

        while let Some(event) = events.next().await {
            let outcome = self.handle(event)?;
            debug!("Handled ingress event: {:?}", outcome);
        }

        info!("Ingress event stream ended");
        Ok(())
    }

    fn apply(&self, snapshot: &ResourceSnapshot) -> Result<SyncOutcome> {
        let id = snapshot.id();

        if snapshot.annotation(INGRESS_CLASS_ANNOTATION) != Some(self.config.ingress_class()) {
            debug!(
                "Ingress {} is not of class {}",
                id,
                self.config.ingress_class()
            );
            return Ok(self.ignore(id, IgnoreReason::NotOptedIn));
        }

        let routes_key = self.config.routes_annotation();
        let payload = match snapshot.annotation(routes_key) {
            Some(payload) => payload,
            None => {
                warn!(
                    "No {} annotation found on ingress definition {}. Ignoring this ingress definition.",
                    routes_key, id
                );
                return Ok(self.ignore(id, IgnoreReason::MissingRoutes));
            }
        };

        if snapshot.default_backend.is_none() {
            warn!(
                "No default backend found on ingress definition {}. Ignoring this ingress definition.",
                id
            );
            return Ok(self.ignore(id, IgnoreReason::MissingBackend));
        }

        let mut route = RouteDefinition::from_yaml(payload).map_err(|source| {
            CoreError::MalformedRoutes {
                id: id.clone(),
                source,
            }
        })?;
        route.id = id.clone();

        if route.uri.is_none() {
            match snapshot.backend_service().and_then(RouteUri::load_balanced) {
                Some(uri) => route.uri = Some(uri),
                None => {
                    warn!(
                        "Default backend of ingress definition {} has no routable service name. Ignoring this ingress definition.",
                        id
                    );
                    return Ok(self.ignore(id, IgnoreReason::UnroutableBackend));
                }
            }
        }

        match route.to_yaml() {
            Ok(rendered) => info!("Create or update ingress route {}:\n{}", id, rendered),
            Err(e) => info!("Create or update ingress route {} (not renderable: {})", id, e),
        }

        self.table.upsert_route(route);
        self.publisher.publish_refresh(RoutesChanged::new(id.clone()));

        Ok(SyncOutcome::Upserted(id))
    }

    fn delete(&self, snapshot: &ResourceSnapshot) -> SyncOutcome {
        let id = snapshot.id();
        info!("Delete ingress route {}", id);

        let existed = self.table.remove_route(&id).is_some();
        self.publisher.publish_refresh(RoutesChanged::new(id.clone()));

        SyncOutcome::Removed { id, existed }
    }

    /// A resource that is not routable must not keep a route from an
    /// earlier, routable version of it.
    fn ignore(&self, id: String, reason: IgnoreReason) -> SyncOutcome {
        if self.table.remove_route(&id).is_none() {
            return SyncOutcome::Ignored { id, reason };
        }

        info!("Ingress {} is no longer routable ({}), removing route", id, reason);
        self.publisher.publish_refresh(RoutesChanged::new(id.clone()));

        SyncOutcome::Removed { id, existed: true }
    }
}
