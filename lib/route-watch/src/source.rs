//! Ingress watch source

use crate::Result;
use futures::stream::{self, Stream, StreamExt};
use k8s_openapi::api::networking::v1::Ingress;
use kube::{Api, Client};
use kube_runtime::watcher;
use kube_runtime::watcher::Event;
use kube_runtime::WatchStreamExt;
use route_api::{ResourceEvent, ResourceSnapshot};
use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use tracing::{debug, info, warn};

/// IngressWatchSource watches Ingresses across all namespaces, or a single one
pub struct IngressWatchSource {
    client: Client,
    namespace: Option<String>,
}

impl IngressWatchSource {
    /// Create a watch source using the default Kubernetes client configuration
    pub async fn new(namespace: Option<String>) -> Result<Self> {
        let client = Client::try_default().await?;
        Ok(Self::from_client(client, namespace))
    }

    pub fn from_client(client: Client, namespace: Option<String>) -> Self {
        Self { client, namespace }
    }

    fn api(&self) -> Api<Ingress> {
        match &self.namespace {
            Some(namespace) => Api::namespaced(self.client.clone(), namespace),
            None => Api::all(self.client.clone()),
        }
    }

    /// Start watching. The kube watcher reconnects with backoff on its own;
    /// each failure is reported as a `ConnectionClosed` event.
    pub fn events(&self) -> impl Stream<Item = ResourceEvent> + Send + 'static {
        match &self.namespace {
            Some(namespace) => info!("Starting Ingress watcher in namespace {}", namespace),
            None => info!("Starting Ingress watcher in all namespaces"),
        }

        let raw = watcher(self.api(), watcher::Config::default()).default_backoff();
        translate(raw)
    }
}

/// Map a raw watcher stream to resource events, ending with a final
/// `ConnectionClosed(None)` when the watcher stream ends.
pub fn translate<S>(raw: S) -> impl Stream<Item = ResourceEvent> + Send
where
    S: Stream<Item = std::result::Result<Event<Ingress>, watcher::Error>> + Send,
{
    let mut mapper = EventMapper::default();

    raw.map(move |item| {
        let events = match item {
            Ok(event) => mapper.on_event(event),
            Err(e) => vec![mapper.on_error(e)],
        };
        stream::iter(events)
    })
    .flatten()
    .chain(stream::once(async { ResourceEvent::ConnectionClosed(None) }))
}

/// Tracks which Ingresses this source has reported so that applies can be
/// split into Added and Modified, and objects that vanished while the watch
/// was re-listing are reported as Deleted.
#[derive(Default)]
pub struct EventMapper {
    known: HashMap<String, ResourceSnapshot>,
    relisting: Option<HashSet<String>>,
}

impl EventMapper {
    pub fn on_event(&mut self, event: Event<Ingress>) -> Vec<ResourceEvent> {
        match event {
            Event::Init => {
                debug!("Ingress watcher listing");
                self.relisting = Some(HashSet::new());
                Vec::new()
            }
            Event::InitApply(ingress) => {
                let snapshot = ResourceSnapshot::from(&ingress);
                if let Some(seen) = self.relisting.as_mut() {
                    seen.insert(snapshot.id());
                }
                vec![self.apply(snapshot)]
            }
            Event::InitDone => {
                let Some(seen) = self.relisting.take() else {
                    return Vec::new();
                };
                let vanished: Vec<String> = self
                    .known
                    .keys()
                    .filter(|id| !seen.contains(*id))
                    .cloned()
                    .collect();

                info!(
                    "Ingress watcher initial sync complete ({} ingresses, {} vanished)",
                    seen.len(),
                    vanished.len()
                );

                vanished
                    .into_iter()
                    .filter_map(|id| self.known.remove(&id))
                    .map(ResourceEvent::Deleted)
                    .collect()
            }
            Event::Apply(ingress) => vec![self.apply(ResourceSnapshot::from(&ingress))],
            Event::Delete(ingress) => {
                let snapshot = ResourceSnapshot::from(&ingress);
                self.known.remove(&snapshot.id());
                vec![ResourceEvent::Deleted(snapshot)]
            }
        }
    }

    pub fn on_error(&mut self, error: impl Display) -> ResourceEvent {
        warn!("Ingress watcher error: {}", error);
        ResourceEvent::ConnectionClosed(Some(error.to_string()))
    }

    fn apply(&mut self, snapshot: ResourceSnapshot) -> ResourceEvent {
        match self.known.insert(snapshot.id(), snapshot.clone()) {
            Some(_) => ResourceEvent::Modified(snapshot),
            None => ResourceEvent::Added(snapshot),
        }
    }
}
