//! Lifecycle events delivered by a resource watch source

use std::collections::BTreeMap;
use std::fmt;

/// A change observed on a watched resource
#[derive(Clone, Debug, PartialEq)]
pub enum ResourceEvent {
    /// Resource seen for the first time
    Added(ResourceSnapshot),
    /// Resource changed; the snapshot is the complete new state
    Modified(ResourceSnapshot),
    /// Resource removed; the snapshot is its last known state
    Deleted(ResourceSnapshot),
    /// The watch connection ended, optionally because of an error
    ConnectionClosed(Option<String>),
}

impl ResourceEvent {
    /// Snapshot carried by the event, if any
    pub fn snapshot(&self) -> Option<&ResourceSnapshot> {
        match self {
            ResourceEvent::Added(s) | ResourceEvent::Modified(s) | ResourceEvent::Deleted(s) => {
                Some(s)
            }
            ResourceEvent::ConnectionClosed(_) => None,
        }
    }
}

/// Point-in-time view of the resource fields used for routing
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResourceSnapshot {
    pub namespace: String,
    pub name: String,
    pub annotations: Option<BTreeMap<String, String>>,
    pub default_backend: Option<DefaultBackend>,
}

/// Fallback backend declared on a resource
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DefaultBackend {
    /// Name of the backing service; None for non-service backends
    pub service_name: Option<String>,
}

impl ResourceSnapshot {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Combined identity: `namespace/name`
    pub fn id(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    /// Look up an annotation value
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations
            .as_ref()
            .and_then(|annotations| annotations.get(key))
            .map(String::as_str)
    }

    /// Add or replace an annotation
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Declare a default backend pointing at a service
    pub fn with_backend_service(mut self, service_name: impl Into<String>) -> Self {
        self.default_backend = Some(DefaultBackend {
            service_name: Some(service_name.into()),
        });
        self
    }

    /// Service name of the default backend, if one is declared
    pub fn backend_service(&self) -> Option<&str> {
        self.default_backend
            .as_ref()
            .and_then(|backend| backend.service_name.as_deref())
    }
}

impl fmt::Display for ResourceSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
