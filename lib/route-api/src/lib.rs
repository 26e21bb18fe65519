//! Route API types for the ingress route locator
//!
//! This library defines the data exchanged between the watch source, the
//! route synchronizer and the gateway:
//! - ResourceEvent / ResourceSnapshot: lifecycle events for watched Ingresses
//! - RouteDefinition: a gateway route carried in an Ingress annotation
//! - Annotation keys that opt an Ingress in to routing

pub mod annotations;
pub mod event;
pub mod ingress;
pub mod route;
pub mod uri;

pub use annotations::{
    routes_annotation, GATEWAY_INGRESS_CLASS, INGRESS_CLASS_ANNOTATION, LOAD_BALANCER_SCHEME,
};
pub use event::{DefaultBackend, ResourceEvent, ResourceSnapshot};
pub use route::{FilterDefinition, NamedDefinition, ParseError, PredicateDefinition, RouteDefinition};
pub use uri::{RouteUri, UriError};
