//! Kubernetes watch source for Ingress resources
//!
//! Turns the `kube` watcher stream into the lifecycle events consumed by the
//! route synchronizer.
pub mod error;
pub mod source;

pub use error::{Result, WatchError};
pub use source::{translate, EventMapper, IngressWatchSource};
