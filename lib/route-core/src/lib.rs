//! Core route synchronization functionality
//!
//! This library provides:
//! - Route table holding the live set of gateway route definitions
//! - Route synchronizer translating Ingress lifecycle events into table updates
//! - Refresh notifications telling the gateway to reload its routes

pub mod config;
pub mod error;
pub mod notify;
pub mod synchronizer;
pub mod table;

pub use config::SyncConfig;
pub use error::{CoreError, Result};
pub use notify::{BroadcastRefreshPublisher, RefreshPublisher, RoutesChanged};
pub use synchronizer::{IgnoreReason, RouteSynchronizer, SyncOutcome};
pub use table::{RouteDefinitionLocator, RouteSnapshot, RouteTable};
