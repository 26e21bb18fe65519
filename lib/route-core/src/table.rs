//! Route table holding the live gateway route definitions

use crate::{CoreError, Result};
use arc_swap::ArcSwap;
use route_api::RouteDefinition;
use serde::{Serialize, Serializer};
use std::collections::hash_map;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

type RouteMap = HashMap<String, Arc<RouteDefinition>>;

/// RouteTable maps route ids (namespace/name) to route definitions.
///
/// Writers build a new map and swap it in; readers load the current map
/// without taking a lock and never see a half-applied update.
pub struct RouteTable {
    routes: ArcSwap<RouteMap>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self {
            routes: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    /// Insert or replace a route, returning the previous definition
    pub fn upsert_route(&self, route: RouteDefinition) -> Option<Arc<RouteDefinition>> {
        let route = Arc::new(route);
        let mut previous = None;

        self.routes.rcu(|current| {
            let mut next = RouteMap::clone(current);
            previous = next.insert(route.id.clone(), route.clone());
            next
        });

        debug!("Upserted route: {}", route.id);
        previous
    }

    /// Remove a route, returning it if it was present
    pub fn remove_route(&self, id: &str) -> Option<Arc<RouteDefinition>> {
        if !self.routes.load().contains_key(id) {
            return None;
        }

        let mut removed = None;
        self.routes.rcu(|current| {
            let mut next = RouteMap::clone(current);
            removed = next.remove(id);
            next
        });

        if removed.is_some() {
            debug!("Removed route: {}", id);
        }
        removed
    }

    /// Get a route by id
    pub fn get_route(&self, id: &str) -> Result<Arc<RouteDefinition>> {
        self.routes
            .load()
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::RouteNotFound(id.to_string()))
    }

    pub fn contains_route(&self, id: &str) -> bool {
        self.routes.load().contains_key(id)
    }

    /// Snapshot of all routes currently in the table
    pub fn list_routes(&self) -> RouteSnapshot {
        RouteSnapshot {
            routes: self.routes.load_full(),
        }
    }

    pub fn route_count(&self) -> usize {
        self.routes.load().len()
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Read side of the route table as consumed by the gateway
pub trait RouteDefinitionLocator: Send + Sync {
    fn route_definitions(&self) -> RouteSnapshot;
}

impl RouteDefinitionLocator for RouteTable {
    fn route_definitions(&self) -> RouteSnapshot {
        self.list_routes()
    }
}

/// Immutable view of the table at the time it was taken.
///
/// Later table updates do not affect an existing snapshot; it can be
/// iterated any number of times. Iteration order is unspecified.
#[derive(Clone, Debug)]
pub struct RouteSnapshot {
    routes: Arc<RouteMap>,
}

impl RouteSnapshot {
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.routes.values(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&RouteDefinition> {
        self.routes.get(id).map(Arc::as_ref)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.routes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn to_vec(&self) -> Vec<RouteDefinition> {
        self.iter().cloned().collect()
    }
}

/// Iterator over the definitions in a [`RouteSnapshot`]
pub struct Iter<'a> {
    inner: hash_map::Values<'a, String, Arc<RouteDefinition>>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a RouteDefinition;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(Arc::as_ref)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a> IntoIterator for &'a RouteSnapshot {
    type Item = &'a RouteDefinition;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Serialize for RouteSnapshot {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(id: &str, order: i32) -> RouteDefinition {
        RouteDefinition {
            id: id.to_string(),
            order,
            ..Default::default()
        }
    }

    #[test]
    fn test_upsert_and_get() {
        let table = RouteTable::new();
        assert!(table.upsert_route(route("ns1/app", 0)).is_none());

        assert_eq!(table.route_count(), 1);
        assert!(table.contains_route("ns1/app"));
        assert_eq!(table.get_route("ns1/app").unwrap().order, 0);
    }

    #[test]
    fn test_upsert_replaces_existing() {
        let table = RouteTable::new();
        table.upsert_route(route("ns1/app", 0));

        let previous = table.upsert_route(route("ns1/app", 7)).unwrap();
        assert_eq!(previous.order, 0);
        assert_eq!(table.route_count(), 1);
        assert_eq!(table.get_route("ns1/app").unwrap().order, 7);
    }

    #[test]
    fn test_remove_route() {
        let table = RouteTable::new();
        table.upsert_route(route("ns1/app", 0));

        assert!(table.remove_route("ns1/app").is_some());
        assert!(table.remove_route("ns1/app").is_none());
        assert_eq!(table.route_count(), 0);
        assert!(matches!(
            table.get_route("ns1/app"),
            Err(CoreError::RouteNotFound(id)) if id == "ns1/app"
        ));
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_updates() {
        let table = RouteTable::new();
        table.upsert_route(route("ns1/a", 0));
        let snapshot = table.list_routes();

        table.upsert_route(route("ns1/b", 0));
        table.remove_route("ns1/a");

        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.contains("ns1/a"));
        assert!(!snapshot.contains("ns1/b"));
        assert_eq!(table.list_routes().len(), 1);
        assert!(table.list_routes().contains("ns1/b"));
    }

    #[test]
    fn test_snapshot_is_restartable() {
        let table = RouteTable::new();
        table.upsert_route(route("ns1/a", 0));
        table.upsert_route(route("ns2/b", 0));

        let snapshot = table.route_definitions();
        assert_eq!(snapshot.iter().count(), 2);
        assert_eq!((&snapshot).into_iter().count(), 2);

        let mut ids: Vec<_> = snapshot.iter().map(|r| r.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["ns1/a", "ns2/b"]);
    }

    #[test]
    fn test_snapshot_serializes_as_array() {
        let table = RouteTable::new();
        assert_eq!(serde_json::to_string(&table.list_routes()).unwrap(), "[]");

        table.upsert_route(route("ns1/a", 3));
        let json = serde_json::to_value(table.list_routes()).unwrap();
        assert_eq!(json[0]["id"], "ns1/a");
        assert_eq!(json[0]["order"], 3);
    }

    #[test]
    fn test_concurrent_readers_see_whole_routes() {
        let table = Arc::new(RouteTable::new());

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let table = table.clone();
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        for route in table.list_routes().iter() {
                            assert_eq!(route.id, "ns1/app");
                            assert_eq!(route.order, route.predicates.len() as i32);
                        }
                    }
                })
            })
            .collect();

        for i in 0..500 {
            let mut next = route("ns1/app", i % 5);
            next.predicates = (0..i % 5)
                .map(|n| route_api::NamedDefinition::new(format!("P{}", n)))
                .collect();
            table.upsert_route(next);
        }

        for reader in readers {
            reader.join().unwrap();
        }
    }
}
