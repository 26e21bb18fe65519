//! End-to-end synchronization scenarios driven through event streams

use futures::stream;
use route_api::{
    ResourceEvent, ResourceSnapshot, GATEWAY_INGRESS_CLASS, INGRESS_CLASS_ANNOTATION,
};
use route_core::{
    BroadcastRefreshPublisher, CoreError, RouteDefinitionLocator, RouteSynchronizer, RouteTable,
    SyncConfig,
};
use std::sync::Arc;
use tokio::sync::broadcast::{error::TryRecvError, Receiver};

fn app_ingress(routes: &str) -> ResourceSnapshot {
    ResourceSnapshot::new("ns1", "app")
        .with_annotation(INGRESS_CLASS_ANNOTATION, GATEWAY_INGRESS_CLASS)
        .with_annotation("spring.cloud.gateway/routes", routes)
        .with_backend_service("app-svc")
}

fn setup() -> (
    RouteSynchronizer<BroadcastRefreshPublisher>,
    Arc<RouteTable>,
    Receiver<route_core::RoutesChanged>,
) {
    let table = Arc::new(RouteTable::new());
    let publisher = BroadcastRefreshPublisher::new(16);
    let receiver = publisher.subscribe();
    let sync = RouteSynchronizer::new(table.clone(), publisher, SyncConfig::default());
    (sync, table, receiver)
}

fn drain(receiver: &mut Receiver<route_core::RoutesChanged>) -> Vec<String> {
    let mut ids = Vec::new();
    loop {
        match receiver.try_recv() {
            Ok(event) => ids.push(event.route_id),
            Err(TryRecvError::Empty) => return ids,
            Err(e) => panic!("unexpected receive error: {}", e),
        }
    }
}

#[tokio::test]
async fn test_add_then_delete_scenario() {
    let (sync, table, mut receiver) = setup();

    sync.run(stream::iter(vec![ResourceEvent::Added(app_ingress(
        "predicates:\n- Path=/app/**",
    ))]))
    .await
    .unwrap();

    let routes = table.route_definitions();
    assert_eq!(routes.len(), 1);
    let route = routes.get("ns1/app").unwrap();
    assert_eq!(route.uri.as_ref().unwrap().as_str(), "lb://app-svc");
    assert_eq!(route.predicates[0].name, "Path");
    assert_eq!(
        route.predicates[0].args.get("_genkey_0").map(String::as_str),
        Some("/app/**")
    );
    assert_eq!(drain(&mut receiver), vec!["ns1/app"]);

    sync.run(stream::iter(vec![ResourceEvent::Deleted(
        ResourceSnapshot::new("ns1", "app"),
    )]))
    .await
    .unwrap();

    assert!(table.route_definitions().iter().all(|r| r.id != "ns1/app"));
    assert!(table.route_definitions().is_empty());
    assert_eq!(drain(&mut receiver), vec!["ns1/app"]);
}

#[tokio::test]
async fn test_malformed_payload_stops_the_stream() {
    let (sync, table, mut receiver) = setup();

    let other = ResourceSnapshot::new("ns2", "other")
        .with_annotation(INGRESS_CLASS_ANNOTATION, GATEWAY_INGRESS_CLASS)
        .with_annotation("spring.cloud.gateway/routes", "predicates: []")
        .with_backend_service("other-svc");

    let result = sync
        .run(stream::iter(vec![
            ResourceEvent::Added(app_ingress("not: [valid")),
            ResourceEvent::Added(other),
        ]))
        .await;

    assert!(matches!(result, Err(CoreError::MalformedRoutes { ref id, .. }) if id == "ns1/app"));
    assert!(table.route_definitions().is_empty());
    assert!(drain(&mut receiver).is_empty());
}

#[tokio::test]
async fn test_events_apply_in_delivery_order() {
    let (sync, table, mut receiver) = setup();

    let ignored = ResourceSnapshot::new("ns1", "nginx")
        .with_annotation(INGRESS_CLASS_ANNOTATION, "nginx")
        .with_backend_service("svc");

    sync.run(stream::iter(vec![
        ResourceEvent::Added(app_ingress("predicates:\n- Path=/v1/**")),
        ResourceEvent::Added(ignored),
        ResourceEvent::Modified(app_ingress("predicates:\n- Path=/v2/**")),
        ResourceEvent::ConnectionClosed(Some("watch expired".to_string())),
        ResourceEvent::Modified(app_ingress(
            "uri: http://pinned.example.org\npredicates:\n- Path=/v3/**",
        )),
        ResourceEvent::ConnectionClosed(None),
    ]))
    .await
    .unwrap();

    let routes = table.route_definitions();
    assert_eq!(routes.len(), 1);
    let route = routes.get("ns1/app").unwrap();
    assert_eq!(
        route.predicates[0].args.get("_genkey_0").map(String::as_str),
        Some("/v3/**")
    );
    assert_eq!(
        route.uri.as_ref().unwrap().as_str(),
        "http://pinned.example.org"
    );
    assert_eq!(drain(&mut receiver), vec!["ns1/app", "ns1/app", "ns1/app"]);
}

#[tokio::test]
async fn test_annotation_removal_drops_route() {
    let (sync, table, mut receiver) = setup();

    sync.run(stream::iter(vec![
        ResourceEvent::Added(app_ingress("predicates: []")),
        ResourceEvent::Modified(
            ResourceSnapshot::new("ns1", "app")
                .with_annotation(INGRESS_CLASS_ANNOTATION, GATEWAY_INGRESS_CLASS)
                .with_backend_service("app-svc"),
        ),
    ]))
    .await
    .unwrap();

    assert!(table.route_definitions().is_empty());
    assert_eq!(drain(&mut receiver), vec!["ns1/app", "ns1/app"]);
}

#[tokio::test]
async fn test_readers_keep_their_snapshot_while_stream_runs() {
    let (sync, table, _receiver) = setup();
    sync.run(stream::iter(vec![ResourceEvent::Added(app_ingress(
        "predicates: []",
    ))]))
    .await
    .unwrap();

    let before = table.route_definitions();
    sync.run(stream::iter(vec![ResourceEvent::Deleted(app_ingress(
        "predicates: []",
    ))]))
    .await
    .unwrap();

    assert_eq!(before.len(), 1);
    assert!(table.route_definitions().is_empty());
}
