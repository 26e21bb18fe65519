//! Annotation keys recognized on watched Ingress resources

/// Annotation selecting the controller responsible for an Ingress
pub const INGRESS_CLASS_ANNOTATION: &str = "kubernetes.io/ingress.class";

/// Ingress class value that opts a resource in to gateway routing
pub const GATEWAY_INGRESS_CLASS: &str = "spring.cloud.gateway";

/// URI scheme meaning "resolve the host as a service through the load balancer"
pub const LOAD_BALANCER_SCHEME: &str = "lb";

/// Annotation key holding the YAML route payload for an ingress class
pub fn routes_annotation(ingress_class: &str) -> String {
    format!("{}/routes", ingress_class)
}
