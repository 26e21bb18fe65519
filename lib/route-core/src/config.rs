//! Synchronizer configuration

use route_api::{routes_annotation, GATEWAY_INGRESS_CLASS};

/// Which ingress class the synchronizer claims
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncConfig {
    ingress_class: String,
    routes_annotation: String,
}

impl SyncConfig {
    pub fn new(ingress_class: impl Into<String>) -> Self {
        let ingress_class = ingress_class.into();
        let routes_annotation = routes_annotation(&ingress_class);
        Self {
            ingress_class,
            routes_annotation,
        }
    }

    /// Value the class annotation must carry
    pub fn ingress_class(&self) -> &str {
        &self.ingress_class
    }

    /// Annotation key holding the route payload
    pub fn routes_annotation(&self) -> &str {
        &self.routes_annotation
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new(GATEWAY_INGRESS_CLASS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SyncConfig::default();
        assert_eq!(config.ingress_class(), "spring.cloud.gateway");
        assert_eq!(config.routes_annotation(), "spring.cloud.gateway/routes");
    }

    #[test]
    fn test_custom_class_derives_routes_key() {
        let config = SyncConfig::new("edge");
        assert_eq!(config.ingress_class(), "edge");
        assert_eq!(config.routes_annotation(), "edge/routes");
    }
}
