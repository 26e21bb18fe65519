//! Conversion from Kubernetes Ingress objects to resource snapshots

use crate::event::{DefaultBackend, ResourceSnapshot};
use k8s_openapi::api::networking::v1::Ingress;
use kube::ResourceExt;

impl From<&Ingress> for ResourceSnapshot {
    fn from(ingress: &Ingress) -> Self {
        let default_backend = ingress
            .spec
            .as_ref()
            .and_then(|spec| spec.default_backend.as_ref())
            .map(|backend| DefaultBackend {
                service_name: backend.service.as_ref().map(|svc| svc.name.clone()),
            });

        Self {
            namespace: ingress.namespace().unwrap_or_else(|| "default".to_string()),
            name: ingress.name_any(),
            annotations: ingress.metadata.annotations.clone(),
            default_backend,
        }
    }
}
