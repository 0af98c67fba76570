#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod client;
pub mod labels;
mod snapshot;

pub use self::{
    client::{ClusterClient, KubeClient},
    labels::Selector,
    snapshot::Snapshot,
};
pub use k8s_openapi::api::{
    self,
    core::v1::{Pod, PodSpec, PodStatus, Service, ServiceSpec},
    networking::v1::{
        Ingress, IngressBackend, IngressServiceBackend, IngressSpec, IngressTLS,
        ServiceBackendPort,
    },
};
pub use kube::api::{ObjectMeta, ResourceExt};

/// The pod phase in which a pod has been bound to a node and has a routable IP.
pub const POD_RUNNING: &str = "Running";
