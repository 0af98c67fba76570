use ingress_controller_core::Member;
use ingress_controller_k8s_api::{self as k8s, Selector};
use std::{net::IpAddr, num::NonZeroU16};
use tracing::{debug, info, warn};

/// An Ingress's default backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Backend<'a> {
    pub service: &'a str,

    /// `None` when the port is named or unset; symbolic ports are not resolved.
    pub port: Option<NonZeroU16>,
}

// === impl Backend ===

impl<'a> Backend<'a> {
    /// Reads `spec.defaultBackend.service`, if set.
    pub fn from_ingress(ingress: &'a k8s::Ingress) -> Option<Self> {
        let svc = ingress
            .spec
            .as_ref()?
            .default_backend
            .as_ref()?
            .service
            .as_ref()?;
        let port = svc
            .port
            .as_ref()
            .and_then(|p| p.number)
            .and_then(|n| u16::try_from(n).ok())
            .and_then(NonZeroU16::new);
        Some(Self {
            service: svc.name.as_str(),
            port,
        })
    }
}

/// Builds the pod selector of a Service from `spec.selector`.
pub fn service_selector(svc: &k8s::Service) -> Selector {
    svc.spec
        .as_ref()
        .and_then(|spec| spec.selector.clone())
        .map(Selector::from_map)
        .unwrap_or_default()
}

/// Finds the service named `name` in `namespace`.
pub fn find_service<'s>(
    services: impl IntoIterator<Item = &'s k8s::Service>,
    namespace: &str,
    name: &str,
) -> Option<&'s k8s::Service> {
    services.into_iter().find(|svc| {
        svc.metadata.namespace.as_deref() == Some(namespace)
            && svc.metadata.name.as_deref() == Some(name)
    })
}

/// Converts the pods selected for an Ingress's backend into pool members.
///
/// Only running pods with a valid IP become members. The result may be empty.
pub fn members<'p>(
    ingress: &str,
    namespace: &str,
    pods: impl IntoIterator<Item = &'p k8s::Pod>,
    port: Option<NonZeroU16>,
) -> Vec<Member> {
    let Some(port) = port else {
        warn!(%ingress, %namespace, "Backend service port is not numeric, creating virtual server without members");
        return Vec::new();
    };

    let mut members = Vec::new();
    for pod in pods {
        let name = pod.metadata.name.as_deref().unwrap_or_default();
        let status = pod.status.as_ref();
        if status.and_then(|s| s.phase.as_deref()) != Some(k8s::POD_RUNNING) {
            info!(%ingress, %namespace, pod = %name, "Skipping pod that is not running");
            continue;
        }

        let ip = match status.and_then(|s| s.pod_ip.as_deref()) {
            Some(ip) if !ip.is_empty() => ip,
            _ => {
                info!(%ingress, %namespace, pod = %name, "Skipping running pod without an IP");
                continue;
            }
        };
        if let Err(error) = ip.parse::<IpAddr>() {
            warn!(%ingress, %namespace, pod = %name, %ip, %error, "Skipping pod with an invalid IP");
            continue;
        }

        debug!(%ingress, %namespace, pod = %name, %ip, %port, "Adding pod to virtual server");
        members.push(Member {
            name: name.to_string(),
            ip: ip.to_string(),
            port,
        });
    }

    if members.is_empty() {
        debug!(%ingress, %namespace, "No pods found, creating virtual server without members");
    }

    members
}
