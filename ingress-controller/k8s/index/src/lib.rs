//! Desired-state derivation
//!
//! Translates the cluster's declared ingress into ADC virtual servers:
//!
//! - Each `Ingress` is annotated with `virtual-server.f5.com/*` settings (address, ports, health
//!   monitor, iRules, persistence, load-balancing mode) and may declare TLS.
//! - The Ingress's default backend names a `Service` in the same namespace.
//! - The `Service` selects `Pod`s; running pods become the virtual server's pool members.
//!
//! ```text
//! [ Ingress ] -> [ Service ] -> [ Pod ]*
//!      |
//!      +-- annotations --> [ VirtualServer ]
//! ```
//!
//! Ingresses are processed in the order they are listed. An Ingress whose service is missing is
//! skipped; invalid annotations only reset the affected field. Only a failed list call of
//! ingresses or services fails the derivation.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod annotations;
pub mod backend;
pub mod virtual_server;

#[cfg(test)]
mod tests;

pub use self::annotations::{AnnotationError, Settings};
use self::backend::Backend;
use ingress_controller_core::{cancelable, DesiredState, Error, Member, Result, VirtualServer};
use ingress_controller_k8s_api::{self as k8s, ClusterClient, Selector, Snapshot};
use std::{collections::HashSet, num::NonZeroU16};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// An Ingress whose settings have been decoded and whose backend service exists.
struct Resolved<'a> {
    name: &'a str,
    namespace: &'a str,
    tls: Option<&'a k8s::IngressTLS>,
    settings: Settings,
    selector: Selector,
    port: Option<NonZeroU16>,
}

/// Accumulates virtual servers, dropping repeated `(namespace, name)` keys.
#[derive(Default)]
struct Assembler {
    seen: HashSet<(String, String)>,
    virtual_servers: Vec<VirtualServer>,
}

/// Derives the desired state from a snapshot.
///
/// Pure: the result depends only on `snapshot`, which is not modified.
pub fn desired_state(snapshot: &Snapshot) -> DesiredState {
    let mut assembler = Assembler::default();
    for ingress in &snapshot.ingresses {
        let Some(resolved) = resolve(ingress, &snapshot.services) else {
            continue;
        };
        let pods = snapshot.pods(resolved.namespace, &resolved.selector);
        let members =
            backend::members(resolved.name, resolved.namespace, pods, resolved.port);
        assembler.push(resolved.build(members));
    }
    assembler.finish()
}

/// Derives the desired state by listing resources from `client`.
///
/// Ingresses and services are each listed once; pods are listed per resolved Ingress. A failure
/// to list ingresses or services fails the derivation, while a failure to list an Ingress's pods
/// only leaves that virtual server without members. Cancelling `shutdown` stops the derivation at
/// the next list call with [`Error::Cancelled`].
pub async fn discover_desired<C>(client: &C, shutdown: &CancellationToken) -> Result<DesiredState>
where
    C: ClusterClient + ?Sized,
{
    let ingresses = cancelable(shutdown, client.list_ingresses())
        .await?
        .map_err(|e| Error::collaborator("list ingresses", e))?;
    debug!(count = ingresses.len(), "Listed Ingress objects");

    let services = cancelable(shutdown, client.list_services())
        .await?
        .map_err(|e| Error::collaborator("list services", e))?;
    debug!(count = services.len(), "Listed Service objects");

    let mut assembler = Assembler::default();
    for ingress in &ingresses {
        let Some(resolved) = resolve(ingress, &services) else {
            continue;
        };

        let pods = match cancelable(
            shutdown,
            client.list_pods(resolved.namespace, &resolved.selector),
        )
        .await?
        {
            Ok(pods) => pods,
            Err(error) => {
                warn!(
                    ingress = %resolved.name,
                    namespace = %resolved.namespace,
                    %error,
                    "Call to fetch pods failed"
                );
                Vec::new()
            }
        };
        let members =
            backend::members(resolved.name, resolved.namespace, &pods, resolved.port);
        assembler.push(resolved.build(members));
    }

    Ok(assembler.finish())
}

/// Decodes an Ingress and finds its backend service. Returns `None` if the Ingress is skipped.
fn resolve<'a>(ingress: &'a k8s::Ingress, services: &'a [k8s::Service]) -> Option<Resolved<'a>> {
    let (name, namespace) = match (
        ingress.metadata.name.as_deref(),
        ingress.metadata.namespace.as_deref(),
    ) {
        (Some(name), Some(ns)) if !name.is_empty() && !ns.is_empty() => (name, ns),
        (name, namespace) => {
            warn!(?name, ?namespace, "Skipping Ingress without a name and namespace");
            return None;
        }
    };

    let settings = match ingress.metadata.annotations.as_ref() {
        Some(annotations) => Settings::from_annotations(name, namespace, annotations),
        None => Settings::from_annotations(name, namespace, &Default::default()),
    };

    let Some(backend) = Backend::from_ingress(ingress) else {
        info!(ingress = %name, %namespace, "No default backend service, skipping this Ingress");
        return None;
    };
    let Some(service) = backend::find_service(services, namespace, backend.service) else {
        info!(
            ingress = %name,
            %namespace,
            service = %backend.service,
            "Service not found, skipping this Ingress"
        );
        return None;
    };

    Some(Resolved {
        name,
        namespace,
        tls: virtual_server::first_tls(ingress),
        settings,
        selector: backend::service_selector(service),
        port: backend.port,
    })
}

// === impl Resolved ===

impl Resolved<'_> {
    fn build(self, members: Vec<Member>) -> VirtualServer {
        virtual_server::build(self.name, self.namespace, self.tls, self.settings, members)
    }
}

// === impl Assembler ===

impl Assembler {
    fn push(&mut self, vs: VirtualServer) {
        if !self.seen.insert((vs.namespace.clone(), vs.name.clone())) {
            warn!(
                ingress = %vs.name,
                namespace = %vs.namespace,
                "Duplicate Ingress, keeping the first occurrence"
            );
            return;
        }
        self.virtual_servers.push(vs);
    }

    fn finish(self) -> DesiredState {
        DesiredState::from(self.virtual_servers)
    }
}
