use crate::{ClusterClient, Ingress, Pod, Selector, Service};
use anyhow::Result;

/// Cluster objects captured at a single logical instant.
///
/// A snapshot is never mutated by derivation, so it may be shared by concurrent readers.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    pub ingresses: Vec<Ingress>,
    pub services: Vec<Service>,
    pub pods: Vec<Pod>,
}

// === impl Snapshot ===

impl Snapshot {
    /// Iterates over the pods in `namespace` selected by `selector`, in snapshot order.
    pub fn pods<'a>(
        &'a self,
        namespace: &'a str,
        selector: &'a Selector,
    ) -> impl Iterator<Item = &'a Pod> + 'a {
        self.pods.iter().filter(move |pod| {
            pod.metadata.namespace.as_deref() == Some(namespace)
                && selector.matches_labels(pod.metadata.labels.as_ref())
        })
    }
}

#[async_trait::async_trait]
impl ClusterClient for Snapshot {
    async fn list_ingresses(&self) -> Result<Vec<Ingress>> {
        Ok(self.ingresses.clone())
    }

    async fn list_services(&self) -> Result<Vec<Service>> {
        Ok(self.services.clone())
    }

    async fn list_pods(&self, namespace: &str, selector: &Selector) -> Result<Vec<Pod>> {
        Ok(self.pods(namespace, selector).cloned().collect())
    }
}
