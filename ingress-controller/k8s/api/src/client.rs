use crate::{Ingress, Pod, Selector, Service, Snapshot};
use anyhow::Result;
use kube::api::{Api, ListParams};
use tracing::debug;

/// Lists the cluster resources that desired state is derived from.
///
/// Authentication and transport are entirely the implementation's concern.
#[async_trait::async_trait]
pub trait ClusterClient: Send + Sync {
    /// Lists Ingress resources in all namespaces.
    async fn list_ingresses(&self) -> Result<Vec<Ingress>>;

    /// Lists Service resources in all namespaces.
    async fn list_services(&self) -> Result<Vec<Service>>;

    /// Lists the pods in `namespace` selected by `selector`.
    async fn list_pods(&self, namespace: &str, selector: &Selector) -> Result<Vec<Pod>>;
}

/// A [`ClusterClient`] backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubeClient {
    client: kube::Client,
}

// === impl KubeClient ===

impl KubeClient {
    pub fn new(client: kube::Client) -> Self {
        Self { client }
    }

    /// Lists ingresses, services and every pod in the cluster before any derivation, for callers
    /// that prefer one read of each kind over per-Ingress pod queries.
    ///
    /// The three list calls are still not atomic with respect to each other.
    pub async fn snapshot(&self) -> Result<Snapshot> {
        let ingresses = self.list_ingresses().await?;
        let services = self.list_services().await?;
        let pods = Api::<Pod>::all(self.client.clone())
            .list(&ListParams::default())
            .await?
            .items;
        debug!(
            ingresses = ingresses.len(),
            services = services.len(),
            pods = pods.len(),
            "Fetched cluster snapshot"
        );
        Ok(Snapshot {
            ingresses,
            services,
            pods,
        })
    }
}

impl From<kube::Client> for KubeClient {
    fn from(client: kube::Client) -> Self {
        Self::new(client)
    }
}

#[async_trait::async_trait]
impl ClusterClient for KubeClient {
    async fn list_ingresses(&self) -> Result<Vec<Ingress>> {
        let list = Api::<Ingress>::all(self.client.clone())
            .list(&ListParams::default())
            .await?;
        debug!(count = list.items.len(), "Fetched Ingress objects");
        Ok(list.items)
    }

    async fn list_services(&self) -> Result<Vec<Service>> {
        let list = Api::<Service>::all(self.client.clone())
            .list(&ListParams::default())
            .await?;
        debug!(count = list.items.len(), "Fetched Service objects");
        Ok(list.items)
    }

    async fn list_pods(&self, namespace: &str, selector: &Selector) -> Result<Vec<Pod>> {
        // An empty query string would select every pod in the namespace.
        if selector.is_empty() {
            return Ok(Vec::new());
        }

        let params = ListParams::default().labels(&selector.to_string());
        let list = Api::<Pod>::namespaced(self.client.clone(), namespace)
            .list(&params)
            .await?;
        Ok(list.items)
    }
}
