//! ADC objects as reported by the iControl REST API.
//!
//! Only the fields the projection reads are modeled; everything else in a response is ignored.

use crate::AdcClient;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// An expanded subcollection reference, e.g. a pool's `membersReference`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Subcollection<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    pub name: String,
    #[serde(default)]
    pub partition: String,
    #[serde(default)]
    pub full_path: Option<String>,
    #[serde(default)]
    pub load_balancing_mode: Option<String>,

    /// The monitor rule, e.g. `/Common/http ` or `/k8s/web_demo and /Common/tcp`.
    #[serde(default)]
    pub monitor: Option<String>,

    #[serde(default)]
    pub members_reference: Option<Subcollection<PoolMember>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolMember {
    /// `<address>:<port>`, or `<address>.<port>` for IPv6 addresses.
    pub name: String,
    #[serde(default)]
    pub partition: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualServer {
    pub name: String,
    #[serde(default)]
    pub partition: String,
    #[serde(default)]
    pub full_path: Option<String>,

    /// `/<partition>/<address>:<port>`.
    #[serde(default)]
    pub destination: Option<String>,

    #[serde(default)]
    pub pool: Option<String>,
    #[serde(default)]
    pub rules: Vec<String>,
    #[serde(default)]
    pub persist: Vec<Persist>,
    #[serde(default)]
    pub fallback_persistence: Option<String>,
    #[serde(default)]
    pub profiles_reference: Option<Subcollection<Profile>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Persist {
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,

    /// `all`, `clientside` or `serverside`.
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Monitor {
    /// e.g. `tm:ltm:monitor:http:httpstate`.
    #[serde(default)]
    pub kind: Option<String>,
    pub name: String,
    #[serde(default)]
    pub partition: String,
    #[serde(default)]
    pub full_path: Option<String>,
    #[serde(default)]
    pub defaults_from: Option<String>,
    #[serde(default)]
    pub interval: Option<u32>,
    #[serde(default)]
    pub timeout: Option<u32>,
    #[serde(default)]
    pub send: Option<String>,
    #[serde(default)]
    pub recv: Option<String>,
}

/// A complete read of the ADC's pools, virtual servers and monitors.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Inventory {
    pub pools: Vec<Pool>,
    pub virtuals: Vec<VirtualServer>,
    pub monitors: Vec<Monitor>,
}

/// Returns the last component of an object path, e.g. `web_demo` for `/k8s/web_demo`.
pub fn base_name(path: &str) -> &str {
    let path = path.trim();
    path.rsplit('/').next().unwrap_or(path)
}

/// Returns the partition (first folder) of an object path, e.g. `k8s` for `/k8s/web_demo`.
pub fn partition_of(path: &str) -> Option<&str> {
    let rest = path.trim().strip_prefix('/')?;
    let (partition, _) = rest.split_once('/')?;
    Some(partition)
}

// === impl Pool ===

impl Pool {
    pub fn members(&self) -> &[PoolMember] {
        self.members_reference
            .as_ref()
            .map(|r| r.items.as_slice())
            .unwrap_or_default()
    }

    /// Tests whether a virtual server's `pool` reference names this pool.
    pub fn is_named_by(&self, reference: &str) -> bool {
        named_by(&self.name, &self.partition, self.full_path.as_deref(), reference)
    }
}

// === impl VirtualServer ===

impl VirtualServer {
    pub fn profiles(&self) -> &[Profile] {
        self.profiles_reference
            .as_ref()
            .map(|r| r.items.as_slice())
            .unwrap_or_default()
    }

    /// The first profile attached in `context`.
    pub fn profile(&self, context: &str) -> Option<&Profile> {
        self.profiles()
            .iter()
            .find(|p| p.context.as_deref() == Some(context))
    }
}

// === impl Monitor ===

impl Monitor {
    /// The monitor's type, from its parent monitor or else from its REST kind.
    pub fn monitor_type(&self) -> Option<&str> {
        if let Some(parent) = self.defaults_from.as_deref() {
            return Some(base_name(parent));
        }
        self.kind.as_deref()?.split(':').nth(3)
    }

    pub fn is_named_by(&self, reference: &str) -> bool {
        named_by(&self.name, &self.partition, self.full_path.as_deref(), reference)
    }
}

fn named_by(name: &str, partition: &str, full_path: Option<&str>, reference: &str) -> bool {
    let reference = reference.trim();
    if let Some(path) = full_path {
        return path == reference;
    }
    match partition_of(reference) {
        Some(p) => p == partition && base_name(reference) == name,
        None => reference == name,
    }
}

// === impl Inventory ===

#[async_trait::async_trait]
impl AdcClient for Inventory {
    async fn list_pools(&self) -> Result<Vec<Pool>> {
        Ok(self.pools.clone())
    }

    async fn list_virtual_servers(&self) -> Result<Vec<VirtualServer>> {
        Ok(self.virtuals.clone())
    }

    async fn list_monitors(&self) -> Result<Vec<Monitor>> {
        Ok(self.monitors.clone())
    }
}
