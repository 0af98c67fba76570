use serde::{Deserialize, Serialize};
use std::{net::IpAddr, num::NonZeroU16};

/// Health monitor settings for a virtual server's pool.
///
/// Every field is optional; the type is defaulted when a virtual server is built.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct MonitorSpec {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,

    /// Probe interval, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,

    /// Probe timeout, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recv: Option<String>,
}

/// A pool member.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Member {
    pub name: String,
    pub ip: String,
    pub port: NonZeroU16,
}

/// The canonical description of a single ADC virtual server with its pool and monitor.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualServer {
    pub name: String,
    pub namespace: String,

    /// When unset the virtual server is headless and an external allocator may assign an address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<IpAddr>,

    pub port: NonZeroU16,

    #[serde(rename = "clientSSL", default, skip_serializing_if = "Option::is_none")]
    pub client_ssl: Option<String>,

    #[serde(rename = "serverSSL", default, skip_serializing_if = "Option::is_none")]
    pub server_ssl: Option<String>,

    pub redirect: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_persist: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_persist: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lb_mode: Option<String>,

    #[serde(rename = "iRules", default, skip_serializing_if = "Vec::is_empty")]
    pub irules: Vec<String>,

    #[serde(default)]
    pub members: Vec<Member>,

    #[serde(default)]
    pub monitor: MonitorSpec,
}

/// The virtual servers derived from cluster state, in Ingress order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct DesiredState(Vec<VirtualServer>);

/// The virtual servers found on the ADC within the configured partition.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct CurrentState(Vec<VirtualServer>);

// === impl MonitorSpec ===

impl MonitorSpec {
    pub fn of_type(type_: impl Into<String>) -> Self {
        Self {
            type_: Some(type_.into()),
            ..Default::default()
        }
    }

    /// Sets the monitor type only if none was configured.
    pub fn default_type(&mut self, type_: &str) {
        if self.type_.as_deref().map_or(true, str::is_empty) {
            self.type_ = Some(type_.to_string());
        }
    }
}

// === impl VirtualServer ===

impl VirtualServer {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>, port: NonZeroU16) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ip: None,
            port,
            client_ssl: None,
            server_ssl: None,
            redirect: false,
            default_persist: None,
            fallback_persist: None,
            lb_mode: None,
            irules: Vec::new(),
            members: Vec::new(),
            monitor: MonitorSpec::default(),
        }
    }

    /// Identifies the virtual server within a state: `(namespace, name)`.
    pub fn key(&self) -> (&str, &str) {
        (&self.namespace, &self.name)
    }

    #[inline]
    pub fn is_headless(&self) -> bool {
        self.ip.is_none()
    }
}

// === impl DesiredState / CurrentState ===

macro_rules! state_list {
    ($name:ident) => {
        impl $name {
            pub fn iter(&self) -> std::slice::Iter<'_, VirtualServer> {
                self.0.iter()
            }

            pub fn len(&self) -> usize {
                self.0.len()
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            pub fn get(&self, namespace: &str, name: &str) -> Option<&VirtualServer> {
                self.0.iter().find(|vs| vs.key() == (namespace, name))
            }

            pub fn into_inner(self) -> Vec<VirtualServer> {
                self.0
            }
        }

        impl From<Vec<VirtualServer>> for $name {
            fn from(vs: Vec<VirtualServer>) -> Self {
                Self(vs)
            }
        }

        impl std::iter::FromIterator<VirtualServer> for $name {
            fn from_iter<T: IntoIterator<Item = VirtualServer>>(iter: T) -> Self {
                Self(iter.into_iter().collect())
            }
        }

        impl IntoIterator for $name {
            type Item = VirtualServer;
            type IntoIter = std::vec::IntoIter<VirtualServer>;

            fn into_iter(self) -> Self::IntoIter {
                self.0.into_iter()
            }
        }

        impl<'a> IntoIterator for &'a $name {
            type Item = &'a VirtualServer;
            type IntoIter = std::slice::Iter<'a, VirtualServer>;

            fn into_iter(self) -> Self::IntoIter {
                self.0.iter()
            }
        }
    };
}

state_list!(DesiredState);
state_list!(CurrentState);
