//! Current-state projection from a BIG-IP.
//!
//! The controller owns a single ADC partition. Everything it has configured there (virtual
//! servers, their pools and members, and health monitors) is read through the iControl REST API
//! and projected back onto the same [`VirtualServer`](ingress_controller_core::VirtualServer)
//! model the desired state is derived into.
//!
//! ```text
//! [ virtual ] -> [ pool ] -> [ member ]*
//!      |             |
//!      |             +-- monitor rule --> [ monitor ]
//!      +-- profiles, rules, persistence
//! ```

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod client;
pub mod current;
pub mod inventory;

pub use self::{
    client::Client,
    current::{current_state, discover_current},
    inventory::Inventory,
};

/// Lists the ADC objects the projection reads.
///
/// Each call returns objects from every partition; the projection filters them.
#[async_trait::async_trait]
pub trait AdcClient: Send + Sync {
    async fn list_pools(&self) -> anyhow::Result<Vec<inventory::Pool>>;

    async fn list_virtual_servers(&self) -> anyhow::Result<Vec<inventory::VirtualServer>>;

    async fn list_monitors(&self) -> anyhow::Result<Vec<inventory::Monitor>>;
}
