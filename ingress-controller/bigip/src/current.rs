use crate::{
    inventory::{self, base_name, Inventory, Monitor, Pool},
    AdcClient,
};
use ingress_controller_core::{
    cancelable, Config, CurrentState, Error, Member, MonitorSpec, Result, VirtualServer,
};
use std::{net::IpAddr, num::NonZeroU16};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// The built-in iRule that redirects HTTP clients to HTTPS.
pub const REDIRECT_IRULE: &str = "_sys_https_redirect";

const CLIENT_SIDE: &str = "clientside";
const SERVER_SIDE: &str = "serverside";

/// Projects the ADC inventory onto the virtual servers owned by the configured partition.
///
/// Pools, virtual servers and monitors outside the partition are ignored, so every projected
/// virtual server and everything attached to it comes from the partition. Virtual servers are
/// returned in inventory order.
pub fn current_state(config: &Config, inventory: &Inventory) -> CurrentState {
    let partition = config.partition();
    let pools = inventory
        .pools
        .iter()
        .filter(|p| p.partition == partition)
        .collect::<Vec<_>>();
    let monitors = inventory
        .monitors
        .iter()
        .filter(|m| m.partition == partition)
        .collect::<Vec<_>>();

    inventory
        .virtuals
        .iter()
        .filter(|v| v.partition == partition)
        .filter_map(|v| project(v, &pools, &monitors))
        .collect()
}

/// Lists the ADC inventory from `client` and projects it.
///
/// Any failed list call fails the projection. Cancelling `shutdown` stops at the next list call
/// with [`Error::Cancelled`].
pub async fn discover_current<C>(
    client: &C,
    config: &Config,
    shutdown: &CancellationToken,
) -> Result<CurrentState>
where
    C: AdcClient + ?Sized,
{
    let pools = cancelable(shutdown, client.list_pools())
        .await?
        .map_err(|e| Error::collaborator("list pools", e))?;
    debug!(count = pools.len(), "Fetched pools");

    let virtuals = cancelable(shutdown, client.list_virtual_servers())
        .await?
        .map_err(|e| Error::collaborator("list virtual servers", e))?;
    debug!(count = virtuals.len(), "Fetched virtual servers");

    let monitors = cancelable(shutdown, client.list_monitors())
        .await?
        .map_err(|e| Error::collaborator("list monitors", e))?;
    debug!(count = monitors.len(), "Fetched monitors");

    let inventory = Inventory {
        pools,
        virtuals,
        monitors,
    };
    Ok(current_state(config, &inventory))
}

fn project(
    virt: &inventory::VirtualServer,
    pools: &[&Pool],
    monitors: &[&Monitor],
) -> Option<VirtualServer> {
    let Some((ip, port)) = virt.destination.as_deref().and_then(parse_destination) else {
        warn!(
            virtual_server = %virt.name,
            destination = ?virt.destination,
            "Skipping virtual server without a valid destination"
        );
        return None;
    };

    let (namespace, name) = split_name(&virt.name);
    let mut vs = VirtualServer::new(name, namespace, port);
    vs.ip = ip;
    vs.client_ssl = virt.profile(CLIENT_SIDE).map(|p| base_name(&p.name).to_string());
    vs.server_ssl = virt.profile(SERVER_SIDE).map(|p| base_name(&p.name).to_string());
    vs.default_persist = virt.persist.first().map(|p| base_name(&p.name).to_string());
    vs.fallback_persist = virt
        .fallback_persistence
        .as_deref()
        .map(|p| base_name(p).to_string());

    for rule in &virt.rules {
        let rule = base_name(rule);
        if rule == REDIRECT_IRULE {
            vs.redirect = true;
        } else {
            vs.irules.push(rule.to_string());
        }
    }

    let pool = virt
        .pool
        .as_deref()
        .and_then(|r| pools.iter().copied().find(|p| p.is_named_by(r)));
    match pool {
        Some(pool) => {
            vs.lb_mode = pool.load_balancing_mode.clone();
            vs.members = members(pool);
            vs.monitor = pool
                .monitor
                .as_deref()
                .and_then(|rule| monitor_refs(rule).next())
                .map(|r| monitor(r, monitors))
                .unwrap_or_default();
        }
        None => debug!(virtual_server = %virt.name, pool = ?virt.pool, "No pool in partition"),
    }

    Some(vs)
}

fn members(pool: &Pool) -> Vec<Member> {
    pool.members()
        .iter()
        .filter_map(|m| {
            let port = split_addr_port(base_name(&m.name))
                .and_then(|(_, port)| port.parse::<NonZeroU16>().ok());
            let Some(port) = port else {
                debug!(pool = %pool.name, member = %m.name, "Skipping member without a port");
                return None;
            };
            let name = m
                .description
                .as_deref()
                .filter(|d| !d.is_empty())
                .unwrap_or(&m.name);
            let ip = m
                .address
                .clone()
                .or_else(|| split_addr_port(base_name(&m.name)).map(|(a, _)| a.to_string()))
                .unwrap_or_default();
            Some(Member {
                name: name.to_string(),
                ip,
                port,
            })
        })
        .collect()
}

fn monitor(reference: &str, monitors: &[&Monitor]) -> MonitorSpec {
    match monitors.iter().find(|m| m.is_named_by(reference)) {
        Some(m) => MonitorSpec {
            type_: m.monitor_type().map(str::to_string),
            interval: m.interval,
            timeout: m.timeout,
            send: m.send.clone(),
            recv: m.recv.clone(),
        },
        None => MonitorSpec::of_type(base_name(reference)),
    }
}

/// Iterates over the monitor paths named by a pool's monitor rule.
fn monitor_refs(rule: &str) -> impl Iterator<Item = &str> {
    rule.split_whitespace().filter(|t| t.starts_with('/'))
}

/// Splits an ADC object name `<namespace>_<name>`.
///
/// Kubernetes namespaces cannot contain `_`, so the first one separates the parts. A name without
/// one keeps an empty namespace.
pub fn split_name(name: &str) -> (&str, &str) {
    name.split_once('_').unwrap_or(("", name))
}

/// Parses a virtual server destination into its address and port.
///
/// Route domains (`%N`) are dropped; a wildcard or unparseable address yields no address.
pub fn parse_destination(destination: &str) -> Option<(Option<IpAddr>, NonZeroU16)> {
    let (addr, port) = split_addr_port(base_name(destination))?;
    let port = port.parse().ok()?;
    let addr = addr.split('%').next().unwrap_or(addr);
    let ip = addr
        .parse::<IpAddr>()
        .ok()
        .filter(|ip| !ip.is_unspecified());
    Some((ip, port))
}

/// Splits `<addr>:<port>`, or `<addr>.<port>` when the address is IPv6.
fn split_addr_port(s: &str) -> Option<(&str, &str)> {
    if s.matches(':').count() > 1 {
        s.rsplit_once('.')
    } else {
        s.rsplit_once(':')
    }
}
