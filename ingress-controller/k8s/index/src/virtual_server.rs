use crate::annotations::Settings;
use ingress_controller_core::{
    Member, VirtualServer, MONITOR_TYPE_HTTP, MONITOR_TYPE_HTTPS,
};
use ingress_controller_k8s_api as k8s;
use std::num::NonZeroU16;

const DEFAULT_HTTP_PORT: NonZeroU16 = match NonZeroU16::new(80) {
    Some(p) => p,
    None => unreachable!(),
};

const DEFAULT_HTTPS_PORT: NonZeroU16 = match NonZeroU16::new(443) {
    Some(p) => p,
    None => unreachable!(),
};

/// Combines an Ingress's identity, decoded settings and resolved members into a virtual server.
///
/// TLS is determined by the Ingress's first `spec.tls` entry: its secret becomes the client SSL
/// profile, the default port becomes 443 and redirect is enabled unless disabled by annotation.
/// The monitor type defaults to `https` when a server SSL profile is set and to `http` otherwise.
pub fn build(
    name: &str,
    namespace: &str,
    tls: Option<&k8s::IngressTLS>,
    settings: Settings,
    members: Vec<Member>,
) -> VirtualServer {
    let Settings {
        ip,
        http_port,
        https_port,
        ssl_redirect,
        monitor,
        server_ssl,
        irules,
        lb_mode,
        default_persist,
        fallback_persist,
    } = settings;

    let (port, client_ssl, redirect) = match tls {
        Some(tls) => {
            let client_ssl = tls.secret_name.clone();
            let redirect = ssl_redirect && client_ssl.is_some();
            (https_port.unwrap_or(DEFAULT_HTTPS_PORT), client_ssl, redirect)
        }
        None => (http_port.unwrap_or(DEFAULT_HTTP_PORT), None, false),
    };

    let mut monitor = monitor.unwrap_or_default();
    if server_ssl.is_some() {
        monitor.default_type(MONITOR_TYPE_HTTPS);
    }
    monitor.default_type(MONITOR_TYPE_HTTP);

    VirtualServer {
        name: name.to_string(),
        namespace: namespace.to_string(),
        ip,
        port,
        client_ssl,
        server_ssl,
        redirect,
        default_persist,
        fallback_persist,
        lb_mode,
        irules,
        members,
        monitor,
    }
}

/// Returns the Ingress's first TLS entry.
pub fn first_tls(ingress: &k8s::Ingress) -> Option<&k8s::IngressTLS> {
    ingress.spec.as_ref()?.tls.as_ref()?.first()
}
