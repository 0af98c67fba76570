use ingress_controller_core::MonitorSpec;
use std::{collections::BTreeMap, net::IpAddr, num::NonZeroU16};
use tracing::{debug, error, info, warn};

pub const IP: &str = "virtual-server.f5.com/ip";
pub const HTTP_PORT: &str = "virtual-server.f5.com/http-port";
pub const HTTPS_PORT: &str = "virtual-server.f5.com/https-port";
pub const SSL_REDIRECT: &str = "ingress.kubernetes.io/ssl-redirect";
pub const HEALTH: &str = "virtual-server.f5.com/health";
pub const SERVER_SSL: &str = "virtual-server.f5.com/serverssl";
pub const RULES: &str = "virtual-server.f5.com/rules";
pub const BALANCE: &str = "virtual-server.f5.com/balance";
pub const DEFAULT_PERSIST: &str = "virtual-server.f5.com/defaultPersist";
pub const FALLBACK_PERSIST: &str = "virtual-server.f5.com/fallbackPersist";

/// An annotation value that could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum AnnotationError {
    #[error("not a valid IP address: {0}")]
    Ip(#[from] std::net::AddrParseError),

    #[error("not a valid port: {0}")]
    Port(#[from] std::num::ParseIntError),

    #[error("not a valid health monitor list: {0}")]
    Health(#[from] serde_json::Error),
}

/// Per-Ingress settings, as configured by the Ingress's annotations.
///
/// Fields that were absent or invalid hold their defaults.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub ip: Option<IpAddr>,
    pub http_port: Option<NonZeroU16>,
    pub https_port: Option<NonZeroU16>,

    /// Cleared only by `ssl-redirect: "false"`.
    pub ssl_redirect: bool,

    /// The first monitor of the health annotation, if it was set and valid.
    pub monitor: Option<MonitorSpec>,

    pub server_ssl: Option<String>,
    pub irules: Vec<String>,
    pub lb_mode: Option<String>,
    pub default_persist: Option<String>,
    pub fallback_persist: Option<String>,
}

// === impl Settings ===

impl Default for Settings {
    fn default() -> Self {
        Self {
            ip: None,
            http_port: None,
            https_port: None,
            ssl_redirect: true,
            monitor: None,
            server_ssl: None,
            irules: Vec::new(),
            lb_mode: None,
            default_persist: None,
            fallback_persist: None,
        }
    }
}

impl Settings {
    /// Decodes the annotations of the Ingress `namespace/ingress`.
    ///
    /// Never fails: an invalid value is logged and its field keeps the default.
    pub fn from_annotations(
        ingress: &str,
        namespace: &str,
        annotations: &BTreeMap<String, String>,
    ) -> Self {
        let mut settings = Self::default();

        match annotations.get(IP) {
            Some(value) => match parse_ip(value) {
                Ok(ip) => settings.ip = Some(ip),
                Err(error) => error!(
                    %ingress,
                    %namespace,
                    field = IP,
                    %value,
                    %error,
                    "Invalid IP address for ip annotation"
                ),
            },
            None => info!(%ingress, %namespace, "No IP address, creating headless virtual server"),
        }

        settings.http_port = port_annotation(ingress, namespace, annotations, HTTP_PORT);
        settings.https_port = port_annotation(ingress, namespace, annotations, HTTPS_PORT);

        if annotations.get(SSL_REDIRECT).map(String::as_str) == Some("false") {
            settings.ssl_redirect = false;
        }

        if let Some(value) = annotations.get(HEALTH) {
            match parse_health(value) {
                Ok(mut monitors) => {
                    if monitors.len() > 1 {
                        debug!(
                            %ingress,
                            %namespace,
                            ignored = monitors.len() - 1,
                            "Only the first health monitor is used"
                        );
                    }
                    settings.monitor = if monitors.is_empty() {
                        None
                    } else {
                        Some(monitors.swap_remove(0))
                    };
                }
                Err(error) => warn!(
                    %ingress,
                    %namespace,
                    field = HEALTH,
                    %value,
                    %error,
                    "Health monitor JSON parsing failed"
                ),
            }
        }

        settings.server_ssl = annotations.get(SERVER_SSL).cloned();
        settings.irules = annotations
            .get(RULES)
            .map(|v| parse_rules(v.as_str()))
            .unwrap_or_default();
        settings.lb_mode = annotations.get(BALANCE).cloned();
        settings.default_persist = annotations.get(DEFAULT_PERSIST).cloned();
        settings.fallback_persist = annotations.get(FALLBACK_PERSIST).cloned();

        settings
    }
}

/// Reads `annotation` as a port. If the annotation is not set or is invalid, `None` is returned.
fn port_annotation(
    ingress: &str,
    namespace: &str,
    annotations: &BTreeMap<String, String>,
    annotation: &'static str,
) -> Option<NonZeroU16> {
    let value = annotations.get(annotation)?;
    parse_port(value)
        .map_err(|error| {
            warn!(%ingress, %namespace, field = annotation, %value, %error, "Invalid port annotation");
        })
        .ok()
}

pub fn parse_ip(s: &str) -> Result<IpAddr, AnnotationError> {
    s.parse().map_err(Into::into)
}

/// Parses a base-10 port in `1..=65535`.
pub fn parse_port(s: &str) -> Result<NonZeroU16, AnnotationError> {
    s.parse().map_err(Into::into)
}

/// Parses a JSON array of monitor objects.
pub fn parse_health(s: &str) -> Result<Vec<MonitorSpec>, AnnotationError> {
    serde_json::from_str(s).map_err(Into::into)
}

/// Splits a comma-separated iRule list. Whitespace and empty entries are preserved.
pub fn parse_rules(s: &str) -> Vec<String> {
    s.split(',').map(str::to_string).collect()
}
