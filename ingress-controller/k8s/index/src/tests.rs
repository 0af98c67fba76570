use super::*;
use ingress_controller_core::MonitorSpec;
use ingress_controller_k8s_api::{
    api::{
        core::v1::{PodStatus, ServiceSpec},
        networking::v1::{IngressBackend, IngressServiceBackend, IngressSpec, ServiceBackendPort},
    },
    ObjectMeta,
};
use std::collections::BTreeMap;

/// Scenario: plain HTTP Ingress with two running pods.
#[test]
fn plain_http_two_running_pods() {
    let snapshot = mk_snapshot(mk_ingress("web", "demo", "demo-svc", 8080, vec![], None));

    let state = desired_state(&snapshot);
    assert_eq!(state.len(), 1);
    let vs = state.get("web", "demo").expect("demo must be emitted");
    assert_eq!(vs.port.get(), 80);
    assert!(!vs.redirect);
    assert_eq!(vs.client_ssl, None);
    assert!(vs.is_headless());
    assert_eq!(vs.monitor, MonitorSpec::of_type("http"));
    assert_eq!(
        vs.members,
        vec![mk_member("p1", "10.0.0.1", 8080), mk_member("p2", "10.0.0.2", 8080)]
    );

    assert_eq!(
        serde_json::to_value(&state).unwrap(),
        serde_json::json!([{
            "name": "demo",
            "namespace": "web",
            "port": 80,
            "redirect": false,
            "members": [
                { "name": "p1", "ip": "10.0.0.1", "port": 8080 },
                { "name": "p2", "ip": "10.0.0.2", "port": 8080 },
            ],
            "monitor": { "type": "http" },
        }])
    );
}

/// Scenario: TLS Ingress with redirect disabled by annotation.
#[test]
fn https_with_redirect_disabled() {
    let snapshot = mk_snapshot(mk_ingress(
        "web",
        "demo",
        "demo-svc",
        8080,
        vec![(annotations::SSL_REDIRECT, "false")],
        Some("cert-a"),
    ));

    let state = desired_state(&snapshot);
    let vs = state.get("web", "demo").unwrap();
    assert_eq!(vs.port.get(), 443);
    assert_eq!(vs.client_ssl.as_deref(), Some("cert-a"));
    assert!(!vs.redirect);
}

#[test]
fn https_redirects_by_default() {
    let snapshot = mk_snapshot(mk_ingress(
        "web",
        "demo",
        "demo-svc",
        8080,
        vec![],
        Some("cert-a"),
    ));

    let vs = desired_state(&snapshot).into_inner().remove(0);
    assert_eq!(vs.port.get(), 443);
    assert!(vs.redirect);
}

/// Scenario: a server SSL profile implies an https monitor.
#[test]
fn server_ssl_implies_https_monitor() {
    let snapshot = mk_snapshot(mk_ingress(
        "web",
        "demo",
        "demo-svc",
        8080,
        vec![(annotations::SERVER_SSL, "srv-profile")],
        None,
    ));

    let vs = desired_state(&snapshot).into_inner().remove(0);
    assert_eq!(vs.server_ssl.as_deref(), Some("srv-profile"));
    assert_eq!(vs.monitor.type_.as_deref(), Some("https"));
}

/// Scenario: an invalid IP annotation yields a headless virtual server.
#[test]
fn invalid_ip_is_headless() {
    let snapshot = mk_snapshot(mk_ingress(
        "web",
        "demo",
        "demo-svc",
        8080,
        vec![(annotations::IP, "not-an-ip")],
        None,
    ));

    let state = desired_state(&snapshot);
    assert_eq!(state.len(), 1);
    assert!(state.get("web", "demo").unwrap().is_headless());
}

#[test]
fn valid_ip_is_set() {
    let snapshot = mk_snapshot(mk_ingress(
        "web",
        "demo",
        "demo-svc",
        8080,
        vec![(annotations::IP, "192.0.2.10")],
        None,
    ));

    let vs = desired_state(&snapshot).into_inner().remove(0);
    assert_eq!(vs.ip, Some("192.0.2.10".parse().unwrap()));
}

/// Scenario: an Ingress whose service does not exist is skipped without error.
#[test]
fn missing_service_is_skipped() {
    let mut snapshot = mk_snapshot(mk_ingress("web", "demo", "demo-svc", 8080, vec![], None));
    snapshot
        .ingresses
        .push(mk_ingress("web", "ghost", "ghost-svc", 8080, vec![], None));

    let state = desired_state(&snapshot);
    assert_eq!(state.len(), 1);
    assert!(state.get("web", "ghost").is_none());
}

#[test]
fn service_in_other_namespace_is_not_used() {
    let snapshot = mk_snapshot(mk_ingress("ops", "demo", "demo-svc", 8080, vec![], None));
    assert!(desired_state(&snapshot).is_empty());
}

/// Scenario: the health annotation's first monitor is used verbatim.
#[test]
fn health_annotation() {
    let health = r#"[{"interval":5,"timeout":16,"send":"GET /healthz","recv":"200","type":"http"}]"#;
    let snapshot = mk_snapshot(mk_ingress(
        "web",
        "demo",
        "demo-svc",
        8080,
        vec![(annotations::HEALTH, health)],
        None,
    ));

    let vs = desired_state(&snapshot).into_inner().remove(0);
    assert_eq!(
        serde_json::to_value(&vs.monitor).unwrap(),
        serde_json::json!({
            "interval": 5,
            "timeout": 16,
            "send": "GET /healthz",
            "recv": "200",
            "type": "http",
        })
    );
}

#[test]
fn zero_selected_pods_yields_empty_members() {
    let mut snapshot = mk_snapshot(mk_ingress("web", "demo", "demo-svc", 8080, vec![], None));
    snapshot.pods.clear();

    let vs = desired_state(&snapshot).into_inner().remove(0);
    assert!(vs.members.is_empty());
}

#[test]
fn pending_and_ipless_pods_are_excluded() {
    let mut snapshot = mk_snapshot(mk_ingress("web", "demo", "demo-svc", 8080, vec![], None));
    snapshot.pods = vec![
        mk_pod("web", "pending", Some("10.0.0.3"), "Pending", &[("app", "demo")]),
        mk_pod("web", "no-ip", None, "Running", &[("app", "demo")]),
        mk_pod("web", "bad-ip", Some("10.0.0"), "Running", &[("app", "demo")]),
        mk_pod("web", "p1", Some("10.0.0.1"), "Running", &[("app", "demo")]),
    ];

    let vs = desired_state(&snapshot).into_inner().remove(0);
    assert_eq!(vs.members, vec![mk_member("p1", "10.0.0.1", 8080)]);
}

#[test]
fn empty_service_selector_selects_nothing() {
    let mut snapshot = mk_snapshot(mk_ingress("web", "demo", "demo-svc", 8080, vec![], None));
    snapshot.services = vec![mk_service("web", "demo-svc", &[])];

    let vs = desired_state(&snapshot).into_inner().remove(0);
    assert!(vs.members.is_empty());
}

#[test]
fn named_backend_port_yields_no_members() {
    let mut ingress = mk_ingress("web", "demo", "demo-svc", 8080, vec![], None);
    ingress
        .spec
        .as_mut()
        .and_then(|s| s.default_backend.as_mut())
        .and_then(|b| b.service.as_mut())
        .unwrap()
        .port = Some(ServiceBackendPort {
        name: Some("http".into()),
        number: None,
    });

    let vs = desired_state(&mk_snapshot(ingress)).into_inner().remove(0);
    assert!(vs.members.is_empty());
}

#[test]
fn ingress_without_default_backend_is_skipped() {
    let mut ingress = mk_ingress("web", "demo", "demo-svc", 8080, vec![], None);
    ingress.spec.as_mut().unwrap().default_backend = None;

    assert!(desired_state(&mk_snapshot(ingress)).is_empty());
}

#[test]
fn duplicate_ingress_keeps_first() {
    let mut snapshot = mk_snapshot(mk_ingress("web", "demo", "demo-svc", 8080, vec![], None));
    snapshot.ingresses.push(mk_ingress(
        "web",
        "demo",
        "demo-svc",
        8080,
        vec![],
        Some("cert-a"),
    ));

    let state = desired_state(&snapshot);
    assert_eq!(state.len(), 1);
    assert_eq!(state.get("web", "demo").unwrap().port.get(), 80);
}

#[test]
fn output_follows_ingress_order_and_is_deterministic() {
    let mut snapshot = mk_snapshot(mk_ingress("web", "zeta", "demo-svc", 8080, vec![], None));
    snapshot
        .ingresses
        .push(mk_ingress("web", "alpha", "demo-svc", 9090, vec![], None));

    let first = desired_state(&snapshot);
    let names = first.iter().map(|vs| vs.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["zeta", "alpha"]);

    let second = desired_state(&snapshot);
    assert_eq!(
        serde_json::to_string_pretty(&first).unwrap(),
        serde_json::to_string_pretty(&second).unwrap()
    );
}

#[test]
fn invariants_hold() {
    let mut snapshot = mk_snapshot(mk_ingress(
        "web",
        "a",
        "demo-svc",
        8080,
        vec![(annotations::HTTP_PORT, "0")],
        None,
    ));
    snapshot.ingresses.extend([
        mk_ingress("web", "b", "demo-svc", 8080, vec![], Some("cert-b")),
        mk_ingress(
            "web",
            "c",
            "demo-svc",
            8080,
            vec![(annotations::SERVER_SSL, "srv")],
            None,
        ),
        mk_ingress(
            "web",
            "d",
            "demo-svc",
            8080,
            vec![(annotations::HEALTH, "not json")],
            None,
        ),
    ]);

    let state = desired_state(&snapshot);
    assert_eq!(state.len(), 4);
    for vs in &state {
        assert!(!vs.name.is_empty() && !vs.namespace.is_empty());
        assert!(!vs.redirect || vs.client_ssl.is_some(), "{}", vs.name);
        if vs.server_ssl.is_some() {
            assert_eq!(vs.monitor.type_.as_deref(), Some("https"));
        } else {
            assert_eq!(vs.monitor.type_.as_deref(), Some("http"));
        }
        for m in &vs.members {
            assert!(!m.ip.is_empty());
        }
    }
    assert_eq!(state.get("web", "a").unwrap().port.get(), 80);
}

#[tokio::test]
async fn discover_matches_snapshot_derivation() {
    let mut snapshot = mk_snapshot(mk_ingress(
        "web",
        "demo",
        "demo-svc",
        8080,
        vec![(annotations::RULES, "one,two")],
        Some("cert-a"),
    ));
    snapshot
        .ingresses
        .push(mk_ingress("web", "ghost", "ghost-svc", 8080, vec![], None));

    let discovered = discover_desired(&snapshot, &CancellationToken::new())
        .await
        .expect("derivation must succeed");
    assert_eq!(discovered, desired_state(&snapshot));
    assert_eq!(
        discovered.get("web", "demo").unwrap().irules,
        vec!["one", "two"]
    );
}

#[tokio::test]
async fn failed_ingress_list_is_a_collaborator_error() {
    let client = Failing {
        fail_ingresses: true,
        ..Failing::new(mk_snapshot(mk_ingress("web", "demo", "demo-svc", 8080, vec![], None)))
    };

    let error = discover_desired(&client, &CancellationToken::new())
        .await
        .expect_err("must fail");
    assert!(
        matches!(error, Error::Collaborator { operation: "list ingresses", .. }),
        "{error}"
    );
}

#[tokio::test]
async fn failed_service_list_is_a_collaborator_error() {
    let client = Failing {
        fail_services: true,
        ..Failing::new(mk_snapshot(mk_ingress("web", "demo", "demo-svc", 8080, vec![], None)))
    };

    let error = discover_desired(&client, &CancellationToken::new())
        .await
        .expect_err("must fail");
    assert!(matches!(
        error,
        Error::Collaborator {
            operation: "list services",
            ..
        }
    ));
}

#[tokio::test]
async fn failed_pod_list_yields_empty_members() {
    let client = Failing {
        fail_pods: true,
        ..Failing::new(mk_snapshot(mk_ingress("web", "demo", "demo-svc", 8080, vec![], None)))
    };

    let state = discover_desired(&client, &CancellationToken::new())
        .await
        .expect("pod failures must not fail the derivation");
    assert_eq!(state.len(), 1);
    assert!(state.get("web", "demo").unwrap().members.is_empty());
}

#[tokio::test]
async fn cancellation_is_distinct() {
    let snapshot = mk_snapshot(mk_ingress("web", "demo", "demo-svc", 8080, vec![], None));
    let shutdown = CancellationToken::new();
    shutdown.cancel();

    let error = discover_desired(&snapshot, &shutdown)
        .await
        .expect_err("must be cancelled");
    assert!(error.is_cancelled(), "{error}");
}

// === Helpers ===

/// Wraps a snapshot, failing selected list calls.
struct Failing {
    snapshot: Snapshot,
    fail_ingresses: bool,
    fail_services: bool,
    fail_pods: bool,
}

impl Failing {
    fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot,
            fail_ingresses: false,
            fail_services: false,
            fail_pods: false,
        }
    }
}

#[async_trait::async_trait]
impl ClusterClient for Failing {
    async fn list_ingresses(&self) -> anyhow::Result<Vec<k8s::Ingress>> {
        if self.fail_ingresses {
            anyhow::bail!("connection refused");
        }
        self.snapshot.list_ingresses().await
    }

    async fn list_services(&self) -> anyhow::Result<Vec<k8s::Service>> {
        if self.fail_services {
            anyhow::bail!("connection refused");
        }
        self.snapshot.list_services().await
    }

    async fn list_pods(
        &self,
        namespace: &str,
        selector: &Selector,
    ) -> anyhow::Result<Vec<k8s::Pod>> {
        if self.fail_pods {
            anyhow::bail!("connection refused");
        }
        self.snapshot.list_pods(namespace, selector).await
    }
}

/// A snapshot holding `ingress`, the `demo-svc` service selecting `app=demo` in `web`, and two
/// running pods it selects plus one it does not.
fn mk_snapshot(ingress: k8s::Ingress) -> Snapshot {
    Snapshot {
        ingresses: vec![ingress],
        services: vec![mk_service("web", "demo-svc", &[("app", "demo")])],
        pods: vec![
            mk_pod("web", "p1", Some("10.0.0.1"), "Running", &[("app", "demo")]),
            mk_pod("web", "other", Some("10.0.0.9"), "Running", &[("app", "other")]),
            mk_pod("web", "p2", Some("10.0.0.2"), "Running", &[("app", "demo")]),
        ],
    }
}

fn mk_ingress(
    ns: impl Into<String>,
    name: impl Into<String>,
    service: impl Into<String>,
    port: i32,
    annotations: Vec<(&'static str, &'static str)>,
    tls_secret: Option<&'static str>,
) -> k8s::Ingress {
    k8s::Ingress {
        metadata: ObjectMeta {
            namespace: Some(ns.into()),
            name: Some(name.into()),
            annotations: Some(
                annotations
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
            ..Default::default()
        },
        spec: Some(IngressSpec {
            default_backend: Some(IngressBackend {
                service: Some(IngressServiceBackend {
                    name: service.into(),
                    port: Some(ServiceBackendPort {
                        name: None,
                        number: Some(port),
                    }),
                }),
                ..Default::default()
            }),
            tls: tls_secret.map(|secret| {
                vec![k8s::IngressTLS {
                    secret_name: Some(secret.to_string()),
                    ..Default::default()
                }]
            }),
            ..Default::default()
        }),
        status: None,
    }
}

fn mk_service(
    ns: impl Into<String>,
    name: impl Into<String>,
    selector: &[(&str, &str)],
) -> k8s::Service {
    let selector = selector
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect::<BTreeMap<_, _>>();
    k8s::Service {
        metadata: ObjectMeta {
            namespace: Some(ns.into()),
            name: Some(name.into()),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            selector: if selector.is_empty() {
                None
            } else {
                Some(selector)
            },
            ..Default::default()
        }),
        status: None,
    }
}

fn mk_pod(
    ns: impl Into<String>,
    name: impl Into<String>,
    ip: Option<&str>,
    phase: &str,
    labels: &[(&str, &str)],
) -> k8s::Pod {
    k8s::Pod {
        metadata: ObjectMeta {
            namespace: Some(ns.into()),
            name: Some(name.into()),
            labels: Some(
                labels
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
            ..Default::default()
        },
        spec: None,
        status: Some(PodStatus {
            phase: Some(phase.to_string()),
            pod_ip: ip.map(Into::into),
            ..Default::default()
        }),
    }
}

fn mk_member(name: &str, ip: &str, port: u16) -> Member {
    Member {
        name: name.to_string(),
        ip: ip.to_string(),
        port: NonZeroU16::new(port).unwrap(),
    }
}
