use crate::{
    inventory::{Monitor, Pool, VirtualServer},
    AdcClient,
};
use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, info};

const LOGIN_PATH: &str = "/mgmt/shared/authn/login";
const POOLS_PATH: &str = "/mgmt/tm/ltm/pool?expandSubcollections=true";
const VIRTUALS_PATH: &str = "/mgmt/tm/ltm/virtual?expandSubcollections=true";

/// Monitor kinds listed from `/mgmt/tm/ltm/monitor/<kind>`.
const MONITOR_KINDS: [&str; 3] = ["http", "https", "tcp"];

const AUTH_HEADER: &str = "X-F5-Auth-Token";
const LOGIN_PROVIDER: &str = "tmos";

/// An authenticated iControl REST session.
#[derive(Clone, Debug)]
pub struct Client {
    http: reqwest::Client,
    base: String,
    token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
    login_provider_name: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: Token,
}

#[derive(Deserialize)]
struct Token {
    token: String,
}

/// A collection response. Empty collections omit `items`.
#[derive(Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

// === impl Client ===

impl Client {
    /// Opens a token session with the ADC at `host`.
    ///
    /// `host` may omit its scheme, in which case HTTPS is used. When `insecure` is set, the ADC's
    /// certificate is not verified.
    pub async fn login(host: &str, user: &str, password: &str, insecure: bool) -> Result<Self> {
        let base = base_url(host);
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(insecure)
            .build()
            .context("failed to build HTTP client")?;

        let rsp: LoginResponse = http
            .post(format!("{base}{LOGIN_PATH}"))
            .json(&LoginRequest {
                username: user,
                password,
                login_provider_name: LOGIN_PROVIDER,
            })
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .context("failed to get token")?
            .json()
            .await
            .context("failed to decode token")?;
        info!(%base, %user, "Logged in");

        Ok(Self {
            http,
            base,
            token: rsp.token.token,
        })
    }

    async fn list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let url = format!("{}{path}", self.base);
        debug!(%url, "Listing");
        let rsp: ListResponse<T> = self
            .http
            .get(&url)
            .header(AUTH_HEADER, &self.token)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .with_context(|| format!("GET {path}"))?
            .json()
            .await
            .with_context(|| format!("failed to decode {path}"))?;
        Ok(rsp.items)
    }
}

#[async_trait::async_trait]
impl AdcClient for Client {
    async fn list_pools(&self) -> Result<Vec<Pool>> {
        self.list(POOLS_PATH).await
    }

    async fn list_virtual_servers(&self) -> Result<Vec<VirtualServer>> {
        self.list(VIRTUALS_PATH).await
    }

    async fn list_monitors(&self) -> Result<Vec<Monitor>> {
        let mut monitors = Vec::new();
        for kind in MONITOR_KINDS {
            monitors.extend(self.list(&format!("/mgmt/tm/ltm/monitor/{kind}")).await?);
        }
        Ok(monitors)
    }
}

fn base_url(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("https://") || host.starts_with("http://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}
