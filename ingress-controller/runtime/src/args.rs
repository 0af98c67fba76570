use crate::{
    bigip,
    core::{cancelable, Config, Error},
    index,
    k8s::KubeClient,
};
use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[clap(
    name = "ingress-controller",
    about = "Derives BIG-IP virtual servers from cluster Ingress resources"
)]
pub struct Args {
    #[clap(
        long,
        default_value = "ingress_controller=info,warn",
        env = "INGRESS_CONTROLLER_LOG"
    )]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain", env = "INGRESS_CONTROLLER_LOG_FORMAT")]
    log_format: kubert::LogFormat,

    #[clap(flatten)]
    client: kubert::ClientArgs,

    /// The ADC partition owned by this controller.
    #[clap(long, default_value = "k8s-auto-ny2", env = "ADC_INGRESS_PARTITION")]
    partition: String,

    /// Management address of the BIG-IP, with or without a scheme.
    #[clap(long, env = "F5_HOST")]
    bigip_host: Option<String>,

    #[clap(long, env = "F5_USER")]
    bigip_user: Option<String>,

    #[clap(long, env = "F5_PASSWORD", hide_env_values = true)]
    bigip_password: Option<String>,

    /// Skips verification of the BIG-IP's certificate.
    #[clap(long)]
    bigip_insecure: bool,

    /// Only derives the desired state; the BIG-IP is not contacted.
    #[clap(long)]
    desired_only: bool,

    /// Lists every pod once up front instead of querying each service's pods.
    #[clap(long)]
    snapshot: bool,
}

/// Credentials for the BIG-IP management API.
#[derive(Debug)]
struct Credentials {
    host: String,
    user: String,
    password: String,
}

impl Args {
    #[inline]
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            log_level,
            log_format,
            client,
            partition,
            bigip_host,
            bigip_user,
            bigip_password,
            bigip_insecure,
            desired_only,
            snapshot,
        } = self;

        log_format.try_init(log_level)?;

        let config = Config::new(partition)?;
        let credentials = if desired_only {
            None
        } else {
            Some(Credentials::new(bigip_host, bigip_user, bigip_password)?)
        };

        let shutdown = CancellationToken::new();
        tokio::spawn({
            let shutdown = shutdown.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Received shutdown signal");
                    shutdown.cancel();
                }
            }
        });

        let client = KubeClient::new(
            client
                .try_client()
                .await
                .context("could not initialize a connection to Kubernetes")?,
        );
        let desired = if snapshot {
            cancelable(&shutdown, client.snapshot())
                .await
                .and_then(|res| res.map_err(|e| Error::collaborator("list cluster snapshot", e)))
                .map(|snapshot| index::desired_state(&snapshot))
        } else {
            index::discover_desired(&client, &shutdown).await
        }
        .inspect_err(|error| error!(%error, "Could not fetch desired state from Kubernetes"))?;
        info!(virtual_servers = desired.len(), "Derived desired state");
        print_json(&desired)?;

        let Some(Credentials {
            host,
            user,
            password,
        }) = credentials
        else {
            return Ok(());
        };

        let login = bigip::Client::login(&host, &user, &password, bigip_insecure);
        let session = cancelable(&shutdown, login).await??;
        let current = bigip::discover_current(&session, &config, &shutdown)
            .await
            .inspect_err(|error| error!(%error, "Could not fetch current state from the BIG-IP"))?;
        info!(
            virtual_servers = current.len(),
            partition = %config.partition(),
            "Projected current state"
        );
        print_json(&current)?;

        Ok(())
    }
}

// === impl Credentials ===

impl Credentials {
    fn new(host: Option<String>, user: Option<String>, password: Option<String>) -> Result<Self> {
        fn required(value: Option<String>, env: &str) -> Result<String> {
            match value {
                Some(v) if !v.is_empty() => Ok(v),
                _ => bail!("{env} environment variable must be set"),
            }
        }

        Ok(Self {
            host: required(host, "F5_HOST")?,
            user: required(user, "F5_USER")?,
            password: required(password, "F5_PASSWORD")?,
        })
    }
}

fn print_json<T: Serialize>(state: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(state)?;
    println!("{json}");
    Ok(())
}
