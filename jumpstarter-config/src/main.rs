#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use clap::Parser;

use jumpstarter_config::auth::SuLogin;
use jumpstarter_config::kubeconfig;
use jumpstarter_config::shutdown;
use jumpstarter_config::system::{ChpasswdAccounts, KubectlCluster, SystemdHostname};
use jumpstarter_config::web;
use jumpstarter_config::{LogFilter, LogFormat, ServerArgs};

#[derive(Parser)]
#[clap(version)]
struct Args {
    /// The tracing filter used for logs
    #[clap(
        long,
        env = "JUMPSTARTER_CONFIG_LOG",
        default_value = "jumpstarter_config=info,warn"
    )]
    log_level: LogFilter,

    /// The logging format
    #[clap(long, default_value = "plain")]
    log_format: LogFormat,

    #[clap(flatten)]
    server: ServerArgs,

    /// Path of the kubeconfig served for download
    #[clap(long, default_value = kubeconfig::DEFAULT_PATH)]
    kubeconfig: PathBuf,

    /// Serves the UI without requiring OS account credentials
    #[clap(long)]
    insecure_no_auth: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let Args {
        log_level,
        log_format,
        server,
        kubeconfig,
        insecure_no_auth,
    } = Args::parse();

    log_format
        .try_init(log_level)
        .context("failed to initialize logging")?;

    let ctx = web::Context {
        hosts: Arc::new(SystemdHostname),
        cluster: Arc::new(KubectlCluster),
        accounts: Arc::new(ChpasswdAccounts),
        credentials: Arc::new(SuLogin),
        kubeconfig,
        require_auth: !insecure_no_auth,
    };

    let bound = server.bind().await?;
    tracing::info!(addr = %bound.local_addr(), "Serving configuration UI");

    let (shutdown, watch) = shutdown::channel();

    let service = tower::service_fn(move |req| {
        let ctx = ctx.clone();
        async move { Ok::<_, std::convert::Infallible>(web::handle(req, ctx).await) }
    });
    let server = bound.spawn(service, watch);

    match shutdown
        .on_signal()
        .await
        .context("failed to register signal handlers")?
    {
        shutdown::Completion::Graceful => {}
        shutdown::Completion::Aborted => bail!("aborted"),
    }

    server.join().await.context("server task panicked")?;
    tracing::debug!("Shutdown complete");
    Ok(())
}
