use anyhow::{anyhow, Context, Result};
use ddns::{Config, DynHostStore, SharedConfig};
use is_terminal::IsTerminal;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = std::env::args().take(3);
    let (program_name, command, config_file) = (
        args.next().unwrap_or("ddns".to_string()),
        args.next(),
        args.next(),
    );
    let usage = || anyhow!("usage: {program_name} <backend|web> /path/to/config.json");

    let config_file = match (command.as_deref(), config_file) {
        (Some("backend" | "web"), Some(config_file)) => config_file,
        _ => return Err(usage()),
    };

    let config = config_init(&config_file)?;
    tracing_init(config.verbose);
    tracing::debug!("loaded config from {config_file}");
    let hosts = config.host_store().await?;

    if command.as_deref() == Some("backend") {
        run_backend(config, hosts).await
    } else {
        run_web(config, hosts).await
    }
}

async fn run_backend(config: SharedConfig, hosts: DynHostStore) -> Result<()> {
    if config.host_store_path.is_none() {
        tracing::warn!("no host_store_path configured, hosts registered via the API are not visible");
    }
    tracing::info!("starting PowerDNS pipe backend for \"{}\"", config.domain);
    let backend = ddns::backend::new(config, hosts);
    backend
        .run(tokio::io::stdin(), tokio::io::stdout())
        .await?;
    tracing::info!("input closed, goodbye");
    Ok(())
}

async fn run_web(config: SharedConfig, hosts: DynHostStore) -> Result<()> {
    tracing::info!("API listening on {}", &config.api_bind_addr);
    let api_server = ddns::api::new(config.clone(), hosts);
    let api_handle = tokio::spawn(api_server);

    tokio::select! {
        _ = signal::ctrl_c() => {
            tracing::info!("quitting from signal");
        },
        Ok(api_res) = api_handle => {
            if let Err(err) = api_res {
                return Err(err.into())
            }
        }
    }
    tracing::info!("goodbye");
    Ok(())
}

/// Logs go to stderr: in backend mode stdout carries the pipe protocol.
fn tracing_init(verbose: bool) {
    let default_filter = if verbose { "ddns=debug" } else { "ddns=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal()),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();
}

fn config_init(config_file: &str) -> Result<SharedConfig> {
    let config = Config::try_from_file(config_file)
        .with_context(|| format!("loading config from {config_file}"))?;
    Ok(Arc::new(config))
}
