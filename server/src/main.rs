use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use molttip_server::{serve, AppState, Args, ServerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .context("invalid log level")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ServerConfig::from(&args);
    info!(
        listen = %args.listen,
        dev_mode = config.dev_mode,
        data_file = ?config.data_file,
        starting_balance = %config.starting_balance,
        "starting MoltTip"
    );
    let state = Arc::new(AppState::from_config(config)?);

    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("failed to bind {}", args.listen))?;

    serve(listener, state, async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("shutting down"),
            Err(e) => {
                tracing::warn!(error = %e, "no ctrl-c handler, running until killed");
                std::future::pending::<()>().await;
            }
        }
    })
    .await
}
