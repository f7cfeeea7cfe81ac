use anyhow::Context as _;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;
use webtab_server::{DEFAULT_SERVER_ADDR, WEBTAB_SERVER_ADDR_ENV};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let addr: SocketAddr = std::env::var(WEBTAB_SERVER_ADDR_ENV)
        .unwrap_or_else(|_| DEFAULT_SERVER_ADDR.to_owned())
        .parse()
        .context("invalid WEBTAB_SERVER_ADDR")?;

    let server = webtab_server::start_server(addr).await?;
    tracing::info!(addr = %server.addr, "webtab_server listening");
    server.wait().await?;
    Ok(())
}
