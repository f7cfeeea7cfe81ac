use anyhow::Context as _;
use axum::Router;
use std::net::SocketAddr;
use std::path::PathBuf;
use webtab_backend::StorageConfig;

pub mod server;

pub const WEBTAB_SERVER_ADDR_ENV: &str = "WEBTAB_SERVER_ADDR";
pub const WEBTAB_WEB_DIST_DIR_ENV: &str = "WEBTAB_WEB_DIST_DIR";
pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:8422";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub storage: StorageConfig,
    /// Static UI bundle served for every path outside `/api`.
    pub web_dist: PathBuf,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let storage = StorageConfig::from_env()?;
        let web_dist = std::env::var_os(WEBTAB_WEB_DIST_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("web/out"));
        Ok(Self { storage, web_dist })
    }
}

pub struct StartedServer {
    pub addr: SocketAddr,
    handle: Option<tokio::task::JoinHandle<anyhow::Result<()>>>,
}

impl StartedServer {
    pub async fn wait(self) -> anyhow::Result<()> {
        let mut this = self;
        let handle = this.handle.take().context("server task already consumed")?;

        handle
            .await
            .context("server task panicked")?
            .context("server failed")?;
        Ok(())
    }
}

impl Drop for StartedServer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

pub async fn start_server(addr: SocketAddr) -> anyhow::Result<StartedServer> {
    start_server_with_config(addr, ServerConfig::from_env()?).await
}

pub async fn start_server_with_config(
    addr: SocketAddr,
    config: ServerConfig,
) -> anyhow::Result<StartedServer> {
    let app: Router = server::router(config)?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    let actual = listener.local_addr().context("failed to read local addr")?;

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.context("server failed")?;
        Ok(())
    });

    Ok(StartedServer {
        addr: actual,
        handle: Some(handle),
    })
}
