use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use super::CacheOptions;

pub async fn execute(options: &CacheOptions, listen: SocketAddr) -> Result<()> {
    let cache = Arc::new(options.open()?);
    let listener = TcpListener::bind(listen)
        .await
        .with_context(|| format!("failed to listen on {listen}"))?;

    filecache::remote::serve(listener, cache)
        .await
        .context("cache server failed")
}
