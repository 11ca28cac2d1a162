use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::config::Config;
use crate::http::connection::{Connection, Site};

pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&cfg.server.listen_addr).await?;
    info!("Listening on {}", cfg.server.listen_addr);

    let site = Site {
        roots: Arc::new(cfg.canonical_roots()),
        cache_forever: cfg.static_files.cache_forever,
    };
    info!(roots = ?site.roots, "Serving static files");

    loop {
        let (socket, peer) = listener.accept().await?;
        info!("Accepted connection from {}", peer);

        let site = site.clone();
        tokio::spawn(async move {
            let conn = Connection::new(socket, peer, site);
            if let Err(e) = conn.run().await {
                tracing::error!("Connection error from {}: {}", peer, e);
            }
        });
    }
}
