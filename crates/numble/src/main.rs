use std::sync::Arc;

use numble::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), NumbleError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env()?;
    let identities = MemoryIdentityProvider::from_tokens(config.dev_identities());
    if config.dev_users.is_empty() {
        tracing::warn!("NUMBLE_DEV_USERS is empty, no token will authenticate");
    }

    let server = NumbleServer::builder()
        .config(config)
        .build(identities, Arc::new(MemoryStats::new()))
        .await?;
    if let Ok(addr) = server.local_addr() {
        tracing::info!(%addr, "numble-server listening");
    }
    server.run().await
}
